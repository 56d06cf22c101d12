use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use rimsync_config::RimSyncConfig;
use rimsync_core::{NamingOption, PlaceholderMode, UpdateMode};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod commands;
mod prompt;
mod report;
mod ui;

use prompt::ConflictPolicy;

#[derive(Parser)]
#[command(name = "rimsync", version, about = "Extract and update RimWorld mod translations")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Detailed logs (every file created or merged)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Which mods to process and where translations go.
#[derive(Args, Debug, Clone)]
pub struct Selection {
    /// Folder holding the mods (falls back to `mods_root` in rimsync.toml)
    #[arg(long)]
    pub mods_root: Option<PathBuf>,
    /// Mod folder name; repeat for several mods
    #[arg(long = "mod", value_name = "ID", conflicts_with = "all")]
    pub mods: Vec<String>,
    /// Every mod under the mods root
    #[arg(long)]
    pub all: bool,
    /// Output language code, e.g. zh-TW or ru
    #[arg(long, conflicts_with = "lang_dir")]
    pub lang: Option<String>,
    /// Output language folder name, used verbatim
    #[arg(long)]
    pub lang_dir: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ModeArgs {
    /// todo | original
    #[arg(long)]
    pub placeholder: Option<PlaceholderMode>,
    /// none | prefix | suffix (tag for submodule files)
    #[arg(long)]
    pub naming: Option<NamingOption>,
    /// merge | replace
    #[arg(long = "update")]
    pub update_mode: Option<UpdateMode>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List mods under the mods root
    Mods {
        #[arg(long)]
        mods_root: Option<PathBuf>,
        /// Keep mods whose name or folder contains this text
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Write or update translation files for the selected mods
    Extract {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        modes: ModeArgs,
        /// ask | merge | prefix | suffix | skip | cancel
        #[arg(long)]
        on_conflict: Option<ConflictPolicy>,
        /// Write here instead of <mod>/Languages/<lang> (single mod only)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Stop at the first file-level error
        #[arg(long)]
        abort_on_error: bool,
        /// Leave DefLinked/CodeLinked folders as they are
        #[arg(long)]
        no_migrate: bool,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Show what extract would change, without writing
    Compare {
        #[command(flatten)]
        selection: Selection,
        #[command(flatten)]
        modes: ModeArgs,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Remove entries whose source key no longer exists
    Prune {
        #[command(flatten)]
        selection: Selection,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Count only
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Write JSON Schemas of the report formats
    Schema {
        /// Defaults to [schema].out_dir in rimsync.toml, then ./docs/assets/schemas
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Mods { .. } => "mods",
            Commands::Extract { .. } => "extract",
            Commands::Compare { .. } => "compare",
            Commands::Prune { .. } => "prune",
            Commands::Schema { .. } => "schema",
        }
    }
}

/// Shared state handed to every command.
pub struct Ctx {
    pub use_color: bool,
    pub cfg: RimSyncConfig,
}

trait Runnable {
    fn run(self, ctx: &Ctx) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, ctx: &Ctx) -> Result<()> {
        let cmd_name = self.name();
        info!(event = "command_started", command = cmd_name);

        let result = match self {
            Commands::Mods {
                mods_root,
                search,
                format,
            } => commands::mods::run_mods(ctx, mods_root, search, format),
            Commands::Extract {
                selection,
                modes,
                on_conflict,
                out_dir,
                abort_on_error,
                no_migrate,
                format,
            } => commands::extract::run_extract(
                ctx,
                commands::extract::ExtractArgs {
                    selection,
                    modes,
                    on_conflict,
                    out_dir,
                    abort_on_error,
                    no_migrate,
                    format,
                },
            ),
            Commands::Compare {
                selection,
                modes,
                out_dir,
                format,
            } => commands::compare::run_compare(ctx, selection, modes, out_dir, format),
            Commands::Prune {
                selection,
                out_dir,
                dry_run,
                format,
            } => commands::prune::run_prune(ctx, selection, out_dir, dry_run, format),
            Commands::Schema { out_dir } => commands::schema::run_schema(ctx, out_dir),
        };

        match &result {
            Ok(_) => info!(event = "command_finished", command = cmd_name),
            Err(e) => error!(event = "command_failed", command = cmd_name, error = %e),
        }
        result
    }
}

/// Console logs go to stderr so stdout stays clean for `--format json`.
/// Everything at debug and above also lands in `logs/rimsync.log`.
fn init_tracing(level: &str) -> WorkerGuard {
    let file_appender = rolling::daily("logs", "rimsync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)));

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let cfg = rimsync_config::load_config()?;

    let detailed = cli.verbose || cfg.log.as_ref().and_then(|l| l.detailed).unwrap_or(false);
    let level = if cli.quiet {
        "error"
    } else if detailed {
        "debug"
    } else {
        "warn"
    };
    let _guard = init_tracing(level);

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(&Ctx { use_color, cfg })
}
