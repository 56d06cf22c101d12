use std::path::PathBuf;

use color_eyre::eyre::Result;
use rimsync_core::RimSyncError;
use rimsync_domain::RunStatus;
use rimsync_services::{ExtractionRun, RunControl};

use crate::prompt::ConflictPolicy;
use crate::report::{file_line, print_run};
use crate::{Ctx, ModeArgs, OutputFormat, Selection};

pub struct ExtractArgs {
    pub selection: Selection,
    pub modes: ModeArgs,
    pub on_conflict: Option<ConflictPolicy>,
    pub out_dir: Option<PathBuf>,
    pub abort_on_error: bool,
    pub no_migrate: bool,
    pub format: OutputFormat,
}

pub fn run_extract(ctx: &Ctx, args: ExtractArgs) -> Result<()> {
    let mut rc = super::run_config(ctx, args.selection, Some(args.modes), args.out_dir)?;
    rc.abort_on_error |= args.abort_on_error;
    if args.no_migrate {
        rc.migrate_legacy = false;
    }
    let policy = args
        .on_conflict
        .or_else(|| {
            ctx.cfg
                .extract
                .as_ref()
                .and_then(|e| e.on_conflict)
                .map(ConflictPolicy::Always)
        })
        .unwrap_or(ConflictPolicy::Ask);

    let run = ExtractionRun::plan(rc)?;
    if args.format == OutputFormat::Text {
        crate::ui_info!(
            "{} file(s) to process into {}",
            run.files().len(),
            run.config().lang_dir
        );
    }

    let mut prompt = policy.into_prompt();
    let stream = args.format == OutputFormat::Text;
    let use_color = ctx.use_color;
    let report = run.execute_observed(prompt.as_mut(), &RunControl::new(), &mut |file| {
        if stream {
            println!("{}", file_line(file, use_color));
        }
    });
    print_run(&report, args.format, ctx.use_color, stream)?;

    if report.status == RunStatus::Cancelled {
        return Err(RimSyncError::Cancelled.into());
    }
    Ok(())
}
