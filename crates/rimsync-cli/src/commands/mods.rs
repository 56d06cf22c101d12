use std::path::PathBuf;

use color_eyre::eyre::Result;
use owo_colors::OwoColorize;
use rimsync_domain::{ModList, SCHEMA_VERSION};

use crate::report::print_issues;
use crate::{Ctx, OutputFormat};

pub fn run_mods(ctx: &Ctx, mods_root: Option<PathBuf>, search: Option<String>, format: OutputFormat) -> Result<()> {
    let root = super::mods_root(ctx, mods_root)?;
    let catalog = rimsync_services::list_mods(&root, search.as_deref())?;
    tracing::info!(event = "mods_listed", count = catalog.mods.len(), root = %root.display());

    if format == OutputFormat::Json {
        let list = ModList {
            schema_version: SCHEMA_VERSION,
            mods_root: root.display().to_string(),
            mods: catalog.mods,
        };
        serde_json::to_writer_pretty(std::io::stdout().lock(), &list)?;
        println!();
        return Ok(());
    }

    for m in &catalog.mods {
        let id = if ctx.use_color {
            m.id.green().to_string()
        } else {
            m.id.clone()
        };
        let package = m.package_id.as_deref().unwrap_or("-");
        println!("{id}  {}  [{package}]", m.name);
        if !m.submodules.is_empty() {
            println!("    submodules: {}", m.submodules.join(", "));
        }
    }
    print_issues(&catalog.issues);
    if catalog.mods.is_empty() {
        crate::ui_info!("no mods found under {}", root.display());
    }
    Ok(())
}
