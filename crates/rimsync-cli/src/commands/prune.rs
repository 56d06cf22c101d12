use std::path::PathBuf;

use color_eyre::eyre::Result;
use rimsync_services::ExtractionRun;

use crate::report::print_prune;
use crate::{Ctx, OutputFormat, Selection};

pub fn run_prune(
    ctx: &Ctx,
    selection: Selection,
    out_dir: Option<PathBuf>,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    let rc = super::run_config(ctx, selection, None, out_dir)?;
    let report = ExtractionRun::plan(rc)?.prune(dry_run);
    print_prune(&report, format)
}
