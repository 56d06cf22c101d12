use std::path::PathBuf;

use color_eyre::eyre::Result;
use rimsync_services::ExtractionRun;

use crate::report::print_run;
use crate::{Ctx, ModeArgs, OutputFormat, Selection};

pub fn run_compare(
    ctx: &Ctx,
    selection: Selection,
    modes: ModeArgs,
    out_dir: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let rc = super::run_config(ctx, selection, Some(modes), out_dir)?;
    let report = ExtractionRun::plan(rc)?.compare();
    print_run(&report, format, ctx.use_color, false)
}
