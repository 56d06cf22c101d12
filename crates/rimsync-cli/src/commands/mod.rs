pub mod compare;
pub mod extract;
pub mod mods;
pub mod prune;
pub mod schema;

use std::path::PathBuf;

use color_eyre::eyre::{eyre, Result};
use rimsync_services::{resolve_lang_dir, RunConfig};

use crate::{Ctx, ModeArgs, Selection};

/// `--mods-root`, else `mods_root` from rimsync.toml.
pub fn mods_root(ctx: &Ctx, arg: Option<PathBuf>) -> Result<PathBuf> {
    arg.or_else(|| ctx.cfg.mods_root.as_ref().map(PathBuf::from))
        .ok_or_else(|| eyre!("no mods root: pass --mods-root or set mods_root in rimsync.toml"))
}

/// Command line first, then rimsync.toml, then built-in defaults.
pub fn run_config(
    ctx: &Ctx,
    selection: Selection,
    modes: Option<ModeArgs>,
    out_dir: Option<PathBuf>,
) -> Result<RunConfig> {
    let mut rc = RunConfig::new(mods_root(ctx, selection.mods_root)?);
    rc.mods = selection.mods;
    rc.all_mods = selection.all;
    let lang = selection.lang.or_else(|| ctx.cfg.lang.clone());
    rc.lang_dir = resolve_lang_dir(lang.as_deref(), selection.lang_dir.as_deref());
    rc.out_dir = out_dir;

    let extract = ctx.cfg.extract.clone().unwrap_or_default();
    let modes = modes.unwrap_or_default();
    rc.placeholder = modes.placeholder.or(extract.placeholder).unwrap_or_default();
    rc.naming = modes.naming.or(extract.naming).unwrap_or_default();
    rc.update_mode = modes.update_mode.or(extract.update_mode).unwrap_or_default();
    rc.abort_on_error = extract.abort_on_error.unwrap_or(false);
    rc.migrate_legacy = extract.migrate_legacy.unwrap_or(true);
    tracing::debug!(event = "run_config", config = ?rc);
    Ok(rc)
}
