use std::fs;
use std::path::PathBuf;

use color_eyre::eyre::Result;

use crate::Ctx;

pub fn run_schema(ctx: &Ctx, out_dir: Option<PathBuf>) -> Result<()> {
    let out_dir = out_dir.unwrap_or_else(|| {
        PathBuf::from(
            ctx.cfg
                .schema
                .as_ref()
                .and_then(|s| s.out_dir.clone())
                .unwrap_or_else(|| "./docs/assets/schemas".to_string()),
        )
    });
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
        }};
    }
    dump!(rimsync_domain::ModList, "mod_list.schema.json");
    dump!(rimsync_domain::RunReport, "run_report.schema.json");
    dump!(rimsync_domain::PruneReport, "prune_report.schema.json");
    crate::ui_ok!("schemas written to {}", out_dir.display());
    Ok(())
}
