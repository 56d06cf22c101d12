use std::path::{Path, PathBuf};

use rimsync_core::{RimSyncError, SubmoduleRef};
use rimsync_domain::{Issue, ModInfo};
use rimsync_parsers_xml::{read_manifest, ManifestError};

use crate::issues::{issue, IssueKind};
use crate::version::{content_dir, latest_version_dir};
use crate::Result;

#[derive(Debug, Clone, Default)]
pub struct ModCatalog {
    pub mods: Vec<ModInfo>,
    pub issues: Vec<Issue>,
}

pub fn ensure_mods_root(mods_root: &Path) -> Result<()> {
    if !mods_root.is_dir() {
        return Err(RimSyncError::ModsRootMissing(mods_root.to_path_buf()).into());
    }
    Ok(())
}

/// Mods under `mods_root` with a readable `About/About.xml`, sorted by
/// display name. `search` keeps mods whose name or folder contains it
/// (case-insensitive).
pub fn list_mods(mods_root: &Path, search: Option<&str>) -> Result<ModCatalog> {
    ensure_mods_root(mods_root)?;
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let mut catalog = ModCatalog::default();
    for dir in sorted_subdirs(mods_root)? {
        let Some(id) = dir.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let manifest = match read_manifest(&dir) {
            Ok(m) => m,
            Err(e) => {
                catalog.issues.push(manifest_issue(&e));
                continue;
            }
        };
        let name = manifest.name.unwrap_or_else(|| id.clone());
        if let Some(n) = needle.as_deref() {
            if !name.to_lowercase().contains(n) && !id.to_lowercase().contains(n) {
                continue;
            }
        }
        catalog.mods.push(ModInfo {
            submodules: find_submodules(&dir).into_iter().map(|s| s.id).collect(),
            id,
            name,
            package_id: manifest.package_id,
            path: dir.display().to_string(),
        });
    }
    catalog
        .mods
        .sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.id.cmp(&b.id)));
    tracing::debug!(event = "mods_listed", root = %mods_root.display(), count = catalog.mods.len());
    Ok(catalog)
}

pub(crate) fn manifest_issue(err: &ManifestError) -> Issue {
    match err {
        ManifestError::Missing(p) => issue(IssueKind::ManifestMissing, p, err.to_string()),
        ManifestError::Malformed { path, .. } => {
            issue(IssueKind::ManifestMalformed, path, err.to_string())
        }
    }
}

/// Submodules live in `<mod>/Mods/*`, or in `<newest version>/Mods/*`.
pub fn find_submodules(mod_root: &Path) -> Vec<SubmoduleRef> {
    let mods_dir = {
        let direct = mod_root.join("Mods");
        if direct.is_dir() {
            Some(direct)
        } else {
            latest_version_dir(mod_root)
                .map(|v| v.join("Mods"))
                .filter(|p| p.is_dir())
        }
    };
    let Some(mods_dir) = mods_dir else {
        return Vec::new();
    };
    sorted_subdirs(&mods_dir)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|root| {
            let id = root.file_name()?.to_str()?.to_string();
            Some(SubmoduleRef { id, root })
        })
        .collect()
}

pub fn defs_dir(root: &Path) -> Option<PathBuf> {
    content_dir(root, Path::new("Defs"))
}

pub fn keyed_dir(root: &Path) -> Option<PathBuf> {
    content_dir(root, &Path::new("Languages").join("English").join("Keyed"))
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            out.push(entry.path());
        }
    }
    out.sort();
    Ok(out)
}
