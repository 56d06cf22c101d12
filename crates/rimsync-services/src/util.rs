use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Pre-1.0 folder names and their replacements below `Languages/<lang>/`.
pub const LEGACY_DIRS: &[(&str, &str)] = &[("DefLinked", "DefInjected"), ("CodeLinked", "Keyed")];

/// Case-insensitive identity of a path, for collision checks.
pub fn path_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

/// Same path with the category folder swapped for its legacy name,
/// e.g. `.../Keyed/Misc.xml` → `.../CodeLinked/Misc.xml`.
pub fn legacy_path(target: &Path) -> Option<PathBuf> {
    let comps: Vec<Component> = target.components().collect();
    let idx = comps.iter().rposition(|c| {
        LEGACY_DIRS
            .iter()
            .any(|(_, modern)| c.as_os_str() == OsStr::new(modern))
    })?;
    let legacy = LEGACY_DIRS
        .iter()
        .find(|(_, modern)| comps[idx].as_os_str() == OsStr::new(modern))
        .map(|(old, _)| *old)?;
    let mut out = PathBuf::new();
    for (i, c) in comps.iter().enumerate() {
        if i == idx {
            out.push(legacy);
        } else {
            out.push(c.as_os_str());
        }
    }
    Some(out)
}

/// Rename legacy category folders inside one language folder. Existing
/// modern folders are left alone. Returns the renames performed.
pub fn migrate_legacy_dirs(lang_root: &Path) -> std::io::Result<Vec<(PathBuf, PathBuf)>> {
    let mut done = Vec::new();
    for (old, new) in LEGACY_DIRS {
        let from = lang_root.join(old);
        let to = lang_root.join(new);
        if from.is_dir() && !to.exists() {
            std::fs::rename(&from, &to)?;
            tracing::info!(event = "legacy_dir_migrated", from = %from.display(), to = %to.display());
            done.push((from, to));
        }
    }
    Ok(done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn legacy_path_swaps_last_category_component() {
        let p = Path::new("Mods/A/Languages/Russian/Keyed/sub/Misc.xml");
        assert_eq!(
            legacy_path(p),
            Some(PathBuf::from("Mods/A/Languages/Russian/CodeLinked/sub/Misc.xml"))
        );
        let p = Path::new("L/DefInjected/ThingDef/Weapons.xml");
        assert_eq!(
            legacy_path(p),
            Some(PathBuf::from("L/DefLinked/ThingDef/Weapons.xml"))
        );
        assert_eq!(legacy_path(Path::new("L/Other/x.xml")), None);
    }

    #[test]
    fn migrate_only_when_target_free() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("DefLinked/ThingDef")).unwrap();
        fs::create_dir_all(dir.path().join("CodeLinked")).unwrap();
        fs::create_dir_all(dir.path().join("Keyed")).unwrap();
        let done = migrate_legacy_dirs(dir.path()).unwrap();
        assert_eq!(done.len(), 1);
        assert!(dir.path().join("DefInjected/ThingDef").is_dir());
        assert!(dir.path().join("CodeLinked").is_dir());
    }

    #[test]
    fn path_key_ignores_case() {
        assert_eq!(
            path_key(Path::new("A/Keyed/Misc.xml")),
            path_key(Path::new("a/keyed/MISC.xml"))
        );
    }
}
