use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::Result;

/// A `1.5`-style game version folder inside a mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDir {
    pub name: String,
    pub components: Vec<u32>,
    pub path: PathBuf,
}

static VERSION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v?\d+(?:\.\d+)+$").expect("static version pattern"));

/// `1.4` → `[1, 4]`; a leading `v` is accepted. Needs at least two parts.
pub fn parse_version_components(name: &str) -> Option<Vec<u32>> {
    if !VERSION_NAME.is_match(name) {
        return None;
    }
    name.trim_start_matches('v')
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect()
}

/// Version folders directly under `base`, oldest first.
pub fn list_version_directories(base: &Path) -> Result<Vec<VersionDir>> {
    let mut entries = Vec::new();
    let read_dir = match fs::read_dir(base) {
        Ok(iter) => iter,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(entries),
        Err(err) => return Err(err.into()),
    };
    for entry in read_dir {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name_os = entry.file_name();
        let Some(name) = name_os.to_str() else {
            continue;
        };
        if let Some(components) = parse_version_components(name) {
            entries.push(VersionDir {
                name: name.to_string(),
                components,
                path: entry.path(),
            });
        }
    }
    entries.sort_by(|a, b| a.components.cmp(&b.components).then_with(|| a.name.cmp(&b.name)));
    Ok(entries)
}

pub fn latest_version_dir(base: &Path) -> Option<PathBuf> {
    list_version_directories(base)
        .ok()
        .and_then(|mut v| v.pop())
        .map(|v| v.path)
}

/// `<root>/<rel>` if it is a directory, else the same folder inside the
/// newest version folder.
pub fn content_dir(root: &Path, rel: &Path) -> Option<PathBuf> {
    let direct = root.join(rel);
    if direct.is_dir() {
        return Some(direct);
    }
    let versioned = latest_version_dir(root)?.join(rel);
    versioned.is_dir().then_some(versioned)
}
