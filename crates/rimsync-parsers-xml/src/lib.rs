//! RimWorld XML handling: mod manifests, Defs and Keyed sources, and
//! `LanguageData` translation files (read and write).

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

mod about;
mod defs;
mod keyed;
mod language_data;
mod render;
mod writer;

pub use about::{read_manifest, ManifestError, ModManifest};
pub use defs::{scan_defs_file, scan_defs_str, should_extract_tag, DefsFile};
pub use keyed::{scan_keyed_file, scan_keyed_str};
pub use language_data::{load_language_file, parse_language_data, LoadedFile};
pub use render::{comment_safe, normalize_text, render_placeholder, render_source};
pub use writer::{render_language_file, write_atomic, write_language_file, WriteError};

/// Comment marker placed before entries that still hold a placeholder.
pub const MARKER_UNTRANSLATED: &str = "UNTRANSLATED";
/// Comment marker for translations whose English source changed.
pub const MARKER_FUZZY: &str = "FUZZY";
/// Comment marker for entries whose source key disappeared.
pub const MARKER_UNUSED: &str = "UNUSED";
/// Prefix of the comment listing the logical files that own a target file.
pub const OWNER_PREFIX: &str = "rimsync:owner";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },
    #[error("unexpected root <{found}> in {path} (expected <{expected}>)")]
    UnexpectedRoot {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },
}

/// All `.xml` files under `dir`, sorted by path. Missing dir yields nothing.
pub fn list_xml_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut out: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        })
        .collect();
    out.sort();
    out
}

pub(crate) fn read_source(path: &Path) -> Result<String, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(match text.strip_prefix('\u{FEFF}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}

pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}
