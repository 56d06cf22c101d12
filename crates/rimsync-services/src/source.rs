//! Entry providers: the source scanner (mod sources) and the translation
//! loader (existing output files) yield entry sets the same way, so the
//! live run and the compare report share one pipeline.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rimsync_core::{Category, EntrySet, LogicalFile, PlaceholderMode, SubmoduleRef};
use rimsync_domain::Issue;
use rimsync_parsers_xml::{
    list_xml_files, load_language_file, read_manifest, scan_defs_file, scan_keyed_file, DefsFile,
    ManifestError,
};

use crate::issues::{issue, IssueKind};
use crate::mods::{defs_dir, find_submodules, keyed_dir, manifest_issue};
use crate::util::legacy_path;

/// Entries for one logical file, plus what is known about the file itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidedSet {
    pub entries: EntrySet,
    /// Owner ids recorded in the file (translation files only).
    pub owners: Vec<String>,
    pub existed: bool,
}

/// Something that can produce the entries of a logical file.
///
/// `target` is the resolved output path of `file`; source providers ignore
/// it. Errors come back as ready-made issues.
pub trait EntryProvider {
    fn provide(&mut self, file: &LogicalFile, target: &Path) -> Result<ProvidedSet, Issue>;
}

/// Scans mod sources. Defs files are parsed once during discovery and
/// served from a cache afterwards.
#[derive(Debug, Default)]
pub struct SourceScanner {
    defs: HashMap<PathBuf, Vec<DefsFile>>,
}

impl SourceScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logical files of one mod: main Defs, main Keyed, then each
    /// submodule's Defs and Keyed. Problems are pushed to `issues`.
    pub fn discover(&mut self, mods_root: &Path, mod_id: &str, issues: &mut Vec<Issue>) -> Vec<LogicalFile> {
        let mod_root = mods_root.join(mod_id);
        if let Err(e) = read_manifest(&mod_root) {
            issues.push(manifest_issue(&e));
            return Vec::new();
        }
        let mut files = self.discover_root(mod_id, &mod_root, None, issues);
        for sub in find_submodules(&mod_root) {
            match read_manifest(&sub.root) {
                Ok(_) | Err(ManifestError::Missing(_)) => {}
                Err(e) => {
                    issues.push(manifest_issue(&e));
                    continue;
                }
            }
            let root = sub.root.clone();
            files.extend(self.discover_root(mod_id, &root, Some(sub), issues));
        }
        tracing::debug!(event = "mod_discovered", mod_id = mod_id, files = files.len());
        files
    }

    fn discover_root(
        &mut self,
        mod_id: &str,
        root: &Path,
        submodule: Option<SubmoduleRef>,
        issues: &mut Vec<Issue>,
    ) -> Vec<LogicalFile> {
        let mut out = Vec::new();
        if let Some(dir) = defs_dir(root) {
            for path in list_xml_files(&dir) {
                let groups = match scan_defs_file(&path) {
                    Ok(g) => g,
                    Err(e) => {
                        issues.push(issue(IssueKind::SourceParse, &path, e.to_string()));
                        continue;
                    }
                };
                let Some(name) = path.file_name() else {
                    continue;
                };
                for group in &groups {
                    out.push(LogicalFile {
                        mod_id: mod_id.to_string(),
                        submodule: submodule.clone(),
                        category: Category::DefInjected {
                            def_type: group.def_type.clone(),
                        },
                        rel_path: PathBuf::from(name),
                        source_path: path.clone(),
                    });
                }
                self.defs.insert(path, groups);
            }
        }
        if let Some(dir) = keyed_dir(root) {
            for path in list_xml_files(&dir) {
                let Ok(rel) = path.strip_prefix(&dir) else {
                    continue;
                };
                out.push(LogicalFile {
                    mod_id: mod_id.to_string(),
                    submodule: submodule.clone(),
                    category: Category::Keyed,
                    rel_path: rel.to_path_buf(),
                    source_path: path.clone(),
                });
            }
        }
        out
    }
}

impl EntryProvider for SourceScanner {
    fn provide(&mut self, file: &LogicalFile, _target: &Path) -> Result<ProvidedSet, Issue> {
        let entries = match &file.category {
            Category::DefInjected { def_type } => {
                if !self.defs.contains_key(&file.source_path) {
                    let groups = scan_defs_file(&file.source_path).map_err(|e| {
                        issue(IssueKind::SourceParse, &file.source_path, e.to_string())
                    })?;
                    self.defs.insert(file.source_path.clone(), groups);
                }
                self.defs
                    .get(&file.source_path)
                    .and_then(|groups| groups.iter().find(|g| &g.def_type == def_type))
                    .map(|g| g.entries.clone())
                    .unwrap_or_default()
            }
            Category::Keyed => scan_keyed_file(&file.source_path)
                .map_err(|e| issue(IssueKind::SourceParse, &file.source_path, e.to_string()))?,
        };
        Ok(ProvidedSet {
            entries,
            owners: Vec::new(),
            existed: true,
        })
    }
}

/// Loads existing translation files at target paths.
#[derive(Debug, Clone)]
pub struct TranslationLoader {
    pub convention: PlaceholderMode,
    /// Read `DefLinked`/`CodeLinked` when the modern file is missing.
    pub legacy_fallback: bool,
}

impl TranslationLoader {
    pub fn new(convention: PlaceholderMode) -> Self {
        Self {
            convention,
            legacy_fallback: false,
        }
    }

    pub fn with_legacy_fallback(mut self, on: bool) -> Self {
        self.legacy_fallback = on;
        self
    }
}

impl EntryProvider for TranslationLoader {
    fn provide(&mut self, _file: &LogicalFile, target: &Path) -> Result<ProvidedSet, Issue> {
        let mut path = target.to_path_buf();
        if self.legacy_fallback && !path.exists() {
            if let Some(legacy) = legacy_path(target).filter(|p| p.is_file()) {
                tracing::debug!(event = "legacy_translation_read", path = %legacy.display());
                path = legacy;
            }
        }
        let loaded = load_language_file(&path, self.convention)
            .map_err(|e| issue(IssueKind::TranslationParse, &path, e.to_string()))?;
        Ok(ProvidedSet {
            entries: loaded.entries,
            owners: loaded.owners,
            existed: loaded.existed,
        })
    }
}
