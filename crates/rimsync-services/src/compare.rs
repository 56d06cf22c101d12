//! Dry-run report: what an extraction would do, without touching disk.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use rimsync_core::CategoryKind;
use rimsync_domain::{FileReport, FileStatus, Issue, RunReport, RunStatus};
use rimsync_parsers_xml::{list_xml_files, render_language_file};

use crate::issues::has_errors;
use crate::merge::{merge, MergeOptions};
use crate::run::{build_report, file_report, ExtractionRun, PlannedFile};
use crate::source::{EntryProvider, ProvidedSet, TranslationLoader};
use crate::util::{legacy_path, path_key, LEGACY_DIRS};

/// Merge every planned file as a live run would and report the result.
///
/// `sources` yields scanned entries, `existing` the current translations.
/// A target that another owner already holds is reported with
/// `conflict: true` and `Skipped` status; no resolution is attempted.
pub fn compare_files(
    files: &[PlannedFile],
    sources: &mut dyn EntryProvider,
    existing: &mut dyn EntryProvider,
    opts: MergeOptions,
) -> (Vec<FileReport>, Vec<Issue>) {
    let mut reports = Vec::new();
    let mut issues = Vec::new();
    let mut claimed: HashMap<String, String> = HashMap::new();

    for planned in files {
        let file = &planned.file;
        let owner = file.owner_id();
        let scanned = match sources.provide(file, &planned.target) {
            Ok(s) => s,
            Err(issue) => {
                issues.push(issue);
                continue;
            }
        };
        // unreadable translations count as absent, as in a live run
        let current = match existing.provide(file, &planned.target) {
            Ok(s) => s,
            Err(issue) => {
                issues.push(issue);
                ProvidedSet::default()
            }
        };

        let key = path_key(&planned.target);
        let foreign = (current.existed
            && !current.owners.is_empty()
            && !current.owners.iter().any(|o| o == &owner))
            || claimed.get(&key).is_some_and(|o| o != &owner);
        if foreign {
            let mut report = file_report(
                planned,
                &planned.target,
                FileStatus::Skipped,
                current.existed,
                None,
                None,
            );
            report.conflict = true;
            reports.push(report);
            continue;
        }
        claimed.insert(key, owner.clone());

        let shared = current.owners.iter().any(|o| o != &owner);
        let outcome = merge(
            &scanned.entries,
            &current.entries,
            MergeOptions {
                keep_foreign: shared,
                ..opts
            },
        );
        let mut owners = current.owners.clone();
        if !owners.contains(&owner) {
            owners.push(owner);
        }
        let body = render_language_file(&outcome.entries, &owners);
        let status = if !current.existed {
            FileStatus::Created
        } else if read_existing(&planned.target).is_some_and(|text| text == body) {
            FileStatus::Unchanged
        } else {
            FileStatus::Updated
        };
        reports.push(file_report(
            planned,
            &planned.target,
            status,
            current.existed,
            None,
            Some(&outcome),
        ));
    }
    (reports, issues)
}

fn read_existing(target: &Path) -> Option<String> {
    std::fs::read_to_string(target).ok()
}

/// Translation files below the planned language folders that no planned
/// target (or its legacy twin) accounts for.
pub fn find_orphans(files: &[PlannedFile]) -> Vec<PathBuf> {
    let mapped: HashSet<String> = files
        .iter()
        .flat_map(|f| {
            let legacy = legacy_path(&f.target);
            std::iter::once(path_key(&f.target)).chain(legacy.map(|p| path_key(&p)))
        })
        .collect();
    let roots: BTreeSet<&Path> = files.iter().map(|f| f.lang_root.as_path()).collect();
    let mut dirs: Vec<&str> = vec![
        CategoryKind::DefInjected.as_str(),
        CategoryKind::Keyed.as_str(),
    ];
    dirs.extend(LEGACY_DIRS.iter().map(|(old, _)| *old));

    let mut orphans = Vec::new();
    for root in roots {
        for dir in &dirs {
            for path in list_xml_files(&root.join(dir)) {
                if !mapped.contains(&path_key(&path)) {
                    orphans.push(path);
                }
            }
        }
    }
    orphans
}

impl ExtractionRun {
    /// Report what [`ExtractionRun::execute`] would do. Reads only; legacy
    /// folders are consulted in place instead of being migrated.
    pub fn compare(mut self) -> RunReport {
        let mut loader = TranslationLoader::new(self.config.placeholder).with_legacy_fallback(true);
        let opts = self.config.merge_options();
        let (files, mut issues) = compare_files(&self.files, &mut self.scanner, &mut loader, opts);
        let orphans = find_orphans(&self.files)
            .into_iter()
            .map(|p| p.display().to_string())
            .collect();
        self.issues.append(&mut issues);
        let status = if has_errors(&self.issues) {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        };
        build_report("compare", status, files, self.issues, orphans)
    }
}
