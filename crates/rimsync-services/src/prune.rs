//! Explicit removal of entries whose source key is gone (`UNUSED`).

use rimsync_domain::{PruneFileStat, PruneReport, SCHEMA_VERSION};
use rimsync_parsers_xml::{load_language_file, write_language_file};

use crate::issues::{issue, IssueKind};
use crate::run::ExtractionRun;

impl ExtractionRun {
    /// Drop stale entries from every planned target this run owns. Files
    /// held by another owner are left alone. `dry_run` only counts.
    pub fn prune(self, dry_run: bool) -> PruneReport {
        let mut report = PruneReport {
            schema_version: SCHEMA_VERSION,
            dry_run,
            files: Vec::new(),
            total_removed: 0,
            issues: self.issues,
        };
        for planned in &self.files {
            let owner = planned.file.owner_id();
            let loaded = match load_language_file(&planned.target, self.config.placeholder) {
                Ok(l) if l.existed => l,
                Ok(_) => continue,
                Err(e) => {
                    report.issues.push(issue(IssueKind::TranslationParse, &planned.target, e.to_string()));
                    continue;
                }
            };
            if !loaded.owners.is_empty() && !loaded.owners.contains(&owner) {
                tracing::debug!(event = "prune_foreign_skipped", path = %planned.target.display());
                continue;
            }
            let removed: Vec<String> = loaded
                .entries
                .iter()
                .filter(|e| e.stale)
                .map(|e| e.key.clone())
                .collect();
            if removed.is_empty() {
                continue;
            }
            let mut entries = loaded.entries;
            entries.retain(|e| !e.stale);
            if !dry_run {
                if let Err(e) = write_language_file(&planned.target, &entries, &loaded.owners) {
                    report.issues.push(issue(IssueKind::Write, &planned.target, e.to_string()));
                    continue;
                }
            }
            tracing::info!(event = "stale_pruned", path = %planned.target.display(), removed = removed.len(), dry_run);
            report.total_removed += removed.len();
            report.files.push(PruneFileStat {
                path: planned.target.display().to_string(),
                removed,
                kept: entries.len(),
            });
        }
        report
    }
}
