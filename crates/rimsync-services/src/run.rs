//! One extraction run: plan the logical files of the selected mods, then
//! scan, reconcile and write them one by one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rimsync_core::{
    ConflictChoice, LogicalFile, NamingOption, PlaceholderMode, RimSyncError, UpdateMode,
};
use rimsync_domain::{DiffSummary, FileReport, FileStatus, Issue, RunReport, RunStatus, SCHEMA_VERSION};
use rimsync_parsers_xml::{render_language_file, write_atomic};

use crate::conflict::{ConflictContext, ConflictPrompt, ConflictResolver};
use crate::issues::{has_errors, issue, IssueKind};
use crate::merge::{merge, MergeOptions, MergeOutcome};
use crate::mods::{ensure_mods_root, list_mods};
use crate::source::{EntryProvider, ProvidedSet, SourceScanner, TranslationLoader};
use crate::submods::resolve_targets;
use crate::util::{migrate_legacy_dirs, path_key};
use crate::{conflict::rename_candidate, lang::DEFAULT_LANG_DIR, Result};

/// Prefix/Suffix renames tried per file before giving up.
pub const MAX_RENAME_ATTEMPTS: usize = 32;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mods_root: PathBuf,
    /// Mod folder names, processed in this order.
    pub mods: Vec<String>,
    /// Ignore `mods` and take every mod with a manifest.
    pub all_mods: bool,
    /// RimWorld language folder (`ChineseTraditional`, or a custom name).
    pub lang_dir: String,
    pub placeholder: PlaceholderMode,
    pub naming: NamingOption,
    pub update_mode: UpdateMode,
    /// Write into this folder instead of `<mod>/Languages/<lang_dir>`.
    pub out_dir: Option<PathBuf>,
    pub abort_on_error: bool,
    pub migrate_legacy: bool,
}

impl RunConfig {
    pub fn new(mods_root: impl Into<PathBuf>) -> Self {
        Self {
            mods_root: mods_root.into(),
            mods: Vec::new(),
            all_mods: false,
            lang_dir: DEFAULT_LANG_DIR.to_string(),
            placeholder: PlaceholderMode::default(),
            naming: NamingOption::default(),
            update_mode: UpdateMode::default(),
            out_dir: None,
            abort_on_error: false,
            migrate_legacy: true,
        }
    }

    pub fn lang_root(&self, mod_id: &str) -> PathBuf {
        match &self.out_dir {
            Some(dir) => dir.clone(),
            None => self
                .mods_root
                .join(mod_id)
                .join("Languages")
                .join(&self.lang_dir),
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions::new(self.update_mode, self.placeholder)
    }
}

/// A logical file with its resolved output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub file: LogicalFile,
    pub target: PathBuf,
    /// `Languages/<lang>` folder the target lives in.
    pub lang_root: PathBuf,
}

/// Cooperative controls shared with whoever drives the run. Checked between
/// logical files.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    cancel: Arc<AtomicBool>,
    reset: Arc<AtomicBool>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Ask the run to forget sticky conflict choices before the next file.
    pub fn reset_conflict_choice(&self) {
        self.reset.store(true, Ordering::SeqCst);
    }

    fn take_reset(&self) -> bool {
        self.reset.swap(false, Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ExtractionRun {
    pub(crate) config: RunConfig,
    pub(crate) files: Vec<PlannedFile>,
    pub(crate) issues: Vec<Issue>,
    pub(crate) scanner: SourceScanner,
    resolver: ConflictResolver,
}

impl ExtractionRun {
    /// Discover and name every logical file of the selected mods.
    ///
    /// Fails only on configuration errors; per-mod problems end up in
    /// [`ExtractionRun::issues`].
    pub fn plan(config: RunConfig) -> Result<Self> {
        ensure_mods_root(&config.mods_root)?;
        let mut issues = Vec::new();
        let mod_ids = if config.all_mods {
            let catalog = list_mods(&config.mods_root, None)?;
            issues.extend(catalog.issues);
            catalog.mods.into_iter().map(|m| m.id).collect::<Vec<_>>()
        } else {
            config.mods.clone()
        };
        if mod_ids.is_empty() {
            return Err(RimSyncError::NoModSelected.into());
        }
        if config.out_dir.is_some() && mod_ids.len() > 1 {
            return Err(RimSyncError::OutDirWithMultipleMods(mod_ids.len()).into());
        }
        if let Some(missing) = mod_ids.iter().find(|id| !config.mods_root.join(id).is_dir()) {
            return Err(RimSyncError::ModNotFound(missing.clone()).into());
        }

        let mut scanner = SourceScanner::new();
        let mut files = Vec::new();
        for mod_id in &mod_ids {
            let logical = scanner.discover(&config.mods_root, mod_id, &mut issues);
            let lang_root = config.lang_root(mod_id);
            let plan = resolve_targets(&logical, config.naming, &lang_root);
            issues.extend(plan.warnings);
            files.extend(logical.into_iter().zip(plan.targets).map(|(file, target)| PlannedFile {
                file,
                target,
                lang_root: lang_root.clone(),
            }));
        }
        tracing::info!(event = "run_planned", mods = mod_ids.len(), files = files.len(), lang = %config.lang_dir);
        Ok(Self {
            config,
            files,
            issues,
            scanner,
            resolver: ConflictResolver::new(),
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn files(&self) -> &[PlannedFile] {
        &self.files
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn reset_conflict_choice(&mut self) {
        self.resolver.reset_choice();
    }

    pub fn execute(self, prompt: &mut dyn ConflictPrompt, control: &RunControl) -> RunReport {
        self.execute_observed(prompt, control, &mut |_| {})
    }

    /// Run to completion (or cancel). `observer` sees each file report as
    /// soon as the file is done.
    pub fn execute_observed(
        mut self,
        prompt: &mut dyn ConflictPrompt,
        control: &RunControl,
        observer: &mut dyn FnMut(&FileReport),
    ) -> RunReport {
        self.resolver = ConflictResolver::new();
        if self.config.migrate_legacy {
            self.migrate_legacy();
        }
        tracing::info!(event = "extract_started", files = self.files.len());

        let mut loader = TranslationLoader::new(self.config.placeholder);
        let mut claimed: HashMap<String, String> = HashMap::new();
        let mut reports = Vec::new();
        let mut cancelled = false;
        let files = std::mem::take(&mut self.files);

        for planned in &files {
            if control.take_reset() {
                self.resolver.reset_choice();
            }
            if control.is_cancelled() {
                tracing::warn!(event = "extract_cancelled", at = %planned.target.display());
                cancelled = true;
                break;
            }
            let errors_before = self.error_count();
            match self.process_file(planned, &mut loader, &mut claimed, prompt) {
                FileOutcome::Done(report) => {
                    observer(&report);
                    reports.push(report);
                }
                FileOutcome::Skipped(Some(report)) => {
                    observer(&report);
                    reports.push(report);
                }
                FileOutcome::Skipped(None) => {}
                FileOutcome::Cancelled => {
                    tracing::warn!(event = "extract_cancelled", at = %planned.target.display());
                    cancelled = true;
                    break;
                }
            }
            if self.config.abort_on_error && self.error_count() > errors_before {
                tracing::warn!(event = "extract_aborted", at = %planned.target.display());
                break;
            }
        }

        let status = if cancelled {
            RunStatus::Cancelled
        } else if has_errors(&self.issues) {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        };
        build_report("extract", status, reports, self.issues, Vec::new())
    }

    fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind != IssueKind::NamingCollision.as_str())
            .count()
    }

    fn migrate_legacy(&mut self) {
        let mut roots: Vec<&Path> = self.files.iter().map(|f| f.lang_root.as_path()).collect();
        roots.sort();
        roots.dedup();
        let mut failures = Vec::new();
        for root in roots {
            if let Err(e) = migrate_legacy_dirs(root) {
                failures.push(issue(IssueKind::Write, root, format!("legacy folder rename failed: {e}")));
            }
        }
        self.issues.extend(failures);
    }

    fn process_file(
        &mut self,
        planned: &PlannedFile,
        loader: &mut TranslationLoader,
        claimed: &mut HashMap<String, String>,
        prompt: &mut dyn ConflictPrompt,
    ) -> FileOutcome {
        let file = &planned.file;
        let owner = file.owner_id();
        let scanned = match self.scanner.provide(file, &planned.target) {
            Ok(s) => s,
            Err(issue) => {
                self.issues.push(issue);
                return FileOutcome::Skipped(None);
            }
        };

        let mut target = planned.target.clone();
        let mut attempt = 0usize;
        let mut resolution: Option<ConflictChoice> = None;
        let existing = loop {
            let existing = self.load_existing(loader, file, &target);
            let claimed_by_other = claimed
                .get(&path_key(&target))
                .is_some_and(|o| o != &owner);
            let foreign = existing.existed
                && !existing.owners.is_empty()
                && !existing.owners.iter().any(|o| o == &owner);
            if !claimed_by_other && !foreign {
                break existing;
            }
            let ctx = ConflictContext {
                target: target.clone(),
                file: file.clone(),
                existing_owners: existing.owners.clone(),
                category: file.category.kind(),
                proposed: match self.config.naming {
                    NamingOption::Suffix => ConflictChoice::Suffix,
                    _ => ConflictChoice::Prefix,
                },
            };
            let choice = self.resolver.resolve(ctx, prompt);
            tracing::info!(event = "conflict_resolved", target = %target.display(), owner = %owner, choice = %choice);
            resolution = Some(choice);
            match choice {
                ConflictChoice::Merge => break existing,
                ConflictChoice::Prefix | ConflictChoice::Suffix => {
                    if attempt >= MAX_RENAME_ATTEMPTS {
                        self.issues.push(issue(
                            IssueKind::RenameExhausted,
                            &planned.target,
                            format!("no free name after {MAX_RENAME_ATTEMPTS} attempts"),
                        ));
                        return FileOutcome::Skipped(None);
                    }
                    let tag = file.submodule_id().unwrap_or(&file.mod_id);
                    target = rename_candidate(&planned.target, tag, choice, attempt);
                    attempt += 1;
                }
                ConflictChoice::Skip => {
                    return FileOutcome::Skipped(Some(file_report(
                        planned,
                        &target,
                        FileStatus::Skipped,
                        existing.existed,
                        Some(choice),
                        None,
                    )));
                }
                ConflictChoice::Cancel => return FileOutcome::Cancelled,
            }
        };

        // a file with co-owners keeps their owner ids and their entries
        let merging_foreign = resolution == Some(ConflictChoice::Merge);
        let shared = merging_foreign || existing.owners.iter().any(|o| o != &owner);
        let mut opts = self.config.merge_options();
        if merging_foreign {
            opts.mode = UpdateMode::Merge;
        }
        opts.keep_foreign = shared;
        let outcome = merge(&scanned.entries, &existing.entries, opts);
        let mut owners = existing.owners.clone();
        if !owners.contains(&owner) {
            owners.push(owner.clone());
        }

        let body = render_language_file(&outcome.entries, &owners);
        let unchanged = existing.existed
            && std::fs::read_to_string(&target).is_ok_and(|current| current == body);
        let status = if unchanged {
            FileStatus::Unchanged
        } else {
            if let Err(e) = write_atomic(&target, &body) {
                self.issues.push(issue(IssueKind::Write, &target, e.to_string()));
                return FileOutcome::Skipped(None);
            }
            if existing.existed {
                FileStatus::Updated
            } else {
                FileStatus::Created
            }
        };
        tracing::debug!(
            event = "file_processed",
            owner = %owner,
            target = %target.display(),
            status = ?status,
            entries = outcome.entries.len()
        );
        claimed.insert(path_key(&target), owner);
        FileOutcome::Done(file_report(
            planned,
            &target,
            status,
            existing.existed,
            resolution,
            Some(&outcome),
        ))
    }

    fn load_existing(&mut self, loader: &mut TranslationLoader, file: &LogicalFile, target: &Path) -> ProvidedSet {
        match loader.provide(file, target) {
            Ok(set) => set,
            Err(issue) => {
                self.issues.push(issue);
                ProvidedSet::default()
            }
        }
    }
}

enum FileOutcome {
    Done(FileReport),
    Skipped(Option<FileReport>),
    Cancelled,
}

pub(crate) fn file_report(
    planned: &PlannedFile,
    target: &Path,
    status: FileStatus,
    existed: bool,
    resolution: Option<ConflictChoice>,
    outcome: Option<&MergeOutcome>,
) -> FileReport {
    let file = &planned.file;
    FileReport {
        owner: file.owner_id(),
        mod_id: file.mod_id.clone(),
        submodule: file.submodule_id().map(str::to_string),
        category: file.category.kind().to_string(),
        source: file.source_path.display().to_string(),
        target: target.display().to_string(),
        status,
        existed,
        conflict: resolution.is_some(),
        resolution: resolution.map(|c| c.to_string()),
        summary: outcome.map(MergeOutcome::summary).unwrap_or_default(),
        changes: outcome.map(MergeOutcome::records).unwrap_or_default(),
    }
}

pub(crate) fn build_report(
    mode: &str,
    status: RunStatus,
    files: Vec<FileReport>,
    issues: Vec<Issue>,
    orphans: Vec<String>,
) -> RunReport {
    let mut summary = DiffSummary::default();
    for f in &files {
        summary.absorb(&f.summary);
    }
    tracing::info!(
        event = "run_finished",
        mode = mode,
        status = ?status,
        files = files.len(),
        issues = issues.len(),
        added = summary.added,
        removed = summary.removed
    );
    RunReport {
        schema_version: SCHEMA_VERSION,
        mode: mode.to_string(),
        status,
        files,
        issues,
        summary,
        orphans,
    }
}
