//! Orchestration over the lower crates: mod discovery, target planning,
//! merge, conflict handling and the extraction run itself. Used by the CLI.

pub use rimsync_core::Result;

pub mod compare;
pub mod conflict;
pub mod issues;
pub mod lang;
pub mod merge;
pub mod mods;
pub mod prune;
pub mod run;
pub mod source;
pub mod submods;
pub mod util;
pub mod version;
pub mod worker;

pub use compare::{compare_files, find_orphans};
pub use conflict::{ConflictContext, ConflictPrompt, ConflictResolver, Decision, FixedPrompt, ResolverState};
pub use lang::{resolve_lang_dir, rimworld_lang_dir, DEFAULT_LANG_DIR};
pub use merge::{merge, MergeOptions, MergeOutcome};
pub use mods::{list_mods, ModCatalog};
pub use run::{ExtractionRun, PlannedFile, RunConfig, RunControl};
pub use source::{EntryProvider, ProvidedSet, SourceScanner, TranslationLoader};
pub use worker::{spawn_run, RunEvent, RunHandle};
