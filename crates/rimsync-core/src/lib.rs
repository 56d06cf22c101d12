use std::path::PathBuf;

use thiserror::Error;

mod entry;
mod logical;
mod options;

pub use entry::{Entry, EntrySet, MergeDecision, Provenance, ValueShape};
pub use logical::{Category, CategoryKind, LogicalFile, SubmoduleRef};
pub use options::{ConflictChoice, NamingOption, PlaceholderMode, UpdateMode};

/// Workspace-wide result alias.
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Literal token written for untranslated entries in TODO placeholder mode.
pub const PLACEHOLDER_TOKEN: &str = "TODO";

/// Errors that stop a run before (or while) it touches any file.
#[derive(Debug, Error)]
pub enum RimSyncError {
    #[error("mods root does not exist: {0}")]
    ModsRootMissing(PathBuf),
    #[error("mod not found under mods root: {0}")]
    ModNotFound(String),
    #[error("no mod selected")]
    NoModSelected,
    #[error("--out-dir can only be used with a single mod ({0} selected)")]
    OutDirWithMultipleMods(usize),
    #[error("invalid {kind}: '{value}' (expected one of: {expected})")]
    InvalidOption {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("run cancelled before all files were processed")]
    Cancelled,
}
