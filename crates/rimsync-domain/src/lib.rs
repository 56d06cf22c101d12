use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// One mod found under the mods root.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModInfo {
    /// Folder name; used to select the mod.
    pub id: String,
    /// Display name from `About/About.xml`, falling back to the folder name.
    pub name: String,
    pub package_id: Option<String>,
    pub path: String,
    pub submodules: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ModList {
    pub schema_version: u32,
    pub mods_root: String,
    pub mods: Vec<ModInfo>,
}

/// Per-key outcome written to reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChangeRecord {
    pub key: String,
    /// added | removed | unchanged | retranslated | placeholder_filled
    pub decision: String,
    /// Removed entry still present in the output (soft delete).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retained: bool,
    /// Source text changed under a kept translation.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub source_changed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub retranslated: usize,
    pub placeholder_filled: usize,
    /// Subset of `removed` still kept in output files.
    pub retained: usize,
}

impl DiffSummary {
    pub fn absorb(&mut self, other: &DiffSummary) {
        self.added += other.added;
        self.removed += other.removed;
        self.unchanged += other.unchanged;
        self.retranslated += other.retranslated;
        self.placeholder_filled += other.placeholder_filled;
        self.retained += other.retained;
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.unchanged + self.retranslated + self.placeholder_filled
    }

    /// Anything other than `unchanged`.
    pub fn has_changes(&self) -> bool {
        self.total() != self.unchanged
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Created,
    Updated,
    Unchanged,
    Skipped,
}

impl FileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Created => "created",
            FileStatus::Updated => "updated",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileReport {
    /// Owner id, e.g. `MyMod/Balance:Keyed/Misc.xml`.
    pub owner: String,
    pub mod_id: String,
    pub submodule: Option<String>,
    pub category: String,
    pub source: String,
    pub target: String,
    pub status: FileStatus,
    /// Target file existed before this run.
    pub existed: bool,
    /// Target collides with another logical file (compare) or was
    /// resolved through the conflict resolver (extract).
    pub conflict: bool,
    /// Resolution applied to the collision, if any.
    pub resolution: Option<String>,
    pub summary: DiffSummary,
    pub changes: Vec<ChangeRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Issue {
    /// manifest_missing | manifest_malformed | source_parse | translation_parse
    /// | write | naming_collision | rename_exhausted
    pub kind: String,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithErrors,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed_with_errors",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RunReport {
    pub schema_version: u32,
    /// extract | compare
    pub mode: String,
    pub status: RunStatus,
    pub files: Vec<FileReport>,
    pub issues: Vec<Issue>,
    pub summary: DiffSummary,
    /// Existing translation files no logical file maps to.
    #[serde(default)]
    pub orphans: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PruneFileStat {
    pub path: String,
    pub removed: Vec<String>,
    pub kept: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PruneReport {
    pub schema_version: u32,
    pub dry_run: bool,
    pub files: Vec<PruneFileStat>,
    pub total_removed: usize,
    pub issues: Vec<Issue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_absorb_and_changes() {
        let mut a = DiffSummary {
            unchanged: 3,
            ..Default::default()
        };
        assert!(!a.has_changes());
        a.absorb(&DiffSummary {
            added: 1,
            removed: 2,
            retained: 2,
            ..Default::default()
        });
        assert_eq!(a.total(), 6);
        assert_eq!(a.retained, 2);
        assert!(a.has_changes());
    }

    #[test]
    fn change_record_omits_false_flags() {
        let rec = ChangeRecord {
            key: "GreetingText".into(),
            decision: "added".into(),
            retained: false,
            source_changed: false,
        };
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"{"key":"GreetingText","decision":"added"}"#);
    }

    #[test]
    fn run_status_is_snake_case() {
        let json = serde_json::to_string(&RunStatus::CompletedWithErrors).unwrap();
        assert_eq!(json, "\"completed_with_errors\"");
    }
}
