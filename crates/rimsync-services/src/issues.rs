use std::path::Path;

use rimsync_domain::Issue;

/// Non-fatal problems collected during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    ManifestMissing,
    ManifestMalformed,
    SourceParse,
    TranslationParse,
    Write,
    NamingCollision,
    RenameExhausted,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::ManifestMissing => "manifest_missing",
            IssueKind::ManifestMalformed => "manifest_malformed",
            IssueKind::SourceParse => "source_parse",
            IssueKind::TranslationParse => "translation_parse",
            IssueKind::Write => "write",
            IssueKind::NamingCollision => "naming_collision",
            IssueKind::RenameExhausted => "rename_exhausted",
        }
    }

    /// Warnings do not turn a run into `completed_with_errors`.
    pub fn is_warning(self) -> bool {
        matches!(self, IssueKind::NamingCollision)
    }
}

pub fn issue(kind: IssueKind, path: &Path, message: impl Into<String>) -> Issue {
    let message = message.into();
    if kind.is_warning() {
        tracing::warn!(event = "run_warning", kind = kind.as_str(), path = %path.display(), message = %message);
    } else {
        tracing::error!(event = "run_issue", kind = kind.as_str(), path = %path.display(), message = %message);
    }
    Issue {
        kind: kind.as_str().to_string(),
        path: path.display().to_string(),
        message,
    }
}

pub fn has_errors(issues: &[Issue]) -> bool {
    issues
        .iter()
        .any(|i| i.kind != IssueKind::NamingCollision.as_str())
}
