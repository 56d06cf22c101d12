use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RimSyncError;

/// How scanned entries are reconciled with an existing translation file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Keep confirmed translations, refresh placeholders, retain stale keys.
    #[default]
    Merge,
    /// Regenerate every entry from the sources.
    Replace,
}

/// What an untranslated entry is filled with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderMode {
    /// Literal `TODO` token.
    #[default]
    Todo,
    /// Copy of the English source text.
    Original,
}

/// How submodule output files are named.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingOption {
    /// Submodule files keep their source names.
    None,
    /// `<submodule>_<file>.xml`
    #[default]
    Prefix,
    /// `<file>_<submodule>.xml`
    Suffix,
}

/// Resolution of a target-path collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictChoice {
    Merge,
    Prefix,
    Suffix,
    Skip,
    Cancel,
}

macro_rules! impl_option_text {
    ($name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RimSyncError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(RimSyncError::InvalidOption {
                    kind: $kind,
                    value: s.to_string(),
                    expected: concat!($($text, " "),+),
                })
            }
        }
    };
}

impl_option_text!(UpdateMode, "update mode" {
    Merge => "merge",
    Replace => "replace",
});

impl_option_text!(PlaceholderMode, "placeholder mode" {
    Todo => "todo",
    Original => "original",
});

impl_option_text!(NamingOption, "naming option" {
    None => "none",
    Prefix => "prefix",
    Suffix => "suffix",
});

impl_option_text!(ConflictChoice, "conflict choice" {
    Merge => "merge",
    Prefix => "prefix",
    Suffix => "suffix",
    Skip => "skip",
    Cancel => "cancel",
});
