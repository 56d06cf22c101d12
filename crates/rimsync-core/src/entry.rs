use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where the translated text of an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Freshly extracted from the mod sources; nothing translated yet.
    Original,
    /// Machine-generated filler (`TODO` token or a copy of the source).
    Placeholder,
    /// Confirmed by a human translator. Never discarded by a merge.
    Translated,
}

/// How the value of an entry is laid out in XML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueShape {
    #[default]
    Text,
    /// Value is a sequence of `<li>` items, one per source line.
    List,
}

/// One translatable string of a logical translation file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    /// English source text. For list entries, items are joined with `\n`.
    pub source: String,
    /// Raw XML inner content of the translated element, exactly as stored
    /// on disk. `None` for entries that have not been rendered yet.
    pub translation: Option<String>,
    pub provenance: Provenance,
    #[serde(default)]
    pub shape: ValueShape,
    /// Source string disappeared upstream; entry is kept until pruned.
    #[serde(default)]
    pub stale: bool,
    /// Source string changed upstream under an existing translation.
    #[serde(default)]
    pub fuzzy: bool,
}

impl Entry {
    pub fn original(key: impl Into<String>, source: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            translation: None,
            provenance: Provenance::Original,
            shape,
            stale: false,
            fuzzy: false,
        }
    }

    pub fn with_translation(mut self, raw: impl Into<String>, provenance: Provenance) -> Self {
        self.translation = Some(raw.into());
        self.provenance = provenance;
        self
    }

    pub fn is_translated(&self) -> bool {
        self.provenance == Provenance::Translated
    }
}

/// Insertion-ordered entries of one logical translation file.
///
/// Keys are unique: inserting a key twice keeps the first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: IndexMap<String, Entry>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` (and leaves the set untouched) if the key is taken.
    pub fn insert(&mut self, entry: Entry) -> bool {
        if self.entries.contains_key(&entry.key) {
            return false;
        }
        self.entries.insert(entry.key.clone(), entry);
        true
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Drop entries for which `keep` returns false, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(&Entry) -> bool) {
        self.entries.retain(|_, e| keep(e));
    }
}

impl FromIterator<Entry> for EntrySet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut set = EntrySet::new();
        for e in iter {
            set.insert(e);
        }
        set
    }
}

impl IntoIterator for EntrySet {
    type Item = Entry;
    type IntoIter = indexmap::map::IntoValues<String, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Per-entry outcome of reconciling a scanned set with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeDecision {
    Added,
    Removed,
    Unchanged,
    Retranslated,
    PlaceholderFilled,
}

impl MergeDecision {
    pub const ALL: [MergeDecision; 5] = [
        MergeDecision::Added,
        MergeDecision::Removed,
        MergeDecision::Unchanged,
        MergeDecision::Retranslated,
        MergeDecision::PlaceholderFilled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MergeDecision::Added => "added",
            MergeDecision::Removed => "removed",
            MergeDecision::Unchanged => "unchanged",
            MergeDecision::Retranslated => "retranslated",
            MergeDecision::PlaceholderFilled => "placeholder_filled",
        }
    }
}

impl std::fmt::Display for MergeDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
