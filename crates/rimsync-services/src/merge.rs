//! Merge engine: reconciles freshly scanned entries with an existing
//! translation file.

use rimsync_core::{EntrySet, MergeDecision, PlaceholderMode, Provenance, UpdateMode};
use rimsync_domain::{ChangeRecord, DiffSummary};
use rimsync_parsers_xml::{comment_safe, normalize_text, render_placeholder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub mode: UpdateMode,
    pub placeholder: PlaceholderMode,
    /// The file is shared with other owners: old-only entries may be theirs,
    /// so they are kept as they are in either mode, never marked stale.
    pub keep_foreign: bool,
}

impl MergeOptions {
    pub fn new(mode: UpdateMode, placeholder: PlaceholderMode) -> Self {
        Self {
            mode,
            placeholder,
            keep_foreign: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    pub key: String,
    pub decision: MergeDecision,
    /// Removed upstream but still written (soft delete).
    pub retained: bool,
    /// Translation kept although its English source changed.
    pub source_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub entries: EntrySet,
    /// New-set order, then old-only keys. `entries` follows the same order
    /// except for shared files, which keep the old file's order.
    pub changes: Vec<ChangeEntry>,
}

impl MergeOutcome {
    pub fn summary(&self) -> DiffSummary {
        summarize(&self.changes)
    }

    pub fn records(&self) -> Vec<ChangeRecord> {
        self.changes
            .iter()
            .map(|c| ChangeRecord {
                key: c.key.clone(),
                decision: c.decision.as_str().to_string(),
                retained: c.retained,
                source_changed: c.source_changed,
            })
            .collect()
    }
}

pub fn summarize(changes: &[ChangeEntry]) -> DiffSummary {
    let mut s = DiffSummary::default();
    for c in changes {
        match c.decision {
            MergeDecision::Added => s.added += 1,
            MergeDecision::Removed => {
                s.removed += 1;
                if c.retained {
                    s.retained += 1;
                }
            }
            MergeDecision::Unchanged => s.unchanged += 1,
            MergeDecision::Retranslated => s.retranslated += 1,
            MergeDecision::PlaceholderFilled => s.placeholder_filled += 1,
        }
    }
    s
}

/// `old_source` comes back from an `EN:` comment, already trimmed, so the
/// new source goes through the same comment escaping and trimming.
fn source_changed(old_source: &str, new_source: &str) -> bool {
    !old_source.is_empty()
        && normalize_text(&comment_safe(&normalize_text(new_source))) != normalize_text(old_source)
}

/// Reconcile `new` (scanned) with `old` (loaded) under `opts`.
///
/// Merge never drops an entry whose provenance is `Translated`: it is
/// copied byte for byte, whatever happened to its source text.
pub fn merge(new: &EntrySet, old: &EntrySet, opts: MergeOptions) -> MergeOutcome {
    let mut out = MergeOutcome::default();
    let mut record = |key: &str, decision, retained, source_changed| {
        out.changes.push(ChangeEntry {
            key: key.to_string(),
            decision,
            retained,
            source_changed,
        })
    };
    let mut entries = EntrySet::new();

    for n in new.iter() {
        let mut entry = n.clone();
        entry.stale = false;
        entry.fuzzy = false;
        let decision = match (opts.mode, old.get(&n.key)) {
            (UpdateMode::Replace, prior) => {
                entry.translation = Some(render_placeholder(n, opts.placeholder));
                entry.provenance = Provenance::Placeholder;
                if prior.is_some() {
                    MergeDecision::PlaceholderFilled
                } else {
                    MergeDecision::Added
                }
            }
            (UpdateMode::Merge, None) => {
                if !n.is_translated() {
                    entry.translation = Some(render_placeholder(n, opts.placeholder));
                    entry.provenance = Provenance::Placeholder;
                }
                MergeDecision::Added
            }
            (UpdateMode::Merge, Some(o)) if o.is_translated() => {
                let changed = source_changed(&o.source, &n.source);
                entry.translation = o.translation.clone();
                entry.provenance = Provenance::Translated;
                entry.fuzzy = o.fuzzy || changed;
                record(&n.key, MergeDecision::Unchanged, false, changed);
                entries.insert(entry);
                continue;
            }
            (UpdateMode::Merge, Some(_)) if n.is_translated() => MergeDecision::Retranslated,
            (UpdateMode::Merge, Some(_)) => {
                entry.translation = Some(render_placeholder(n, opts.placeholder));
                entry.provenance = Provenance::Placeholder;
                MergeDecision::PlaceholderFilled
            }
        };
        record(&n.key, decision, false, false);
        entries.insert(entry);
    }

    for o in old.iter().filter(|o| !new.contains_key(&o.key)) {
        match opts.mode {
            _ if opts.keep_foreign => {
                record(&o.key, MergeDecision::Unchanged, false, false);
                entries.insert(o.clone());
            }
            UpdateMode::Replace => record(&o.key, MergeDecision::Removed, false, false),
            UpdateMode::Merge => {
                record(&o.key, MergeDecision::Removed, true, false);
                let mut kept = o.clone();
                kept.stale = true;
                entries.insert(kept);
            }
        }
    }

    if opts.keep_foreign {
        // shared files keep their layout so co-owners do not reorder each other
        let mut ordered: EntrySet = old.keys().filter_map(|k| entries.get(k).cloned()).collect();
        for e in entries {
            ordered.insert(e);
        }
        entries = ordered;
    }

    out.entries = entries;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rimsync_core::{Entry, ValueShape};

    fn scanned(pairs: &[(&str, &str)]) -> EntrySet {
        pairs
            .iter()
            .map(|(k, s)| Entry::original(*k, *s, ValueShape::Text))
            .collect()
    }

    fn existing(rows: &[(&str, &str, &str, Provenance)]) -> EntrySet {
        rows.iter()
            .map(|(k, s, raw, p)| Entry::original(*k, *s, ValueShape::Text).with_translation(*raw, *p))
            .collect()
    }

    fn decisions(out: &MergeOutcome) -> Vec<(&str, MergeDecision)> {
        out.changes.iter().map(|c| (c.key.as_str(), c.decision)).collect()
    }

    const MERGE_TODO: MergeOptions = MergeOptions {
        mode: UpdateMode::Merge,
        placeholder: PlaceholderMode::Todo,
        keep_foreign: false,
    };

    #[test]
    fn new_key_is_added_as_todo_placeholder() {
        let out = merge(&scanned(&[("GreetingText", "Hello")]), &EntrySet::new(), MERGE_TODO);
        assert_eq!(decisions(&out), vec![("GreetingText", MergeDecision::Added)]);
        let e = out.entries.get("GreetingText").unwrap();
        assert_eq!(e.translation.as_deref(), Some("TODO"));
        assert_eq!(e.provenance, Provenance::Placeholder);
    }

    #[test]
    fn human_translation_survives_source_change() {
        let old = existing(&[("Rule_Explanation", "Old rules", "已修正", Provenance::Translated)]);
        let new = scanned(&[("Rule_Explanation", "Completely new rules")]);
        let out = merge(&new, &old, MERGE_TODO);
        assert_eq!(decisions(&out), vec![("Rule_Explanation", MergeDecision::Unchanged)]);
        let e = out.entries.get("Rule_Explanation").unwrap();
        assert_eq!(e.translation.as_deref(), Some("已修正"));
        assert_eq!(e.provenance, Provenance::Translated);
        assert_eq!(e.source, "Completely new rules");
        assert!(e.fuzzy);
        assert!(out.changes[0].source_changed);
    }

    #[test]
    fn unknown_old_source_is_not_fuzzy() {
        let old = existing(&[("K", "", "переведено", Provenance::Translated)]);
        let out = merge(&scanned(&[("K", "Source")]), &old, MERGE_TODO);
        assert!(!out.entries.get("K").unwrap().fuzzy);
    }

    #[test]
    fn merging_identical_sets_keeps_translations_byte_identical() {
        let set = existing(&[
            ("A", "a", "  spaced &amp; <![CDATA[<b>]]> ", Provenance::Translated),
            ("B", "b", "TODO", Provenance::Placeholder),
        ]);
        let out = merge(&set, &set, MERGE_TODO);
        assert_eq!(out.entries.get("A"), set.get("A"));
        assert_eq!(
            decisions(&out),
            vec![("A", MergeDecision::Unchanged), ("B", MergeDecision::PlaceholderFilled)]
        );
    }

    #[test]
    fn placeholder_mode_switch_only_touches_placeholders() {
        let old = existing(&[
            ("A", "Apple", "TODO", Provenance::Placeholder),
            ("B", "Banana", "香蕉", Provenance::Translated),
        ]);
        let new = scanned(&[("A", "Apple"), ("B", "Banana")]);
        let opts = MergeOptions::new(UpdateMode::Merge, PlaceholderMode::Original);
        let out = merge(&new, &old, opts);
        assert_eq!(out.entries.get("A").unwrap().translation.as_deref(), Some("Apple"));
        assert_eq!(out.entries.get("B").unwrap().translation.as_deref(), Some("香蕉"));
    }

    #[test]
    fn stale_keys_are_retained_after_new_order() {
        let old = existing(&[
            ("Gone", "x", "旧", Provenance::Translated),
            ("Keep", "k", "留", Provenance::Translated),
        ]);
        let new = scanned(&[("Fresh", "f"), ("Keep", "k")]);
        let out = merge(&new, &old, MERGE_TODO);
        assert_eq!(
            decisions(&out),
            vec![
                ("Fresh", MergeDecision::Added),
                ("Keep", MergeDecision::Unchanged),
                ("Gone", MergeDecision::Removed),
            ]
        );
        assert!(out.changes[2].retained);
        assert_eq!(out.entries.keys().collect::<Vec<_>>(), vec!["Fresh", "Keep", "Gone"]);
        assert!(out.entries.get("Gone").unwrap().stale);
        let s = out.summary();
        assert_eq!((s.added, s.unchanged, s.removed, s.retained), (1, 1, 1, 1));
    }

    #[test]
    fn replace_regenerates_and_drops() {
        let old = existing(&[
            ("A", "a", "译", Provenance::Translated),
            ("Gone", "g", "旧", Provenance::Translated),
        ]);
        let new = scanned(&[("A", "a"), ("B", "b")]);
        let opts = MergeOptions::new(UpdateMode::Replace, PlaceholderMode::Todo);
        let first = merge(&new, &old, opts);
        assert_eq!(
            decisions(&first),
            vec![
                ("A", MergeDecision::PlaceholderFilled),
                ("B", MergeDecision::Added),
                ("Gone", MergeDecision::Removed),
            ]
        );
        assert!(!first.changes[2].retained);
        assert_eq!(first.entries.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(first.entries.iter().all(|e| e.translation.as_deref() == Some("TODO")));

        let second = merge(&new, &first.entries, opts);
        assert_eq!(second.entries, first.entries);
    }

    #[test]
    fn incoming_translation_replaces_placeholder() {
        let old = existing(&[("A", "a", "TODO", Provenance::Placeholder)]);
        let new = existing(&[("A", "a", "甲", Provenance::Translated)]);
        let out = merge(&new, &old, MERGE_TODO);
        assert_eq!(decisions(&out), vec![("A", MergeDecision::Retranslated)]);
        assert_eq!(out.entries.get("A").unwrap().translation.as_deref(), Some("甲"));
    }

    #[test]
    fn source_ending_in_dash_is_not_fuzzy_after_a_round_trip() {
        // the EN: comment stores "Range - " trimmed back to "Range -"
        let old = existing(&[("K", "Range -", "范围 -", Provenance::Translated)]);
        let out = merge(&scanned(&[("K", "Range -")]), &old, MERGE_TODO);
        assert!(!out.changes[0].source_changed);
        assert!(!out.entries.get("K").unwrap().fuzzy);

        let old = existing(&[("K", "a - - b", "甲乙", Provenance::Translated)]);
        let out = merge(&scanned(&[("K", "a -- b")]), &old, MERGE_TODO);
        assert!(!out.changes[0].source_changed);
    }

    #[test]
    fn shared_file_keeps_foreign_entries_in_replace_mode() {
        let old = existing(&[("Theirs", "t", "他们的", Provenance::Translated)]);
        let opts = MergeOptions {
            keep_foreign: true,
            ..MergeOptions::new(UpdateMode::Replace, PlaceholderMode::Todo)
        };
        let out = merge(&scanned(&[("Mine", "m")]), &old, opts);
        assert_eq!(out.entries.keys().collect::<Vec<_>>(), vec!["Theirs", "Mine"]);
        assert_eq!(out.entries.get("Theirs").unwrap().translation.as_deref(), Some("他们的"));
    }

    #[test]
    fn foreign_entries_are_kept_unmarked() {
        let old = existing(&[("Theirs", "t", "他们的", Provenance::Translated)]);
        let new = scanned(&[("Mine", "m")]);
        let opts = MergeOptions {
            keep_foreign: true,
            ..MERGE_TODO
        };
        let out = merge(&new, &old, opts);
        assert_eq!(
            decisions(&out),
            vec![("Mine", MergeDecision::Added), ("Theirs", MergeDecision::Unchanged)]
        );
        assert!(!out.entries.get("Theirs").unwrap().stale);
    }
}
