use std::path::Path;

use rimsync_core::{Entry, EntrySet, ValueShape};
use roxmltree::{Document, Node};

use crate::{normalize_text, read_source, ParseError};

/// Entries of one def type found in a single Defs XML file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefsFile {
    pub def_type: String,
    pub entries: EntrySet,
}

/// Fixed inclusion rule for Defs fields: `label`, `description`, or any tag
/// containing `string` (`rulesStrings`, `gerundString`, ...).
pub fn should_extract_tag(tag: &str) -> bool {
    let lower = tag.to_ascii_lowercase();
    lower == "label" || lower == "description" || lower.contains("string")
}

pub fn scan_defs_file(path: &Path) -> Result<Vec<DefsFile>, ParseError> {
    let text = read_source(path)?;
    scan_defs_str(&text, path)
}

/// Extract translatable fields from a `<Defs>` document, grouped by def type
/// in order of first appearance. Keys are `defName.field.path`, list items
/// are addressed by their index.
pub fn scan_defs_str(xml: &str, path: &Path) -> Result<Vec<DefsFile>, ParseError> {
    let doc = Document::parse(xml).map_err(|e| ParseError::Xml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(ParseError::UnexpectedRoot {
            path: path.to_path_buf(),
            expected: "Defs",
            found: root.tag_name().name().to_string(),
        });
    }

    let mut out: Vec<DefsFile> = Vec::new();
    for def in root.children().filter(|n| n.is_element()) {
        let def_type = def.tag_name().name();
        let def_name = def
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == "defName")
            .and_then(|n| n.text())
            .map(str::trim)
            .unwrap_or("");
        if def_name.is_empty() {
            continue;
        }
        let idx = match out.iter().position(|f| f.def_type == def_type) {
            Some(i) => i,
            None => {
                out.push(DefsFile {
                    def_type: def_type.to_string(),
                    entries: EntrySet::new(),
                });
                out.len() - 1
            }
        };
        collect_fields(def, def_name, &mut out[idx].entries, path);
    }
    out.retain(|f| !f.entries.is_empty());
    Ok(out)
}

fn collect_fields(node: Node, prefix: &str, set: &mut EntrySet, path: &Path) {
    let mut li_index = 0usize;
    for child in node.children().filter(|n| n.is_element()) {
        let tag = child.tag_name().name();
        let segment = if tag == "li" {
            li_index += 1;
            (li_index - 1).to_string()
        } else {
            tag.to_string()
        };
        let key = format!("{prefix}.{segment}");

        if should_extract_tag(tag) {
            let elements: Vec<Node> = child.children().filter(|n| n.is_element()).collect();
            if elements.is_empty() {
                let text = normalize_text(&direct_text(child));
                if !text.is_empty() {
                    push_entry(set, Entry::original(&key, text, ValueShape::Text), path);
                }
                continue;
            }
            if elements.iter().all(|n| n.tag_name().name() == "li") {
                let items: Vec<String> = elements
                    .iter()
                    .map(|li| normalize_text(&direct_text(*li)).replace('\n', " "))
                    .filter(|s| !s.is_empty())
                    .collect();
                if !items.is_empty() {
                    push_entry(
                        set,
                        Entry::original(&key, items.join("\n"), ValueShape::List),
                        path,
                    );
                }
                continue;
            }
        }
        collect_fields(child, &key, set, path);
    }
}

fn direct_text(node: Node) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn push_entry(set: &mut EntrySet, entry: Entry, path: &Path) {
    let key = entry.key.clone();
    if !set.insert(entry) {
        tracing::warn!(event = "defs_duplicate_key", key = %key, path = %path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WEAPONS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Defs>
  <ThingDef ParentName="BaseWeapon">
    <defName>Weapon_Bow</defName>
    <label>bow</label>
    <description>
      A simple bow.
      Shoots arrows.
    </description>
    <graphicPath>Things/Bow</graphicPath>
    <verbs>
      <li>
        <label>shoot</label>
        <range>20</range>
      </li>
    </verbs>
  </ThingDef>
  <ThingDef Name="AbstractBase" Abstract="True">
    <label>never extracted</label>
  </ThingDef>
  <RulePackDef>
    <defName>Rules_Bow</defName>
    <rulePack>
      <rulesStrings>
        <li>r_name->Bow</li>
        <li>r_name->Longbow</li>
      </rulesStrings>
    </rulePack>
  </RulePackDef>
</Defs>"#;

    #[test]
    fn groups_by_def_type_with_field_paths() {
        let files = scan_defs_str(WEAPONS, Path::new("Weapons.xml")).unwrap();
        assert_eq!(
            files.iter().map(|f| f.def_type.as_str()).collect::<Vec<_>>(),
            vec!["ThingDef", "RulePackDef"]
        );
        let things = &files[0].entries;
        assert_eq!(
            things.keys().collect::<Vec<_>>(),
            vec![
                "Weapon_Bow.label",
                "Weapon_Bow.description",
                "Weapon_Bow.verbs.0.label"
            ]
        );
        assert_eq!(
            things.get("Weapon_Bow.description").unwrap().source,
            "A simple bow.\nShoots arrows."
        );
    }

    #[test]
    fn li_only_string_fields_become_lists() {
        let files = scan_defs_str(WEAPONS, Path::new("Weapons.xml")).unwrap();
        let rules = files[1]
            .entries
            .get("Rules_Bow.rulePack.rulesStrings")
            .unwrap();
        assert_eq!(rules.shape, ValueShape::List);
        assert_eq!(rules.source, "r_name->Bow\nr_name->Longbow");
    }

    #[test]
    fn rejects_non_defs_root() {
        let err = scan_defs_str("<LanguageData/>", Path::new("x.xml")).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedRoot { .. }));
        let err = scan_defs_str("<Defs><ThingDef>", Path::new("x.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }));
    }

    #[test]
    fn tag_rule() {
        assert!(should_extract_tag("label"));
        assert!(should_extract_tag("Description"));
        assert!(should_extract_tag("gerundString"));
        assert!(should_extract_tag("rulesStrings"));
        assert!(!should_extract_tag("labelNoun"));
        assert!(!should_extract_tag("graphicPath"));
    }
}
