use std::path::Path;

use rimsync_core::{Entry, EntrySet, ValueShape};
use roxmltree::Document;

use crate::{normalize_text, read_source, ParseError};

pub fn scan_keyed_file(path: &Path) -> Result<EntrySet, ParseError> {
    let text = read_source(path)?;
    scan_keyed_str(&text, path)
}

/// Every direct child of `<LanguageData>` is one entry keyed by its tag.
pub fn scan_keyed_str(xml: &str, path: &Path) -> Result<EntrySet, ParseError> {
    let doc = Document::parse(xml).map_err(|e| ParseError::Xml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "LanguageData" {
        return Err(ParseError::UnexpectedRoot {
            path: path.to_path_buf(),
            expected: "LanguageData",
            found: root.tag_name().name().to_string(),
        });
    }
    let mut set = EntrySet::new();
    for node in root.children().filter(|n| n.is_element()) {
        let key = node.tag_name().name();
        let items: Vec<_> = node.children().filter(|n| n.is_element()).collect();
        let entry = if !items.is_empty() && items.iter().all(|n| n.tag_name().name() == "li") {
            let source = items
                .iter()
                .filter_map(|li| li.text())
                .map(normalize_text)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n");
            Entry::original(key, source, ValueShape::List)
        } else {
            let text: String = node
                .children()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            Entry::original(key, normalize_text(&text), ValueShape::Text)
        };
        if !set.insert(entry) {
            tracing::warn!(event = "keyed_duplicate_key", key = key, path = %path.display());
        }
    }
    Ok(set)
}
