use std::path::Path;

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;
use rimsync_core::{Entry, EntrySet, PlaceholderMode, Provenance, ValueShape, PLACEHOLDER_TOKEN};

use crate::{
    normalize_text, render_source, strip_bom, ParseError, MARKER_FUZZY, MARKER_UNTRANSLATED,
    MARKER_UNUSED, OWNER_PREFIX,
};

/// Contents of an existing translation file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedFile {
    pub entries: EntrySet,
    /// Owner ids from the `rimsync:owner` comment; empty for foreign files.
    pub owners: Vec<String>,
    pub existed: bool,
}

/// Load a `LanguageData` file. A missing file is an empty, non-existing set.
///
/// `convention` is the placeholder mode in effect: besides the `TODO` token,
/// a value equal to the rendered English source counts as a placeholder when
/// the entry carries the `UNTRANSLATED` marker or the mode is `Original`.
pub fn load_language_file(path: &Path, convention: PlaceholderMode) -> Result<LoadedFile, ParseError> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadedFile::default()),
        Err(source) => {
            return Err(ParseError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut loaded = parse_language_data(&text, path, convention)?;
    loaded.existed = true;
    Ok(loaded)
}

#[derive(Default)]
struct Pending {
    source: Option<String>,
    untranslated: bool,
    fuzzy: bool,
    unused: bool,
}

pub fn parse_language_data(
    xml: &str,
    path: &Path,
    convention: PlaceholderMode,
) -> Result<LoadedFile, ParseError> {
    let xml_err = |message: String| ParseError::Xml {
        path: path.to_path_buf(),
        message,
    };
    // quick-xml skips a BOM, which would shift every span below
    let xml = strip_bom(xml);
    let mut reader = Reader::from_str(xml);
    let mut out = LoadedFile::default();
    let mut pending = Pending::default();
    let mut inside_root = false;
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| xml_err(format!("{e} at byte {}", reader.error_position())))?;
        let is_start = matches!(event, Event::Start(_));
        match event {
            Event::Start(e) | Event::Empty(e) if !seen_root => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name != "LanguageData" {
                    return Err(ParseError::UnexpectedRoot {
                        path: path.to_path_buf(),
                        expected: "LanguageData",
                        found: name,
                    });
                }
                seen_root = true;
                inside_root = is_start;
            }
            Event::Start(e) if inside_root => {
                let name = e.name().as_ref().to_vec();
                let span = reader
                    .read_to_end(QName(&name))
                    .map_err(|e| xml_err(format!("{e} at byte {}", reader.error_position())))?;
                let raw = &xml[span.start as usize..span.end as usize];
                let key = String::from_utf8_lossy(&name).into_owned();
                push_entry(&mut out, key, raw, std::mem::take(&mut pending), convention, path);
            }
            Event::Empty(e) if inside_root => {
                let key = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                push_entry(&mut out, key, "", std::mem::take(&mut pending), convention, path);
            }
            Event::End(_) if inside_root => inside_root = false,
            Event::Comment(c) if inside_root => {
                let text = String::from_utf8_lossy(c.as_ref()).into_owned();
                apply_comment(&text, &mut pending, &mut out.owners);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !seen_root {
        return Err(xml_err("no root element".to_string()));
    }
    Ok(out)
}

fn apply_comment(text: &str, pending: &mut Pending, owners: &mut Vec<String>) {
    let t = text.trim();
    if t == MARKER_UNTRANSLATED {
        pending.untranslated = true;
    } else if t == MARKER_FUZZY {
        pending.fuzzy = true;
    } else if t == MARKER_UNUSED {
        pending.unused = true;
    } else if let Some(rest) = t.strip_prefix(OWNER_PREFIX) {
        for id in rest.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            if !owners.iter().any(|o| o == id) {
                owners.push(id.to_string());
            }
        }
    } else if let Some(rest) = t.strip_prefix("EN:") {
        pending.source = Some(normalize_text(rest));
    }
}

fn push_entry(
    out: &mut LoadedFile,
    key: String,
    raw: &str,
    pending: Pending,
    convention: PlaceholderMode,
    path: &Path,
) {
    let shape = if raw.trim_start().starts_with("<li") {
        ValueShape::List
    } else {
        ValueShape::Text
    };
    let source = pending.source.unwrap_or_default();
    let provenance = classify(raw, &source, shape, pending.untranslated, convention);
    let mut entry = Entry::original(key, source, shape).with_translation(raw, provenance);
    entry.stale = pending.unused;
    entry.fuzzy = pending.fuzzy;
    let key = entry.key.clone();
    if !out.entries.insert(entry) {
        tracing::warn!(event = "translation_duplicate_key", key = %key, path = %path.display());
    }
}

fn classify(
    raw: &str,
    source: &str,
    shape: ValueShape,
    marked: bool,
    convention: PlaceholderMode,
) -> Provenance {
    if raw.trim() == PLACEHOLDER_TOKEN {
        return Provenance::Placeholder;
    }
    let copies_source = !source.is_empty()
        && normalize_text(raw) == normalize_text(&render_source(source, shape));
    if copies_source && (marked || convention == PlaceholderMode::Original) {
        Provenance::Placeholder
    } else {
        Provenance::Translated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const EXISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<LanguageData>
  <!-- rimsync:owner MyMod:Keyed/Misc.xml; MyMod/Extra:Keyed/Misc.xml -->

  <!-- EN: Hello -->
  <!-- UNTRANSLATED -->
  <GreetingText>TODO</GreetingText>

  <!-- EN: Rules apply -->
  <Rule_Explanation>已修正</Rule_Explanation>

  <!-- EN: Copy me -->
  <!-- UNTRANSLATED -->
  <Copied>Copy me</Copied>

  <!-- EN: Same as English -->
  <KeptEnglish>Same as English</KeptEnglish>

  <!-- EN: Gone -->
  <!-- UNUSED -->
  <Old>旧的</Old>

  <!-- FUZZY -->
  <Spaced>  keeps  &amp; <![CDATA[<b>raw</b>]]>  </Spaced>
  <Empty/>
</LanguageData>
"#;

    fn parse(mode: PlaceholderMode) -> LoadedFile {
        parse_language_data(EXISTING, Path::new("Misc.xml"), mode).unwrap()
    }

    #[test]
    fn provenance_from_token_and_marker() {
        let f = parse(PlaceholderMode::Todo);
        let prov = |k: &str| f.entries.get(k).unwrap().provenance;
        assert_eq!(prov("GreetingText"), Provenance::Placeholder);
        assert_eq!(prov("Rule_Explanation"), Provenance::Translated);
        assert_eq!(prov("Copied"), Provenance::Placeholder);
        assert_eq!(prov("KeptEnglish"), Provenance::Translated);
        assert_eq!(prov("Empty"), Provenance::Translated);
    }

    #[test]
    fn original_convention_treats_source_copies_as_placeholders() {
        let f = parse(PlaceholderMode::Original);
        assert_eq!(
            f.entries.get("KeptEnglish").unwrap().provenance,
            Provenance::Placeholder
        );
    }

    #[test]
    fn raw_values_round_trip_verbatim() {
        let f = parse(PlaceholderMode::Todo);
        assert_eq!(
            f.entries.get("Spaced").unwrap().translation.as_deref(),
            Some("  keeps  &amp; <![CDATA[<b>raw</b>]]>  ")
        );
        assert_eq!(f.entries.get("Rule_Explanation").unwrap().source, "Rules apply");
    }

    #[test]
    fn markers_and_owners() {
        let f = parse(PlaceholderMode::Todo);
        assert!(f.entries.get("Old").unwrap().stale);
        assert!(f.entries.get("Spaced").unwrap().fuzzy);
        assert!(!f.entries.get("Rule_Explanation").unwrap().fuzzy);
        assert_eq!(
            f.owners,
            vec!["MyMod:Keyed/Misc.xml", "MyMod/Extra:Keyed/Misc.xml"]
        );
    }

    #[test]
    fn list_values_are_detected() {
        let xml = "<LanguageData>\n  <R.rulesStrings>\n    <li>a</li>\n  </R.rulesStrings>\n</LanguageData>";
        let f = parse_language_data(xml, Path::new("r.xml"), PlaceholderMode::Todo).unwrap();
        assert_eq!(f.entries.get("R.rulesStrings").unwrap().shape, ValueShape::List);
    }

    #[test]
    fn byte_order_mark_does_not_shift_values() {
        let xml = "\u{FEFF}<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<LanguageData>\n  <Greeting>你好世界</Greeting>\n  <K>ééé</K>\n</LanguageData>\n";
        let f = parse_language_data(xml, Path::new("bom.xml"), PlaceholderMode::Todo).unwrap();
        assert_eq!(f.entries.get("Greeting").unwrap().translation.as_deref(), Some("你好世界"));
        assert_eq!(f.entries.get("K").unwrap().translation.as_deref(), Some("ééé"));

        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.xml");
        std::fs::write(&path, "\u{FEFF}<LanguageData><K>ééé</K></LanguageData>").unwrap();
        let loaded = load_language_file(&path, PlaceholderMode::Todo).unwrap();
        assert_eq!(loaded.entries.get("K").unwrap().translation.as_deref(), Some("ééé"));
    }

    #[test]
    fn missing_file_is_empty_and_malformed_is_error() {
        let dir = tempdir().unwrap();
        let missing = load_language_file(&dir.path().join("nope.xml"), PlaceholderMode::Todo).unwrap();
        assert!(!missing.existed);
        assert!(missing.entries.is_empty());

        let bad = dir.path().join("bad.xml");
        std::fs::write(&bad, "<LanguageData><A>x").unwrap();
        assert!(matches!(
            load_language_file(&bad, PlaceholderMode::Todo),
            Err(ParseError::Xml { .. })
        ));

        let wrong = dir.path().join("wrong.xml");
        std::fs::write(&wrong, "<Defs/>").unwrap();
        assert!(matches!(
            load_language_file(&wrong, PlaceholderMode::Todo),
            Err(ParseError::UnexpectedRoot { .. })
        ));
    }
}
