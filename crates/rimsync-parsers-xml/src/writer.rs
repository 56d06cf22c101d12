use std::io::Write;
use std::path::{Path, PathBuf};

use rimsync_core::{EntrySet, Provenance};
use thiserror::Error;

use crate::{comment_safe, MARKER_FUZZY, MARKER_UNTRANSLATED, MARKER_UNUSED, OWNER_PREFIX};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Serialize entries as a RimWorld `LanguageData` document.
///
/// Each entry is preceded by its English source in an `EN:` comment and by
/// one marker per state (`UNTRANSLATED`, `FUZZY`, `UNUSED`). Translated
/// values are written exactly as stored.
pub fn render_language_file(entries: &EntrySet, owners: &[String]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<LanguageData>\n");
    if !owners.is_empty() {
        out.push_str(&format!(
            "  <!-- {OWNER_PREFIX} {} -->\n",
            comment_safe(&owners.join(";"))
        ));
    }
    for entry in entries.iter() {
        out.push('\n');
        let source = comment_safe(&entry.source);
        if source.contains('\n') {
            out.push_str("  <!-- EN:\n");
            for line in source.lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            out.push_str("  -->\n");
        } else if !source.is_empty() {
            out.push_str(&format!("  <!-- EN: {source} -->\n"));
        }
        if entry.provenance != Provenance::Translated {
            out.push_str(&format!("  <!-- {MARKER_UNTRANSLATED} -->\n"));
        }
        if entry.fuzzy {
            out.push_str(&format!("  <!-- {MARKER_FUZZY} -->\n"));
        }
        if entry.stale {
            out.push_str(&format!("  <!-- {MARKER_UNUSED} -->\n"));
        }
        let value = entry.translation.as_deref().unwrap_or("");
        out.push_str(&format!("  <{key}>{value}</{key}>\n", key = entry.key));
    }
    out.push_str("\n</LanguageData>\n");
    out
}

/// Render and atomically replace `path`, creating parent directories.
pub fn write_language_file(path: &Path, entries: &EntrySet, owners: &[String]) -> Result<(), WriteError> {
    write_atomic(path, &render_language_file(entries, owners))?;
    tracing::debug!(event = "language_file_written", path = %path.display(), entries = entries.len());
    Ok(())
}

/// Write through a temp file in the same directory, then rename over `path`.
pub fn write_atomic(path: &Path, body: &str) -> Result<(), WriteError> {
    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(io_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    tmp.write_all(body.as_bytes()).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{load_language_file, parse_language_data};
    use pretty_assertions::assert_eq;
    use rimsync_core::{Entry, PlaceholderMode, ValueShape};
    use tempfile::tempdir;

    fn sample() -> EntrySet {
        let mut set = EntrySet::new();
        set.insert(
            Entry::original("GreetingText", "Hello", ValueShape::Text)
                .with_translation("TODO", Provenance::Placeholder),
        );
        let mut kept = Entry::original("Rule_Explanation", "Rules -- apply", ValueShape::Text)
            .with_translation("已修正", Provenance::Translated);
        kept.fuzzy = true;
        set.insert(kept);
        set
    }

    #[test]
    fn renders_markers_and_comments() {
        let text = render_language_file(&sample(), &["MyMod:Keyed/Misc.xml".to_string()]);
        let expected = "<?xml version=\"1.0\" encoding=\"utf-8\"?>
<LanguageData>
  <!-- rimsync:owner MyMod:Keyed/Misc.xml -->

  <!-- EN: Hello -->
  <!-- UNTRANSLATED -->
  <GreetingText>TODO</GreetingText>

  <!-- EN: Rules - - apply -->
  <!-- FUZZY -->
  <Rule_Explanation>已修正</Rule_Explanation>

</LanguageData>
";
        assert_eq!(text, expected);
    }

    #[test]
    fn multi_line_sources_use_block_comments() {
        let mut set = EntrySet::new();
        set.insert(
            Entry::original("D.description", "one\ntwo", ValueShape::Text)
                .with_translation("\n    one\n    two\n  ", Provenance::Placeholder),
        );
        let text = render_language_file(&set, &[]);
        assert!(text.contains("  <!-- EN:\n    one\n    two\n  -->\n"), "{text}");
        let back = parse_language_data(&text, Path::new("x.xml"), PlaceholderMode::Original).unwrap();
        let e = back.entries.get("D.description").unwrap();
        assert_eq!(e.source, "one\ntwo");
        assert_eq!(e.provenance, Provenance::Placeholder);
    }

    #[test]
    fn written_file_loads_back_identically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Languages/ChineseTraditional/Keyed/Misc.xml");
        let owners = vec!["MyMod:Keyed/Misc.xml".to_string()];
        write_language_file(&path, &sample(), &owners).unwrap();

        let loaded = load_language_file(&path, PlaceholderMode::Todo).unwrap();
        assert!(loaded.existed);
        assert_eq!(loaded.owners, owners);
        let kept = loaded.entries.get("Rule_Explanation").unwrap();
        assert_eq!(kept.translation.as_deref(), Some("已修正"));
        assert_eq!(kept.provenance, Provenance::Translated);
        assert!(kept.fuzzy);
        assert_eq!(
            loaded.entries.get("GreetingText").unwrap().provenance,
            Provenance::Placeholder
        );

        // a second write of the loaded set is byte-identical
        let first = std::fs::read_to_string(&path).unwrap();
        write_language_file(&path, &loaded.entries, &loaded.owners).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
    }
}
