use std::path::{Path, PathBuf};

use roxmltree::Document;
use thiserror::Error;

/// Fields of `About/About.xml` the extractor cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModManifest {
    pub name: Option<String>,
    pub package_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest missing: {0}")]
    Missing(PathBuf),
    #[error("manifest malformed: {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}

/// Read `<root>/About/About.xml`. The document root must be `<ModMetaData>`.
pub fn read_manifest(mod_root: &Path) -> Result<ModManifest, ManifestError> {
    let path = mod_root.join("About").join("About.xml");
    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ManifestError::Missing(path))
        }
        Err(e) => {
            return Err(ManifestError::Malformed {
                path,
                reason: e.to_string(),
            })
        }
    };
    let doc = Document::parse(&text).map_err(|e| ManifestError::Malformed {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != "ModMetaData" {
        return Err(ManifestError::Malformed {
            path,
            reason: format!("root element is <{}>", root.tag_name().name()),
        });
    }
    let child_text = |tag: &str| {
        root.children()
            .find(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case(tag))
            .and_then(|n| n.text())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Ok(ModManifest {
        name: child_text("name"),
        package_id: child_text("packageId"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_about(root: &Path, body: &str) {
        fs::create_dir_all(root.join("About")).unwrap();
        fs::write(root.join("About/About.xml"), body).unwrap();
    }

    #[test]
    fn reads_name_and_package_id() {
        let dir = tempdir().unwrap();
        write_about(
            dir.path(),
            "<ModMetaData><name> Core Expanded </name><packageId>me.core</packageId></ModMetaData>",
        );
        let m = read_manifest(dir.path()).unwrap();
        assert_eq!(m.name.as_deref(), Some("Core Expanded"));
        assert_eq!(m.package_id.as_deref(), Some("me.core"));
    }

    #[test]
    fn missing_and_malformed_are_distinct() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_manifest(dir.path()),
            Err(ManifestError::Missing(_))
        ));
        write_about(dir.path(), "<ModMetaData><name>x</ModMetaData>");
        assert!(matches!(
            read_manifest(dir.path()),
            Err(ManifestError::Malformed { .. })
        ));
        write_about(dir.path(), "<Defs/>");
        assert!(matches!(
            read_manifest(dir.path()),
            Err(ManifestError::Malformed { .. })
        ));
    }
}
