use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Translation category of a logical file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Strings injected into Defs of one type (`DefInjected/<def_type>/`).
    DefInjected { def_type: String },
    /// Flat key/value string table (`Keyed/`).
    Keyed,
}

impl Category {
    pub fn kind(&self) -> CategoryKind {
        match self {
            Category::DefInjected { .. } => CategoryKind::DefInjected,
            Category::Keyed => CategoryKind::Keyed,
        }
    }

    /// Directory of this category below `Languages/<lang>/`.
    pub fn rel_dir(&self) -> PathBuf {
        match self {
            Category::DefInjected { def_type } => Path::new("DefInjected").join(def_type),
            Category::Keyed => PathBuf::from("Keyed"),
        }
    }
}

/// Category without payload; used as the conflict category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryKind {
    DefInjected,
    Keyed,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::DefInjected => "DefInjected",
            CategoryKind::Keyed => "Keyed",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A nested content package shipped inside a mod (`Mods/<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmoduleRef {
    pub id: String,
    pub root: PathBuf,
}

/// One unit of translation output: mod × submodule × category × file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogicalFile {
    pub mod_id: String,
    pub submodule: Option<SubmoduleRef>,
    pub category: Category,
    /// File path relative to the category directory (e.g. `Weapons.xml`).
    pub rel_path: PathBuf,
    /// Source XML the entries are extracted from.
    pub source_path: PathBuf,
}

impl LogicalFile {
    pub fn submodule_id(&self) -> Option<&str> {
        self.submodule.as_ref().map(|s| s.id.as_str())
    }

    /// Stable identity recorded in output files to tell owners apart,
    /// e.g. `MyMod/Balance:DefInjected/ThingDef/Weapons.xml`.
    pub fn owner_id(&self) -> String {
        let mut id = self.mod_id.clone();
        if let Some(sub) = self.submodule_id() {
            id.push('/');
            id.push_str(sub);
        }
        let rel = self.category.rel_dir().join(&self.rel_path);
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        // owner ids go into XML comments and a `;`-separated list
        format!("{id}:{rel}").replace("--", "-").replace(';', ",")
    }
}

impl fmt::Display for LogicalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.owner_id())
    }
}
