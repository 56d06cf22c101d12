use std::path::Path;

use rimsync_core::{ConflictChoice, NamingOption, PlaceholderMode, UpdateMode};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "rimsync.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RimSyncConfig {
    pub mods_root: Option<String>,
    /// Output language code or RimWorld language folder name.
    pub lang: Option<String>,
    pub extract: Option<ExtractCfg>,
    pub log: Option<LogCfg>,
    pub schema: Option<SchemaCfg>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractCfg {
    pub placeholder: Option<PlaceholderMode>,
    pub naming: Option<NamingOption>,
    pub update_mode: Option<UpdateMode>,
    /// Fixed answer for every conflict instead of prompting.
    pub on_conflict: Option<ConflictChoice>,
    pub abort_on_error: Option<bool>,
    pub migrate_legacy: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogCfg {
    /// Log every file created or merged at info level.
    pub detailed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaCfg {
    pub out_dir: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Search order: `./rimsync.toml`, then `<config dir>/rimsync/rimsync.toml`.
/// Values found first win; unreadable files are ignored, invalid ones are
/// reported.
pub fn load_config() -> Result<RimSyncConfig, ConfigError> {
    let mut merged = RimSyncConfig::default();
    if let Ok(p) = std::env::current_dir() {
        if let Some(cfg) = read_config(&p.join(CONFIG_FILE))? {
            merged = merge(merged, cfg);
        }
    }
    if let Some(base) = dirs::config_dir() {
        if let Some(cfg) = read_config(&base.join("rimsync").join(CONFIG_FILE))? {
            merged = merge(merged, cfg);
        }
    }
    Ok(merged)
}

pub fn read_config(path: &Path) -> Result<Option<RimSyncConfig>, ConfigError> {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Ok(None);
    };
    toml::from_str::<RimSyncConfig>(&s)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
}

fn merge(mut a: RimSyncConfig, b: RimSyncConfig) -> RimSyncConfig {
    if a.mods_root.is_none() {
        a.mods_root = b.mods_root;
    }
    if a.lang.is_none() {
        a.lang = b.lang;
    }
    a.extract = merge_opt(a.extract, b.extract, merge_extract);
    a.log = merge_opt(a.log, b.log, merge_log);
    a.schema = merge_opt(a.schema, b.schema, merge_schema);
    a
}

fn merge_opt<T: Default>(a: Option<T>, b: Option<T>, f: fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(f(a, b)),
        (None, Some(b)) => Some(b),
        (Some(a), None) => Some(a),
        (None, None) => None,
    }
}

fn merge_extract(mut a: ExtractCfg, b: ExtractCfg) -> ExtractCfg {
    if a.placeholder.is_none() {
        a.placeholder = b.placeholder;
    }
    if a.naming.is_none() {
        a.naming = b.naming;
    }
    if a.update_mode.is_none() {
        a.update_mode = b.update_mode;
    }
    if a.on_conflict.is_none() {
        a.on_conflict = b.on_conflict;
    }
    if a.abort_on_error.is_none() {
        a.abort_on_error = b.abort_on_error;
    }
    if a.migrate_legacy.is_none() {
        a.migrate_legacy = b.migrate_legacy;
    }
    a
}

fn merge_log(mut a: LogCfg, b: LogCfg) -> LogCfg {
    if a.detailed.is_none() {
        a.detailed = b.detailed;
    }
    a
}

fn merge_schema(mut a: SchemaCfg, b: SchemaCfg) -> SchemaCfg {
    if a.out_dir.is_none() {
        a.out_dir = b.out_dir;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_typed_options() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
mods_root = "/games/RimWorld/Mods"
lang = "zh-TW"

[extract]
placeholder = "original"
naming = "suffix"
update_mode = "replace"
on_conflict = "skip"

[log]
detailed = true
"#,
        )
        .unwrap();
        let cfg = read_config(&path).unwrap().unwrap();
        let ex = cfg.extract.unwrap();
        assert_eq!(ex.placeholder, Some(PlaceholderMode::Original));
        assert_eq!(ex.naming, Some(NamingOption::Suffix));
        assert_eq!(ex.update_mode, Some(UpdateMode::Replace));
        assert_eq!(ex.on_conflict, Some(ConflictChoice::Skip));
        assert_eq!(cfg.log.and_then(|l| l.detailed), Some(true));
        assert_eq!(cfg.lang.as_deref(), Some("zh-TW"));
    }

    #[test]
    fn invalid_values_are_reported_and_missing_files_ignored() {
        let dir = tempdir().unwrap();
        assert!(read_config(&dir.path().join("none.toml")).unwrap().is_none());
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[extract]\nnaming = \"sideways\"\n").unwrap();
        assert!(read_config(&path).is_err());
    }

    #[test]
    fn first_source_wins_per_field() {
        let a = RimSyncConfig {
            lang: Some("ru".into()),
            extract: Some(ExtractCfg {
                naming: Some(NamingOption::Prefix),
                ..Default::default()
            }),
            ..Default::default()
        };
        let b = RimSyncConfig {
            lang: Some("de".into()),
            mods_root: Some("/mods".into()),
            extract: Some(ExtractCfg {
                naming: Some(NamingOption::Suffix),
                abort_on_error: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let m = merge(a, b);
        assert_eq!(m.lang.as_deref(), Some("ru"));
        assert_eq!(m.mods_root.as_deref(), Some("/mods"));
        let ex = m.extract.unwrap();
        assert_eq!(ex.naming, Some(NamingOption::Prefix));
        assert_eq!(ex.abort_on_error, Some(true));
    }
}
