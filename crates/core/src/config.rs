use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub home: HomeConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeConfig {
    /// Root used when no `defaultDir` setting exists yet.
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default = "default_tags_dir")]
    pub tags_dir: String,
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Pin the today directory to a fixed `YYYY-MM-DD` instead of the current UTC date.
    #[serde(default)]
    pub date: Option<String>,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            root: None,
            tags_dir: default_tags_dir(),
            extension: default_extension(),
            date: None,
        }
    }
}

/// Name collisions in the today directory. `Overwrite` applies to renames
/// only; opening a file never replaces an existing note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Overwrite,
    Rename,
    Skip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesConfig {
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_tags_dir() -> String {
    "tags".to_string()
}

fn default_extension() -> String {
    "md".to_string()
}

pub fn default_database_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("homespace")
        .join("homespace.db")
        .to_string_lossy()
        .into_owned()
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings =
        config::Config::builder().set_default("database.path", default_database_path())?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("HOMESPACE")
            .prefix_separator("_")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn explicit_config_path_must_exist() {
        assert!(load(Some("no-such-homespace-config")).is_err());
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[database]\npath = \"/tmp/hs.db\"").unwrap();
        let cfg = load(Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(cfg.database.path, "/tmp/hs.db");
        assert_eq!(cfg.home.tags_dir, "tags");
        assert_eq!(cfg.home.extension, "md");
        assert_eq!(cfg.notes.conflict, ConflictPolicy::Overwrite);
        assert!(cfg.scan.exclude.is_empty());
    }

    #[test]
    fn reads_conflict_policy_and_excludes() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[home]\nroot = \"/tmp/hs\"\ndate = \"2024-01-01\"\n[notes]\nconflict = \"rename\"\n[scan]\nexclude = [\"*.swp\"]"
        )
        .unwrap();
        let cfg = load(Some(&file.path().to_string_lossy())).unwrap();
        assert_eq!(cfg.home.root.as_deref(), Some("/tmp/hs"));
        assert_eq!(cfg.home.date.as_deref(), Some("2024-01-01"));
        assert_eq!(cfg.notes.conflict, ConflictPolicy::Rename);
        assert_eq!(cfg.scan.exclude, vec!["*.swp".to_string()]);
        assert!(!cfg.database.path.is_empty());
    }
}
