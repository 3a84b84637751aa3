//! Deployment configuration
//!
//! Backend selection and connection parameters live in
//! `agriconnect.toml`, never in compiled-in constants. Missing fields
//! fall back to an embedded database under `.agriconnect/`.

use crate::backend::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgriConfig {
    /// "remote" | "embedded" | "ephemeral"
    pub backend: Option<String>,
    /// Base URL of the platform API (remote backend)
    pub api_url: Option<String>,
    /// Database file path (embedded backend)
    pub database: Option<String>,
}

impl AgriConfig {
    pub fn backend_kind(&self) -> crate::Result<BackendKind> {
        match &self.backend {
            Some(kind) => BackendKind::from_str(kind),
            None => Ok(BackendKind::Embedded),
        }
    }

    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(Path::new(".")))
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("agriconnect.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".agriconnect").join("agriconnect.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AgriConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AgriConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AgriConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_select_embedded() {
        let config = AgriConfig::default();
        assert_eq!(config.backend_kind().unwrap(), BackendKind::Embedded);
        assert_eq!(config.api_url(), DEFAULT_API_URL);
        assert!(config.database_path().ends_with(".agriconnect/agriconnect.db"));
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agriconnect.toml");

        let config = AgriConfig {
            backend: Some("remote".to_string()),
            api_url: Some("http://db.internal:3001/api".to_string()),
            database: None,
        };
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.backend_kind().unwrap(), BackendKind::Remote);
        assert_eq!(loaded.api_url(), "http://db.internal:3001/api");
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agriconnect.toml");
        write_config(&path, &AgriConfig::default(), false).unwrap();
        assert!(write_config(&path, &AgriConfig::default(), false).is_err());
        write_config(&path, &AgriConfig::default(), true).unwrap();
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("nope.toml"))).unwrap();
        assert!(loaded.is_none());
    }
}
