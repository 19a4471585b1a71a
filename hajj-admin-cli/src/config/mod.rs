//! Configuration: `config.toml`, `.env` and environment overrides
//!
//! Precedence, lowest first: built-in defaults, the config file,
//! `BACKEND_URL` / `BACKEND_URL_ADMIN`, then command-line flags.

pub mod credentials;

pub use credentials::SqliteCredentialStore;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::schema::{EntitySchema, EnumOption, find_schema};

pub const APP_NAME: &str = "hajj-admin-cli";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
const CONFIG_FILE: &str = "config.toml";
const DATABASE_FILE: &str = "hajj-admin.db";

/// Allowed values that are deployment data rather than code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnumOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambulance_categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    /// Defaults to `<backend_url>/admin`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_url: Option<String>,
    /// Defaults to `hajj-admin.db` next to the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    pub enums: EnumOverrides,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            admin_url: None,
            database_path: None,
            enums: EnumOverrides::default(),
        }
    }
}

impl Config {
    /// `<config_dir>/hajj-admin-cli`
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine the configuration directory")?;
        Ok(dir.join(APP_NAME))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load the config file (writing defaults on first use) and apply the environment
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            let config = Self::default();
            if let Err(e) = config.save_to(&path) {
                warn!("Could not write default config to {}: {:#}", path.display(), e);
            }
            config
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Apply `BACKEND_URL` and `BACKEND_URL_ADMIN`
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("BACKEND_URL").filter(|v| !v.trim().is_empty()) {
            debug!("BACKEND_URL overrides backend_url");
            self.backend_url = url;
        }
        if let Some(url) = var("BACKEND_URL_ADMIN").filter(|v| !v.trim().is_empty()) {
            debug!("BACKEND_URL_ADMIN overrides admin_url");
            self.admin_url = Some(url);
        }
    }

    pub fn backend_url(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    pub fn admin_url(&self) -> String {
        match &self.admin_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/admin", self.backend_url()),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::config_dir()?.join(DATABASE_FILE)),
        }
    }

    /// Built-in schema with this deployment's enum overrides applied
    pub fn schema(&self, name: &str) -> Option<EntitySchema> {
        let mut schema = find_schema(name)?.clone();
        if schema.key == "ambulance"
            && let Some(values) = &self.enums.ambulance_categories
            && !values.is_empty()
        {
            let options = values.iter().map(|v| EnumOption::plain(v.clone())).collect();
            schema.override_enum("category", options);
        }
        Some(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnRule, FieldKind};

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.backend_url(), "http://localhost:5000");
        assert_eq!(config.admin_url(), "http://localhost:5000/admin");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config: Config = toml::from_str(r#"backend_url = "https://api.example.org/""#).unwrap();
        assert_eq!(config.admin_url(), "https://api.example.org/admin");

        config.apply_env(|key| match key {
            "BACKEND_URL" => Some("https://staging.example.org".into()),
            "BACKEND_URL_ADMIN" => Some("https://staging.example.org/api/admin/".into()),
            _ => None,
        });
        assert_eq!(config.backend_url(), "https://staging.example.org");
        assert_eq!(config.admin_url(), "https://staging.example.org/api/admin");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let mut config = Config::default();
        config.enums.ambulance_categories = Some(vec!["bls".into(), "als".into()]);
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_ambulance_category_override() {
        let config: Config = toml::from_str(
            r#"
            [enums]
            ambulance_categories = ["bls", "als"]
            "#,
        )
        .unwrap();
        let schema = config.schema("ambulance").unwrap();

        let Some(FieldKind::Enum(options)) = schema.field_kind("category") else {
            panic!("category should stay an enum");
        };
        assert_eq!(options.len(), 2);
        let rule = &schema.import.as_ref().unwrap().columns[0].rule;
        assert_eq!(rule, &ColumnRule::Enum(vec!["bls".into(), "als".into()]));

        // Other entities are untouched
        assert_eq!(config.schema("clinic"), find_schema("clinic").cloned());
    }
}
