use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoreConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `"stdio"` or `"http"`.
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of lorebook JSON files; one file per scope.
    pub lore_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_calls: usize,
    pub max_result_tokens: usize,
    pub max_planning_time_ms: u64,
    pub max_injected_entries: usize,
    pub context_token_budget: usize,
    pub default_search_limit: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let lore_dir = default_loregraph_dir()
            .join("lore")
            .to_string_lossy()
            .into_owned();
        Self { lore_dir }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_calls: 6,
            max_result_tokens: 6000,
            max_planning_time_ms: 20_000,
            max_injected_entries: 12,
            context_token_budget: 2000,
            default_search_limit: 6,
        }
    }
}

/// Returns `~/.loregraph/`, or `./.loregraph/` when no home directory is known.
pub fn default_loregraph_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".loregraph")
}

/// Returns the default config file path: `~/.loregraph/config.toml`
pub fn default_config_path() -> PathBuf {
    default_loregraph_dir().join("config.toml")
}

impl LoreConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            LoreConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (LOREGRAPH_DIR, LOREGRAPH_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LOREGRAPH_DIR") {
            self.storage.lore_dir = val;
        }
        if let Ok(val) = std::env::var("LOREGRAPH_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Resolve the lore directory, expanding `~` if needed.
    pub fn resolved_lore_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.lore_dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = LoreConfig::default();
        assert_eq!(config.server.transport, "stdio");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.retrieval.max_calls, 6);
        assert_eq!(config.retrieval.context_token_budget, 2000);
        assert!(config.storage.lore_dir.ends_with("lore"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"
transport = "http"

[storage]
lore_dir = "/tmp/lore"

[retrieval]
max_calls = 10
"#;
        let config: LoreConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.server.transport, "http");
        assert_eq!(config.storage.lore_dir, "/tmp/lore");
        assert_eq!(config.retrieval.max_calls, 10);
        // defaults still apply for unset fields
        assert_eq!(config.retrieval.max_injected_entries, 12);
        assert_eq!(config.server.port, 8787);
    }

    #[test]
    fn load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoreConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.retrieval.max_result_tokens, 6000);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = LoreConfig::default();
        std::env::set_var("LOREGRAPH_DIR", "/tmp/override-lore");
        std::env::set_var("LOREGRAPH_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.lore_dir, "/tmp/override-lore");
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("LOREGRAPH_DIR");
        std::env::remove_var("LOREGRAPH_LOG_LEVEL");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/lore"), PathBuf::from("/var/lore"));
    }
}
