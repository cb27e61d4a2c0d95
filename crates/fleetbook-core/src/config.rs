//! Configuration resolution for Fleetbook.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/fleetbook/settings.json)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (applied by the binary, highest priority)

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::pagination::DEFAULT_PER_PAGE;

/// Complete Fleetbook configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
}

/// Listener and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub database_path: Option<PathBuf>,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            database_path: None,
            log_json: false,
        }
    }
}

/// Bearer credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. A random one is generated at startup when unset,
    /// which invalidates every issued token on restart.
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Server registry behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Validate attribute bags against the field catalog on write.
    pub enforce_attribute_schema: bool,
    pub default_per_page: u32,
    /// How many recent metrics `GET /api/servers/:id` embeds.
    pub max_recent_metrics: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enforce_attribute_schema: false,
            default_per_page: DEFAULT_PER_PAGE,
            max_recent_metrics: 100,
        }
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file {} does not exist",
                path.display()
            )));
        }
        let file = load_config_file(path)?;
        merge_config(&mut config, file);
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("fleetbook").join("settings.json"))
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }
    #[cfg(target_os = "macos")]
    {
        home_dir().map(|h| h.join("Library/Application Support"))
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| home_dir().map(|h| h.join(".config")))
    }
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    base.server.addr = overlay.server.addr;
    if overlay.server.database_path.is_some() {
        base.server.database_path = overlay.server.database_path;
    }
    base.server.log_json = overlay.server.log_json;

    if overlay.auth.jwt_secret.is_some() {
        base.auth.jwt_secret = overlay.auth.jwt_secret;
    }
    base.auth.token_ttl_secs = overlay.auth.token_ttl_secs;

    base.registry = overlay.registry;
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(val) = var("FLEETBOOK_ADDR") {
        config.server.addr = val
            .parse()
            .map_err(|e| Error::Config(format!("FLEETBOOK_ADDR={val}: {e}")))?;
    }
    if let Some(val) = var("FLEETBOOK_DATABASE_PATH") {
        config.server.database_path = Some(PathBuf::from(val));
    }
    if let Some(val) = var("FLEETBOOK_JWT_SECRET") {
        config.auth.jwt_secret = Some(val);
    }
    if let Some(val) = var("FLEETBOOK_TOKEN_TTL_SECS") {
        config.auth.token_ttl_secs = val
            .parse()
            .map_err(|e| Error::Config(format!("FLEETBOOK_TOKEN_TTL_SECS={val}: {e}")))?;
    }
    if let Some(val) = var("FLEETBOOK_ENFORCE_ATTRIBUTE_SCHEMA") {
        config.registry.enforce_attribute_schema = matches!(
            val.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
    Ok(())
}
