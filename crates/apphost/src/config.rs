use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use manifest::{ManifestValidator, PermissionRegistry, Version};

use crate::error::{CoreError, CoreResult};

pub const HOST_CONFIG_FILENAME: &str = "apphost.json";
pub const HOST_CONFIG_VERSION: &str = "1.0.0";
/// Environment variable naming the directory that holds [`HOST_CONFIG_FILENAME`].
pub const CONFIG_DIR_ENV: &str = "APPHOST_CONFIG_DIR";
pub const DEFAULT_CONFIG_DIR: &str = ".apphost";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 25;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub version: String,
    /// Version of the platform that apps declare compatibility with.
    pub host_version: String,
    pub server: ServerSettings,
    pub manifest: ManifestSettings,
    /// Replaces the built-in permission set when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind_address: String,
    #[serde(default)]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSettings {
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}

impl HostConfig {
    pub fn default_new() -> Self {
        Self {
            version: HOST_CONFIG_VERSION.to_string(),
            host_version: "3.20.0".to_string(),
            server: ServerSettings {
                bind_address: "127.0.0.1:8000".to_string(),
                log_filter: None,
            },
            manifest: ManifestSettings {
                fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            },
            permissions: None,
        }
    }

    pub fn parsed_host_version(&self) -> CoreResult<Version> {
        Version::parse(&self.host_version).map_err(|error| {
            CoreError::InvalidInput(format!(
                "host_version {:?} is not a semantic version: {error}",
                self.host_version
            ))
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.manifest.fetch_timeout_secs)
    }

    /// Builds the validator described by this config.
    pub fn validator(&self) -> CoreResult<ManifestValidator> {
        let validator = ManifestValidator::new(self.parsed_host_version()?);
        Ok(match &self.permissions {
            Some(names) => validator.with_permissions(PermissionRegistry::from_names(names.clone())),
            None => validator,
        })
    }
}

/// Directory from [`CONFIG_DIR_ENV`], or [`DEFAULT_CONFIG_DIR`] under the working directory.
pub fn resolve_config_dir() -> PathBuf {
    std::env::var_os(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
}

pub fn load_or_create_host_config(dir: &Path) -> CoreResult<HostConfig> {
    std::fs::create_dir_all(dir).map_err(|error| {
        CoreError::Internal(format!(
            "failed to create config directory {}: {error}",
            dir.display()
        ))
    })?;

    let path = host_config_path(dir);
    if !path.exists() {
        let config = HostConfig::default_new();
        write_host_config(&path, &config)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(config);
    }

    let data = std::fs::read_to_string(&path).map_err(|error| {
        CoreError::Internal(format!(
            "failed to read host config {}: {error}",
            path.display()
        ))
    })?;
    let config: HostConfig = serde_json::from_str(&data).map_err(|error| {
        CoreError::InvalidInput(format!(
            "failed to parse host config {}: {error}",
            path.display()
        ))
    })?;

    if config.version != HOST_CONFIG_VERSION {
        return Err(CoreError::InvalidInput(format!(
            "unsupported host config version {} (expected {HOST_CONFIG_VERSION})",
            config.version
        )));
    }
    config.parsed_host_version()?;

    Ok(config)
}

pub fn host_config_path(dir: &Path) -> PathBuf {
    dir.join(HOST_CONFIG_FILENAME)
}

pub fn write_host_config(path: &Path, config: &HostConfig) -> CoreResult<()> {
    let data = serde_json::to_string_pretty(config).map_err(|error| {
        CoreError::Internal(format!(
            "failed to serialize host config {}: {error}",
            path.display()
        ))
    })?;
    std::fs::write(path, data).map_err(|error| {
        CoreError::Internal(format!(
            "failed to write host config {}: {error}",
            path.display()
        ))
    })?;
    Ok(())
}
