use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::utils::path::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_HOST, DEFAULT_ISSUE_COLLECTION,
    DEFAULT_LOG_DIRECTORY, DEFAULT_LOG_FILE_NAME, DEFAULT_MONGO_DATABASE, DEFAULT_MONGO_URL,
    DEFAULT_PORT,
};

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub key: Option<String>,
}

/// Database configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DatabaseFileConfig {
    pub connection_string: Option<String>,
    pub database_name: Option<String>,
    pub issue_collection: Option<String>,
}

/// Logger API configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LogsFileConfig {
    pub directory: Option<String>,
    pub file_name: Option<String>,
    pub auth_code: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    pub logs: Option<LogsFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra {
            if map.is_empty() {
                return;
            }
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            if server.host.is_some() {
                tracing::trace!(host = ?server.host, "Merging server.host");
                current.host = server.host;
            }
            if server.port.is_some() {
                tracing::trace!(port = ?server.port, "Merging server.port");
                current.port = server.port;
            }
        }

        if let Some(auth) = other.auth {
            let current = self.auth.get_or_insert_with(AuthFileConfig::default);
            if auth.key.is_some() {
                tracing::trace!("Merging auth.key");
                current.key = auth.key;
            }
        }

        if let Some(database) = other.database {
            let current = self.database.get_or_insert_with(DatabaseFileConfig::default);
            if database.connection_string.is_some() {
                tracing::trace!("Merging database.connection_string");
                current.connection_string = database.connection_string;
            }
            if database.database_name.is_some() {
                tracing::trace!(name = ?database.database_name, "Merging database.database_name");
                current.database_name = database.database_name;
            }
            if database.issue_collection.is_some() {
                tracing::trace!(
                    collection = ?database.issue_collection,
                    "Merging database.issue_collection"
                );
                current.issue_collection = database.issue_collection;
            }
        }

        if let Some(logs) = other.logs {
            let current = self.logs.get_or_insert_with(LogsFileConfig::default);
            if logs.directory.is_some() {
                tracing::trace!(directory = ?logs.directory, "Merging logs.directory");
                current.directory = logs.directory;
            }
            if logs.file_name.is_some() {
                tracing::trace!(file_name = ?logs.file_name, "Merging logs.file_name");
                current.file_name = logs.file_name;
            }
            if logs.auth_code.is_some() {
                tracing::trace!("Merging logs.auth_code");
                current.auth_code = logs.auth_code;
            }
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Whether a bind address listens on every interface
pub fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Shared-secret authentication for the Issue API.
/// `None` leaves the issue routes unreachable (every request is rejected).
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub key: Option<String>,
}

/// MongoDB configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub database_name: String,
    pub issue_collection: String,
}

/// Logger API configuration
#[derive(Debug, Clone)]
pub struct LogsConfig {
    /// Directory template, e.g. `logs/SOURCE/DATE/LEVEL`
    pub directory: String,
    pub file_name: String,
    pub auth_code: Option<String>,
}

impl LogsConfig {
    /// Fixed prefix of the directory template, used to locate written records
    pub fn root_dir(&self) -> PathBuf {
        crate::data::logs::template_root(&self.directory)
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub logs: LogsConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.safari/safari.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path().filter(|p| p.exists()) {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Ok(Self::layer(cli, file_config))
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_server = file_config.server.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();
        let file_logs = file_config.logs.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
        };

        let auth = AuthConfig {
            key: cli
                .auth_key
                .clone()
                .or(file_auth.key)
                .filter(|k| !k.is_empty()),
        };
        if auth.key.is_none() {
            tracing::warn!("No auth key configured; Issue API requests will be rejected");
        }

        let database = DatabaseConfig {
            connection_string: cli
                .mongo_url
                .clone()
                .or(file_database.connection_string)
                .unwrap_or_else(|| DEFAULT_MONGO_URL.to_string()),
            database_name: cli
                .mongo_database
                .clone()
                .or(file_database.database_name)
                .unwrap_or_else(|| DEFAULT_MONGO_DATABASE.to_string()),
            issue_collection: file_database
                .issue_collection
                .unwrap_or_else(|| DEFAULT_ISSUE_COLLECTION.to_string()),
        };

        let logs = LogsConfig {
            directory: cli
                .log_directory
                .clone()
                .or(file_logs.directory)
                .unwrap_or_else(|| DEFAULT_LOG_DIRECTORY.to_string()),
            file_name: cli
                .log_file_name
                .clone()
                .or(file_logs.file_name)
                .unwrap_or_else(|| DEFAULT_LOG_FILE_NAME.to_string()),
            auth_code: cli
                .log_auth_code
                .clone()
                .or(file_logs.auth_code)
                .filter(|c| !c.is_empty()),
        };

        tracing::debug!(
            host = %server.host,
            port = server.port,
            database = %database.database_name,
            log_directory = %logs.directory,
            log_file = %logs.file_name,
            "Configuration resolved"
        );

        Self {
            server,
            auth,
            database,
            logs,
        }
    }
}

fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
