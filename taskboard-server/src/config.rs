//! Settings for `taskboard-server`.
//!
//! Two knobs, each resolved as flag > environment > file > default:
//!
//! | Setting | Flag / env | File key | Default |
//! |---------|------------|----------|---------|
//! | listen address | `--bind` / `TASKBOARD_ADDR` | `server.bind_addr` | `0.0.0.0:5000` |
//! | request body limit (bytes) | `--max-body-size` | `server.max_body_size` | 65536 |
//!
//! The file is `~/.config/taskboard-server/config.toml` unless `--config`
//! names another one, in which case it has to exist. The log level is a
//! flag only (`--log-level` / `TASKBOARD_SERVER_LOG`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Listen address used when nothing else is configured.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Request body limit used when nothing else is configured.
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The listen address is not `host:port` with a literal IP.
    #[error("invalid bind address {0:?}")]
    InvalidBindAddr(String),

    /// A zero body limit would refuse every create and replace.
    #[error("max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// On-disk settings. Everything optional; unknown tables are ignored.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SettingsFile {
    server: ServerTable,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerTable {
    bind_addr: Option<String>,
    max_body_size: Option<usize>,
}

/// Command line of `taskboard-server`.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "In-memory task service for taskboard")]
pub struct ServerCliArgs {
    /// Listen address, e.g. `127.0.0.1:8080`.
    #[arg(short, long, env = "TASKBOARD_ADDR")]
    pub bind: Option<String>,

    /// Settings file (default: `~/.config/taskboard-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Largest accepted request body, in bytes.
    #[arg(long)]
    pub max_body_size: Option<usize>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKBOARD_SERVER_LOG")]
    pub log_level: String,
}

/// Settings the server runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub max_body_size: usize,
    pub log_level: String,
}

impl ServerConfig {
    /// Reads the settings file and merges it under the command line.
    ///
    /// # Errors
    ///
    /// Fails if an explicit `--config` file is missing, if any settings
    /// file is unreadable or malformed, or if the merged values are invalid.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = read_settings(cli.config.as_deref())?;
        Self::merge(cli, &file)
    }

    fn merge(cli: &ServerCliArgs, file: &SettingsFile) -> Result<Self, ConfigError> {
        let addr = cli
            .bind
            .as_deref()
            .or(file.server.bind_addr.as_deref())
            .unwrap_or(DEFAULT_BIND_ADDR);
        let bind_addr = addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(addr.to_string()))?;

        let max_body_size = match cli.max_body_size.or(file.server.max_body_size) {
            Some(0) => return Err(ConfigError::ZeroBodyLimit),
            Some(limit) => limit,
            None => DEFAULT_MAX_BODY_SIZE,
        };

        Ok(Self {
            bind_addr,
            max_body_size,
            log_level: cli.log_level.clone(),
        })
    }
}

fn read_settings(explicit: Option<&Path>) -> Result<SettingsFile, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match dirs::config_dir() {
            Some(dir) => (dir.join("taskboard-server").join("config.toml"), false),
            None => return Ok(SettingsFile::default()),
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(SettingsFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
