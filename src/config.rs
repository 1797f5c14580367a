//! Configuration resolution for genrebox
//!
//! Settings resolve with CLI argument > environment variable > TOML config
//! file > compiled default. CLI and environment are handled by clap; this
//! module merges in the TOML tier and the defaults.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default upload size cap (16 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default access token lifetime
pub const DEFAULT_JWT_EXPIRATION_SECS: u64 = 3600;

const DEFAULT_JWT_SECRET: &str = "change-me";
const DEFAULT_ADMIN_EMAIL: &str = "admin@mail.com";
const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:8600";
const DEFAULT_CLASSIFIER_MODEL: &str = "pedromatias97/genre-recognizer-finetuned-gtzan_dset";

/// Command-line arguments for genrebox
#[derive(Parser, Debug, Default)]
#[command(name = "genrebox")]
#[command(about = "Audio upload and genre classification service")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "GENREBOX_PORT")]
    pub port: Option<u16>,

    /// Root folder for the database and stored uploads
    #[arg(short, long, env = "GENREBOX_ROOT_FOLDER")]
    pub root_folder: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, env = "GENREBOX_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Secret for signing access tokens
    #[arg(long, env = "GENREBOX_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Base URL of the genre classifier service
    #[arg(long, env = "GENREBOX_CLASSIFIER_URL")]
    pub classifier_url: Option<String>,

    /// Email address granted admin actions
    #[arg(long, env = "GENREBOX_ADMIN_EMAIL")]
    pub admin_email: Option<String>,
}

/// TOML config file contents; every field optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub root_folder: Option<PathBuf>,
    pub jwt_secret: Option<String>,
    pub jwt_expiration_secs: Option<u64>,
    pub admin_email: Option<String>,
    pub classifier_url: Option<String>,
    pub classifier_model: Option<String>,
    pub max_upload_bytes: Option<usize>,
}

/// Fully resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Root folder; the database and uploads live under it
    pub root_folder: PathBuf,

    /// Secret for signing access tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_expiration_secs: u64,

    /// Email address granted admin actions
    pub admin_email: String,

    /// Base URL of the genre classifier service
    pub classifier_url: String,

    /// Model identifier reported by the model info endpoint
    pub classifier_model: String,

    /// Maximum accepted request body size
    pub max_upload_bytes: usize,
}

impl Config {
    /// Resolve configuration from parsed arguments plus the TOML tier
    pub fn resolve(args: &Args) -> Result<Self> {
        let toml_config = load_toml_config(args.config_file.as_deref())?;
        let config = merge(args, &toml_config);

        if config.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("Using built-in JWT secret; set GENREBOX_JWT_SECRET in production");
        }

        Ok(config)
    }

    /// Database file path under the root folder
    pub fn db_path(&self) -> PathBuf {
        self.root_folder.join("genrebox.db")
    }

    /// Directory stored uploads go under
    pub fn upload_dir(&self) -> PathBuf {
        self.root_folder.join("uploads")
    }
}

/// Merge the CLI/env tier (already combined by clap) with TOML and defaults
fn merge(args: &Args, toml_config: &TomlConfig) -> Config {
    Config {
        port: args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT),
        root_folder: args
            .root_folder
            .clone()
            .or_else(|| toml_config.root_folder.clone())
            .unwrap_or_else(default_root_folder),
        jwt_secret: args
            .jwt_secret
            .clone()
            .or_else(|| toml_config.jwt_secret.clone())
            .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
        jwt_expiration_secs: toml_config
            .jwt_expiration_secs
            .unwrap_or(DEFAULT_JWT_EXPIRATION_SECS),
        admin_email: args
            .admin_email
            .clone()
            .or_else(|| toml_config.admin_email.clone())
            .unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
        classifier_url: args
            .classifier_url
            .clone()
            .or_else(|| toml_config.classifier_url.clone())
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string()),
        classifier_model: toml_config
            .classifier_model
            .clone()
            .unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string()),
        max_upload_bytes: toml_config
            .max_upload_bytes
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
    }
}

/// Load the TOML tier. An explicit path must parse; the default path is
/// optional and silently skipped when absent.
fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(TomlConfig::default()),
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Default config file location: `<config dir>/genrebox/config.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("genrebox").join("config.toml"))
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("genrebox"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/genrebox"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("genrebox"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/genrebox"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("genrebox"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\genrebox"))
    } else {
        PathBuf::from("./genrebox_data")
    }
}
