//! Runtime configuration loaded from the environment (and `.env`).

use std::env;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SITE_BASE_PATH: &str = "./site";
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024; // 1 MiB

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings used by the render pipeline itself.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Root directory that template and font record paths are relative to.
    pub site_base_path: PathBuf,
    /// Directory receiving the short-lived `<uuid>.pdf` output files.
    pub output_dir: PathBuf,
    pub max_payload_bytes: usize,
}

impl RenderSettings {
    pub fn new(site_base_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_base_path: site_base_path.into(),
            output_dir: output_dir.into(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub render: RenderSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", &lookup, DEFAULT_MAX_CONNECTIONS)?;
        let run_migrations = parse_bool_or("RUN_MIGRATIONS", &lookup, true)?;
        let port = parse_or("PORT", &lookup, DEFAULT_PORT)?;
        let max_payload_bytes = parse_or("MAX_PAYLOAD_BYTES", &lookup, DEFAULT_MAX_PAYLOAD_BYTES)?;

        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let site_base_path = lookup("SITE_BASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SITE_BASE_PATH));

        let output_dir = lookup("RENDER_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        Ok(Self {
            database_url,
            max_connections,
            run_migrations,
            host,
            port,
            allowed_origins,
            render: RenderSettings {
                site_base_path,
                output_dir,
                max_payload_bytes,
            },
        })
    }
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(name: &'static str, lookup: &F, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
        None => Ok(default),
    }
}
