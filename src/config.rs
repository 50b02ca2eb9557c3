//! Configuration file loading.
//!
//! The config file is rendered as a template before it is parsed, with the
//! process environment (after `.env` is loaded) as variables:
//!
//! ```toml
//! listen = "0.0.0.0:3000"
//! api_key = "${ CORRAL_API_KEY }"
//!
//! [docker]
//! timeout = 120
//! stop_timeout = 10
//!
//! [storage]
//! path = "/var/lib/corral/inventory.db"
//!
//! [sync]
//! interval = 300
//! ```

use std::{collections::HashMap, net::SocketAddr, num::NonZeroU64, path::Path, path::PathBuf};

use minijinja::Environment;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Templating error in {0:?}: {1:?}")]
    Template(PathBuf, minijinja::Error),
    #[error("api_key must be set to a non-empty value")]
    MissingApiKey,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CorralConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    pub docker: DockerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Serialize start/stop requests that target the same container name.
    #[serde(default = "default_true")]
    pub serialize_per_name: bool,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DockerConfig {
    /// Request timeout in seconds for every call to the daemon.
    #[serde(default = "default_docker_timeout")]
    pub timeout: u64,
    /// Seconds the daemon waits before killing a container being stopped.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout: i32,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            timeout: default_docker_timeout(),
            stop_timeout: default_stop_timeout(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Milliseconds SQLite waits on a locked database before failing.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            busy_timeout: default_busy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SyncConfig {
    /// Seconds between background syncs. Disabled when absent.
    pub interval: Option<NonZeroU64>,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_true() -> bool {
    true
}

fn default_docker_timeout() -> u64 {
    120
}

fn default_stop_timeout() -> i32 {
    10
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("corral.db")
}

fn default_busy_timeout() -> u64 {
    5000
}

impl CorralConfig {
    pub fn try_init(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path)?;
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::try_init_from_string(&config, &vars)
            .map_err(|e| match e {
                ConfigError::Template(_, e) => ConfigError::Template(path.to_path_buf(), e),
                e => e,
            })
    }

    fn try_init_from_string(
        config: &str,
        vars: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let rendered = render_template(config, vars)
            .map_err(|e| ConfigError::Template(PathBuf::new(), e))?;
        let config: Self = toml::from_str(&rendered)?;

        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(config)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

pub fn render_template(
    template_str: &str,
    vars: &HashMap<String, String>,
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();

    let syntax = minijinja::syntax::SyntaxConfig::builder()
        .variable_delimiters("${", "}")
        .build()?;

    env.set_syntax(syntax);
    env.set_undefined_behavior(minijinja::UndefinedBehavior::Strict);

    let template = env.template_from_str(template_str)?;
    template.render(vars)
}
