use crate::sku::DEFAULT_KILL_SWITCH_ENV;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sku: SkuConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(rename = "type")]
    pub catalog_type: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl CatalogConfig {
    /// Postgres connection string; only meaningful after [`AppConfig::validate`].
    pub fn postgres_url(&self) -> Option<String> {
        Some(format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user.as_ref()?,
            self.password.as_ref()?,
            self.host.as_ref()?,
            self.port.unwrap_or(5432),
            self.database.as_ref()?
        ))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct PathsConfig {
    /// Directory holding the SQLite catalog (sku_catalog.db).
    /// Defaults to ./data
    pub base_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SkuConfig {
    /// Environment variable that disables auto-generation when set to `true` or `1`.
    #[serde(default = "default_kill_switch_env")]
    pub kill_switch_env: String,
}

fn default_kill_switch_env() -> String {
    DEFAULT_KILL_SWITCH_ENV.to_string()
}

impl Default for SkuConfig {
    fn default() -> Self {
        Self {
            kill_switch_env: default_kill_switch_env(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load(config_path: &str) -> Result<Self> {
        Self::load_with_environment(config_path, Self::environment())
    }

    // Add environment variables with prefix EPG_SKU_
    // Sections and keys are split by a double underscore so keys may contain
    // single underscores. Example: EPG_SKU_SKU__KILL_SWITCH_ENV=MY_SWITCH
    fn environment() -> config::Environment {
        config::Environment::with_prefix("EPG_SKU")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_environment(
        config_path: &str,
        environment: config::Environment,
    ) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path))
            .add_source(environment)
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        match self.catalog.catalog_type.as_str() {
            "postgres" => {
                if self.catalog.host.is_none() {
                    anyhow::bail!("Postgres catalog requires 'host'");
                }
                if self.catalog.database.is_none() {
                    anyhow::bail!("Postgres catalog requires 'database'");
                }
                if self.catalog.user.is_none() {
                    anyhow::bail!("Postgres catalog requires 'user'");
                }
                if self.catalog.password.is_none() {
                    anyhow::bail!("Postgres catalog requires 'password'");
                }
            }
            "sqlite" => {
                // SQLite uses paths config, no additional validation needed
            }
            _ => anyhow::bail!("Invalid catalog type: {}", self.catalog.catalog_type),
        }

        if self.sku.kill_switch_env.trim().is_empty() {
            anyhow::bail!("sku.kill_switch_env must not be empty");
        }

        Ok(())
    }
}
