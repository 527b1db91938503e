use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::retention;

#[derive(Parser, Debug)]
#[command(name = "giastylez-web", about = "Web front end for the GiaStylez image API")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Base URL of the image API, e.g. http://localhost:8001/api
    #[arg(long)]
    pub api_url: Option<String>,

    /// Directory holding config.toml
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
    pub feed: FeedConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub max_age_hours: u64,
    pub secure: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UploadConfig {
    pub redirect_delay_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FeedConfig {
    pub retention_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001/api".to_string(),
            timeout_secs: 15,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "token".to_string(),
            max_age_hours: 24,
            secure: false,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            redirect_delay_secs: 2,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            retention_days: retention::RETENTION_DAYS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref api_url) = cli.api_url {
            config.api.base_url = api_url.clone();
        }

        if config.session.cookie_name.trim().is_empty() {
            anyhow::bail!("session.cookie_name must not be empty");
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".giastylez")
        })
    }
}
