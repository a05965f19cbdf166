use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "forum", about = "A minimal discussion forum")]
pub struct Cli {
    /// Path to config file (TOML, or JSON when the name ends in .json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Path to the SQLite database file
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Directory holding static/ assets
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub assets: AssetsConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AssetsConfig {
    pub dir: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub cookie_days: u64,
}

/// Flat JSON layout: `{"Database": ..., "ListenAddress": ..., "AssetsDir": ...}`.
#[derive(Deserialize, Debug)]
struct FlatConfig {
    #[serde(alias = "Database", alias = "database", alias = "storeConnectionString")]
    store_connection_string: Option<String>,
    #[serde(alias = "ListenAddress", alias = "listenAddress")]
    listen_address: Option<String>,
    #[serde(alias = "AssetsDir", alias = "assetsDir")]
    assets_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("forum.db"),
            pool_size: 8,
            busy_timeout_ms: 5000,
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("assets"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "name".to_string(),
            cookie_days: 7,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match cli.config {
            Some(ref path) if path.exists() => Self::read(path)?,
            Some(ref path) => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Config::default()
            }
            None => Config::default(),
        };

        // CLI overrides
        if let Some(ref listen) = cli.listen {
            config.server.listen_address = listen.clone();
        }
        if let Some(ref database) = cli.database {
            config.database.path = database.clone();
        }
        if let Some(ref dir) = cli.assets_dir {
            config.assets.dir = dir.clone();
        }

        Ok(config)
    }

    /// Read a config file. `.json` files use the flat layout, anything else is TOML.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        tracing::info!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read configuration {}: {}", path.display(), e))?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if !is_json {
            return toml::from_str(&content).map_err(|e| {
                anyhow::anyhow!("cannot parse configuration {}: {}", path.display(), e)
            });
        }

        let flat: FlatConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("cannot parse configuration {}: {}", path.display(), e))?;

        let mut config = Config::default();
        if let Some(db) = flat.store_connection_string {
            config.database.path = PathBuf::from(db);
        }
        if let Some(listen) = flat.listen_address {
            config.server.listen_address = listen;
        }
        if let Some(dir) = flat.assets_dir {
            config.assets.dir = dir;
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.assets.dir.join("static")
    }
}
