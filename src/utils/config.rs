use std::net::SocketAddr;

use anyhow::Context as _;

/// Environment variable holding the Postgres connection string.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

impl Config {
    /// Load a `.toml` file from disk and parse it as a [`Config`].
    pub async fn load(file: &str) -> anyhow::Result<Config> {
        async fn load_inner(file: &str) -> anyhow::Result<Config> {
            let contents = tokio::fs::read_to_string(file).await?;
            Ok(toml::from_str(&contents)?)
        }
        load_inner(file).await.with_context(|| format!("loading config={file}"))
    }

    /// Overlay `DATABASE_URL` from the process environment, if set.
    pub fn with_env(self) -> Config {
        self.with_database_url(std::env::var(DATABASE_URL_VAR).ok())
    }

    /// Replace the database URL when `url` is non-blank, otherwise keep the current one.
    pub fn with_database_url(mut self, url: Option<String>) -> Config {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.db.url = Some(url);
        }
        self.db.url = self.db.url.filter(|u| !u.trim().is_empty());
        self
    }
}

/// Bag of app configuration values, parsed from a TOML file with serde.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub net: NetConfig,
}

/// Database configuration.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct DbConfig {
    /// Postgres connection string. Requests needing the database fail with a 500 when unset.
    pub url: Option<String>,
}

/// Networking configuration.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct NetConfig {
    /// HTTP server bind address.
    pub http_addr: SocketAddr,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self { http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)) }
    }
}
