use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use thumbfm_core::Config;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// `[storage]`, `[thumbs]` and `[catalog]` sections of the same file.
    #[serde(flatten)]
    pub core: Config,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            core: Config::default(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("THUMBFM_WEB_CONFIG").map(PathBuf::from).ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            Self::from_toml(&contents)?
        } else {
            ServerConfig::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `THUMBFM_*` overrides looked up through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(addr) = var("THUMBFM_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }
        if let Some(db) = var("THUMBFM_THUMB_DB") {
            self.core.storage.thumbs = PathBuf::from(db);
        }

        // Security: there is no authentication layer, keep it off the network
        if self.bind_addr.ip().is_unspecified() {
            if var("THUMBFM_INSECURE").is_some() {
                tracing::warn!(
                    "Serving WITHOUT authentication on all interfaces ({}). \
                     Anyone on the network can move and delete files!",
                    self.bind_addr
                );
            } else {
                let safe_addr: SocketAddr = ([127, 0, 0, 1], self.bind_addr.port()).into();
                tracing::warn!(
                    "No authentication available. Binding to {} instead of {} for safety. \
                     Set THUMBFM_INSECURE=1 to override (NOT RECOMMENDED).",
                    safe_addr,
                    self.bind_addr
                );
                self.bind_addr = safe_addr;
            }
        }

        Ok(())
    }
}
