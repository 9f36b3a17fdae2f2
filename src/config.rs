//! Load and validate runtime configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::{env, fs};

use anyhow::Context;
use directories::ProjectDirs;
use serde::Deserialize;

use crate::types::Exchange;

pub const CONFIG_ENV: &str = "PRICE_LEDGER_CONFIG";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Json,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreCfg {
    pub backend: StoreBackend,
    /// Defaults to the platform data directory when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl StoreCfg {
    pub fn resolved_path(&self, file_name: &str) -> PathBuf {
        if let Some(p) = &self.path {
            return p.clone();
        }
        match ProjectDirs::from("", "", "price-ledger") {
            Some(dirs) => dirs.data_dir().join(file_name),
            None => PathBuf::from("data").join(file_name),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketCfg {
    pub quotes_path: PathBuf,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_sec: u64,
}

fn default_cache_ttl() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionCfg {
    pub default_exchange: Exchange,
    /// Tickers accepted per exchange. Missing or empty means any ticker.
    #[serde(default)]
    pub listings: BTreeMap<Exchange, Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub store: StoreCfg,
    pub market: MarketCfg,
    pub session: SessionCfg,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&s)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(cfg)
    }

    /// `$PRICE_LEDGER_CONFIG`, else `config.yaml`.
    pub fn path_from_env() -> PathBuf {
        env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.yaml"))
    }
}
