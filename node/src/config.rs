//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use dpos_rpc::pagination::MAX_LIMIT;
use dpos_store_lmdb::environment::DEFAULT_MAP_SIZE;
use dpos_utils::LogFormat;

use crate::NodeError;

/// Configuration for a voters node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Interface the HTTP server binds to.
    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Largest `limit` a voters query may request.
    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    /// Answer "No data returned" for accounts that never registered as a
    /// delegate instead of an empty voter list.
    #[serde(default)]
    pub require_delegate: bool,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Filter directive, e.g. "info" or "warn,dpos_rpc=debug".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Genesis JSON applied when the store is empty.
    #[serde(default)]
    pub genesis_file: Option<PathBuf>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./dpos_data")
}

fn default_rpc_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    4000
}

fn default_max_limit() -> u64 {
    MAX_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lmdb_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.max_limit == 0 {
            return Err(NodeError::Config("max_limit must be at least 1".into()));
        }
        if self.lmdb_map_size == 0 {
            return Err(NodeError::Config("lmdb_map_size must be positive".into()));
        }
        self.rpc_addr().map(|_| ())
    }

    /// Socket address of the HTTP server.
    pub fn rpc_addr(&self) -> Result<SocketAddr, NodeError> {
        format!("{}:{}", self.rpc_bind, self.rpc_port)
            .parse()
            .map_err(|e| NodeError::Config(format!("invalid rpc_bind {:?}: {e}", self.rpc_bind)))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            max_limit: default_max_limit(),
            require_delegate: false,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            lmdb_map_size: default_lmdb_map_size(),
            genesis_file: None,
        }
    }
}
