// crates/veritext-daemon/src/config.rs
//
// Runtime configuration for the Veritext daemon.
// Loaded from a TOML file or populated with sensible defaults.
//
//   rpc_port = 50051
//   signing_key_path = "~/.veritext/keys/engine.key"
//
//   [engine]
//   default_proof_kind = "signed-attestation"
//   deadline_ms = 20000
//
//   [model]
//   backend = "ollama"
//   model = "llama3:8b"

use serde::Deserialize;
use std::fs;

use veritext_engine::{AdapterConfig, EngineConfig};

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hex-encoded Ed25519 secret key. When the file is absent the daemon
    /// runs without signing and only issues digest-binding proofs.
    #[serde(default = "default_signing_key_path")]
    pub signing_key_path: String,

    /// Optional YAML file of additional trusted public keys for proof/verify.
    #[serde(default)]
    pub trusted_keys_path: Option<String>,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub model: AdapterConfig,
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    50051
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_signing_key_path() -> String {
    "~/.veritext/keys/engine.key".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            signing_key_path: default_signing_key_path(),
            trusted_keys_path: None,
            engine: EngineConfig::default(),
            model: AdapterConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
