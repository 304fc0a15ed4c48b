// crates/veritext-daemon/src/main.rs
//
// Binary entrypoint for the Veritext daemon.
//
// Parses CLI arguments, loads configuration, initializes tracing, loads the
// signing key, constructs the engine and its model adapter, and serves the
// JSON-RPC API until interrupted.

mod config;
mod keys;

use std::sync::Arc;

use clap::Parser;
use config::DaemonConfig;

use veritext_core::proof::ProofKind;
use veritext_engine::ProofEngine;
use veritext_rpc::{RpcConfig, VeritextRpcServer};

/// Veritext daemon: serves proof-carrying text generation over JSON-RPC.
#[derive(Parser, Debug)]
#[command(
    name = "veritext-daemon",
    version = "0.1.0",
    about = "Veritext proof-carrying generation daemon"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.veritext/config.toml")]
    config: String,

    /// Override the RPC port from the config file.
    #[arg(long)]
    rpc_port: Option<u16>,

    /// Override the signing key path from the config file.
    #[arg(long)]
    signing_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Read the config before tracing starts so its log level applies; the
    // outcome is logged once the subscriber is up.
    let loaded = DaemonConfig::load(&args.config);
    let log_level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut daemon_config = match loaded {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", args.config);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                args.config,
                e
            );
            DaemonConfig::default()
        }
    };

    if let Some(port) = args.rpc_port {
        daemon_config.rpc_port = port;
    }
    if let Some(path) = args.signing_key {
        daemon_config.signing_key_path = path;
    }

    tracing::info!("Veritext Daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );
    tracing::info!(
        "Default proof kind: {}",
        daemon_config.engine.default_proof_kind
    );

    // ---------------------------------------------------------------
    // Signing key and trusted keys.
    // ---------------------------------------------------------------
    let signing = keys::load_signing_material(&daemon_config.signing_key_path)?;
    match &signing {
        Some(material) => tracing::info!("Signing key: {}", material.key_id()),
        None => {
            if daemon_config.engine.default_proof_kind == ProofKind::SignedAttestation {
                return Err(format!(
                    "default proof kind is signed-attestation but no signing key was found at {}. \
                     Generate one with `veritext keygen`.",
                    daemon_config.signing_key_path
                )
                .into());
            }
            tracing::warn!(
                "No signing key at {}; only digest-binding proofs will be issued.",
                daemon_config.signing_key_path
            );
        }
    }

    let trust = keys::build_trust_registry(
        signing.as_ref().map(|m| m.public_key_bytes()),
        daemon_config.trusted_keys_path.as_deref(),
    )?;
    tracing::info!("Trusted keys: {}", trust.len());

    // ---------------------------------------------------------------
    // Engine.
    // ---------------------------------------------------------------
    let adapter = daemon_config.model.build()?;
    tracing::info!(
        "Model: {} (version {})",
        adapter.model_id(),
        adapter.model_version()
    );

    let mut engine = ProofEngine::new(adapter, daemon_config.engine.clone());
    if let Some(material) = signing {
        engine = engine.with_signing_material(material);
    }

    let rpc_config = RpcConfig {
        host: daemon_config.rpc_host.clone(),
        port: daemon_config.rpc_port,
    };
    let rpc_server = VeritextRpcServer::new(rpc_config, Arc::new(engine), Arc::new(trust));

    tokio::select! {
        result = rpc_server.start() => {
            if let Err(e) = result {
                tracing::error!("RPC server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    tracing::info!("Veritext daemon shut down gracefully");
    Ok(())
}
