// crates/veritext-cli/src/commands/status.rs
//
// `veritext status`: display daemon health and identity.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::output::{self, FieldRow, OutputFormat};
use crate::rpc_client;

#[derive(Debug, Serialize, Deserialize)]
struct Health {
    status: String,
    engine_ready: bool,
    signing_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeInfo {
    version: String,
    model_id: String,
    model_version: String,
    default_proof_kind: String,
    digest_algorithm: String,
    signer_key_id: Option<String>,
    uptime_seconds: u64,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    endpoint: String,
    health: Health,
    info: NodeInfo,
}

/// Run the status command.
pub async fn run(rpc: &str, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let health: Health = rpc_client::call_method(rpc, "node/health", json!({})).await?;
    let info: NodeInfo = rpc_client::call_method(rpc, "node/info", json!({})).await?;
    let report = StatusReport {
        endpoint: rpc.to_string(),
        health,
        info,
    };

    match format {
        OutputFormat::Json => println!("{}", output::format_json(&report)),
        OutputFormat::Table => {
            println!("Veritext daemon v{}", report.info.version);
            println!("{}", output::format_table(&status_rows(&report)));
        }
    }
    Ok(())
}

fn status_rows(report: &StatusReport) -> Vec<FieldRow> {
    vec![
        FieldRow::new("RPC endpoint", &report.endpoint),
        FieldRow::new("Status", &report.health.status),
        FieldRow::new("Engine ready", report.health.engine_ready),
        FieldRow::new(
            "Model",
            format!("{} ({})", report.info.model_id, report.info.model_version),
        ),
        FieldRow::new("Default proof", &report.info.default_proof_kind),
        FieldRow::new("Digest", &report.info.digest_algorithm),
        FieldRow::new("Signing", report.health.signing_enabled),
        FieldRow::new(
            "Signer key",
            report.info.signer_key_id.as_deref().unwrap_or("-"),
        ),
        FieldRow::new("Uptime (s)", report.info.uptime_seconds),
    ]
}
