// crates/veritext-cli/src/commands/generate.rs
//
// `veritext generate <prompt>`: ask the daemon (or a local demo engine) for
// verifiable text.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde_json::json;

use veritext_core::proof::ProofKind;
use veritext_core::result::GenerationResult;
use veritext_engine::{EngineConfig, GenerateOptions, MockAdapter, ProofEngine};

use super::{params_to_json, parse_params};
use crate::output::{self, OutputFormat};
use crate::rpc_client;

#[derive(Debug, Args)]
pub struct GenerateCmd {
    /// The prompt text.
    #[arg()]
    pub prompt: String,

    /// Generation parameter as name=value (repeatable).
    #[arg(long = "param", short = 'p')]
    pub params: Vec<String>,

    /// Proof kind: digest-binding or signed-attestation.
    #[arg(long)]
    pub proof_kind: Option<ProofKind>,

    /// Deadline for the model call, in milliseconds.
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Use a local demo engine instead of the daemon (digest-binding only).
    #[arg(long)]
    pub local: bool,

    /// Also write the full result as JSON to this file.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Run the generate command.
pub async fn run(
    cmd: &GenerateCmd,
    rpc: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let params = parse_params(&cmd.params)?;

    let result: GenerationResult = if cmd.local {
        let engine = ProofEngine::new(Arc::new(MockAdapter::demo()), EngineConfig::default());
        let options = GenerateOptions {
            proof_kind: cmd.proof_kind,
            deadline: cmd.deadline_ms.map(Duration::from_millis),
        };
        engine.generate(&cmd.prompt, &params, options).await?
    } else {
        let mut request = json!({
            "prompt": cmd.prompt,
            "params": params_to_json(&params),
        });
        if let Some(kind) = cmd.proof_kind {
            request["proof_kind"] = json!(kind);
        }
        if let Some(ms) = cmd.deadline_ms {
            request["deadline_ms"] = json!(ms);
        }
        rpc_client::call_method(rpc, "generate/text", request).await?
    };

    if let Some(path) = &cmd.out {
        std::fs::write(path, output::format_json(&result))?;
        if format == OutputFormat::Table {
            println!("Result written to {}", path.display());
        }
    }
    output::print_result(&result, format);
    Ok(())
}
