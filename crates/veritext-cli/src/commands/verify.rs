// crates/veritext-cli/src/commands/verify.rs
//
// `veritext verify`: check a saved GenerationResult against the prompt and
// parameters it claims to answer. Runs locally by default; no network.

use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use veritext_core::result::GenerationResult;
use veritext_verify::{verify_claim, KeyRegistry, VerificationOutcome};

use super::{params_to_json, parse_params};
use crate::output::{self, describe_outcome, FieldRow, OutputFormat};
use crate::rpc_client;

#[derive(Debug, Args)]
pub struct VerifyCmd {
    /// JSON file holding the GenerationResult.
    #[arg(long)]
    pub result: PathBuf,

    /// The prompt the result claims to answer.
    #[arg(long)]
    pub prompt: String,

    /// Generation parameter as name=value (repeatable).
    #[arg(long = "param", short = 'p')]
    pub params: Vec<String>,

    /// Trusted engine public key, hex (repeatable).
    #[arg(long = "trusted-key")]
    pub trusted_keys: Vec<String>,

    /// YAML file of trusted keys.
    #[arg(long)]
    pub keys_file: Option<String>,

    /// Ask the daemon to verify with its own trusted keys instead.
    #[arg(long)]
    pub remote: bool,
}

/// Run the verify command. Exits non-zero when the proof does not hold.
pub async fn run(
    cmd: &VerifyCmd,
    rpc: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(&cmd.result)?;
    let result: GenerationResult = serde_json::from_str(&contents)?;

    let outcome: VerificationOutcome = if cmd.remote {
        let params = parse_params(&cmd.params)?;
        let request = json!({
            "prompt": cmd.prompt,
            "params": params_to_json(&params),
            "result": result,
        });
        rpc_client::call_method(rpc, "proof/verify", request).await?
    } else {
        verify_local(cmd, &result)?
    };

    match format {
        OutputFormat::Json => println!("{}", output::format_json(&outcome)),
        OutputFormat::Table => {
            let rows = vec![
                FieldRow::new("Proof kind", &result.proof.kind),
                FieldRow::new("Model", &result.provenance.model_id),
                FieldRow::new("Verdict", describe_outcome(&outcome)),
            ];
            println!("{}", output::format_table(&rows));
        }
    }

    if outcome.is_valid() {
        Ok(())
    } else {
        Err(format!("proof did not verify: {}", describe_outcome(&outcome)).into())
    }
}

fn verify_local(
    cmd: &VerifyCmd,
    result: &GenerationResult,
) -> Result<VerificationOutcome, Box<dyn std::error::Error>> {
    let params = parse_params(&cmd.params)?;
    let registry = build_registry(cmd.keys_file.as_deref(), &cmd.trusted_keys)?;
    Ok(verify_claim(&cmd.prompt, &params, result, &registry))
}

fn build_registry(
    keys_file: Option<&str>,
    trusted_keys: &[String],
) -> Result<KeyRegistry, Box<dyn std::error::Error>> {
    let mut registry = match keys_file {
        Some(path) => KeyRegistry::load_from_yaml(path)?,
        None => KeyRegistry::new(),
    };
    for (i, key) in trusted_keys.iter().enumerate() {
        registry.add_key_hex(format!("cli-{}", i), key)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veritext_core::crypto::SigningMaterial;
    use veritext_core::proof::ProofKind;
    use veritext_engine::{EngineConfig, GenerateOptions, MockAdapter, ProofEngine};
    use veritext_verify::FailureReason;

    async fn signed_result(material: SigningMaterial) -> GenerationResult {
        let engine = ProofEngine::new(Arc::new(MockAdapter::demo()), EngineConfig::default())
            .with_signing_material(material);
        let options = GenerateOptions::default().with_proof_kind(ProofKind::SignedAttestation);
        engine.generate("hello", &[], options).await.unwrap()
    }

    fn cmd(trusted_keys: Vec<String>) -> VerifyCmd {
        VerifyCmd {
            result: PathBuf::from("unused.json"),
            prompt: "hello".to_string(),
            params: Vec::new(),
            trusted_keys,
            keys_file: None,
            remote: false,
        }
    }

    #[tokio::test]
    async fn test_local_verify_with_trusted_key() {
        let material = SigningMaterial::generate();
        let public_hex = hex::encode(material.public_key_bytes());
        let result = signed_result(material).await;

        let outcome = verify_local(&cmd(vec![public_hex]), &result).unwrap();
        assert!(outcome.is_valid());

        let outcome = verify_local(&cmd(Vec::new()), &result).unwrap();
        assert_eq!(outcome.reason, Some(FailureReason::UnresolvedKey));
    }

    #[test]
    fn test_bad_trusted_key_is_error() {
        assert!(build_registry(None, &["zz".to_string()]).is_err());
    }
}
