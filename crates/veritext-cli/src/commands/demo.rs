// crates/veritext-cli/src/commands/demo.rs
//
// `veritext demo`: run the engine locally against the demo model, then
// check the proof and show that tampering is caught.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;

use veritext_core::crypto::SigningMaterial;
use veritext_core::proof::ProofKind;
use veritext_core::result::GenerationResult;
use veritext_engine::adapter::mock::DEMO_PROMPT;
use veritext_engine::{EngineConfig, GenerateOptions, MockAdapter, ProofEngine};
use veritext_verify::{verify_claim, PinnedKey, VerificationOutcome};

use crate::output::{self, describe_outcome, OutputFormat};

#[derive(Debug, Args)]
pub struct DemoCmd {
    /// Prompt to send to the demo model.
    #[arg(long, default_value = DEMO_PROMPT)]
    pub prompt: String,

    /// Sign the result with a throwaway key.
    #[arg(long)]
    pub signed: bool,
}

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub result: GenerationResult,
    pub proof_available: bool,
    pub verification: VerificationOutcome,
    pub tampered_verification: VerificationOutcome,
}

/// Run the demo command.
pub async fn run(cmd: &DemoCmd, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let report = run_demo(&cmd.prompt, cmd.signed).await?;

    match format {
        OutputFormat::Json => println!("{}", output::format_json(&report)),
        OutputFormat::Table => {
            println!("Generating verifiable text...");
            println!("Response: {}", report.result.content);
            println!("Proof available: {}", report.proof_available);
            println!();
            output::print_result(&report.result, format);
            println!();
            println!("Verification:          {}", describe_outcome(&report.verification));
            println!(
                "Tampered content check: {}",
                describe_outcome(&report.tampered_verification)
            );
        }
    }
    Ok(())
}

/// Generate with the demo engine, verify, then verify a tampered copy.
pub async fn run_demo(
    prompt: &str,
    signed: bool,
) -> Result<DemoReport, Box<dyn std::error::Error>> {
    let material = SigningMaterial::generate();
    let trusted = PinnedKey(material.public_key_bytes());
    let engine = ProofEngine::new(Arc::new(MockAdapter::demo()), EngineConfig::default())
        .with_signing_material(material);

    let kind = if signed {
        ProofKind::SignedAttestation
    } else {
        ProofKind::DigestBinding
    };
    let result = engine
        .generate(prompt, &[], GenerateOptions::default().with_proof_kind(kind))
        .await?;

    let verification = verify_claim(prompt, &[], &result, &trusted);

    let mut tampered = result.clone();
    tampered.content.push('!');
    let tampered_verification = verify_claim(prompt, &[], &tampered, &trusted);

    Ok(DemoReport {
        proof_available: !result.proof.digest.is_empty(),
        result,
        verification,
        tampered_verification,
    })
}
