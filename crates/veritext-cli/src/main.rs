// crates/veritext-cli/src/main.rs
//
// CLI entrypoint for the Veritext tools.
//
// Generates signing keys, runs a local demo, and talks to veritext-daemon
// to generate and verify proof-carrying text.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};
use commands::demo::DemoCmd;
use commands::generate::GenerateCmd;
use commands::keygen::KeygenCmd;
use commands::verify::VerifyCmd;
use output::OutputFormat;

/// Veritext CLI: proof-carrying text generation.
#[derive(Parser, Debug)]
#[command(
    name = "veritext",
    version = "0.1.0",
    about = "Veritext CLI: generate text with verifiable proofs, and check them"
)]
struct Cli {
    /// RPC endpoint of veritext-daemon.
    #[arg(long, global = true, default_value = "http://localhost:50051")]
    rpc: String,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Create an Ed25519 signing key for the daemon.
    Keygen(KeygenCmd),

    /// Generate and verify locally with the demo model.
    Demo(DemoCmd),

    /// Generate verifiable text.
    Generate(GenerateCmd),

    /// Verify a saved result.
    Verify(VerifyCmd),

    /// Display daemon health and identity.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let format = OutputFormat::from_json_flag(cli.json);

    match &cli.command {
        Commands::Keygen(cmd) => commands::keygen::run(cmd).await?,
        Commands::Demo(cmd) => commands::demo::run(cmd, format).await?,
        Commands::Generate(cmd) => commands::generate::run(cmd, &cli.rpc, format).await?,
        Commands::Verify(cmd) => commands::verify::run(cmd, &cli.rpc, format).await?,
        Commands::Status => commands::status::run(&cli.rpc, format).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "veritext",
            "--json",
            "generate",
            "hello",
            "-p",
            "temperature=0.2",
            "--proof-kind",
            "signed-attestation",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Generate(cmd) => {
                assert_eq!(cmd.prompt, "hello");
                assert_eq!(cmd.params, vec!["temperature=0.2".to_string()]);
                assert_eq!(
                    cmd.proof_kind,
                    Some(veritext_core::proof::ProofKind::SignedAttestation)
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
