// crates/veritext-cli/src/output.rs
//
// Output formatting utilities for the Veritext CLI.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use veritext_core::result::GenerationResult;
use veritext_verify::VerificationOutcome;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// One `field | value` line of a detail table.
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data)
        .unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Detail rows describing a generation result.
pub fn result_rows(result: &GenerationResult) -> Vec<FieldRow> {
    let mut rows = vec![
        FieldRow::new("Content", &result.content),
        FieldRow::new("Model", &result.provenance.model_id),
        FieldRow::new("Model version", &result.provenance.model_version),
        FieldRow::new("Generated at", result.provenance.timestamp.to_rfc3339()),
        FieldRow::new("Nonce", &result.provenance.nonce),
        FieldRow::new("Proof kind", &result.proof.kind),
        FieldRow::new("Digest", format!("{}:{}", result.proof.digest_algorithm, result.proof.digest)),
    ];
    if let Some(sig) = &result.proof.signature {
        rows.push(FieldRow::new("Signed by", &sig.key_id));
    }
    rows
}

/// Human-readable verification verdict.
pub fn describe_outcome(outcome: &VerificationOutcome) -> String {
    match outcome.reason {
        None => "VALID".to_string(),
        Some(reason) => format!("INVALID ({})", reason),
    }
}

/// Print a generation result in the chosen format.
pub fn print_result(result: &GenerationResult, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", format_json(result)),
        OutputFormat::Table => println!("{}", format_table(&result_rows(result))),
    }
}
