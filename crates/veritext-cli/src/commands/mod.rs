// crates/veritext-cli/src/commands/mod.rs
//
// Command module declarations for the Veritext CLI.

use veritext_core::error::VeritextError;
use veritext_core::request::GenerationParam;

pub mod demo;
pub mod generate;
pub mod keygen;
pub mod status;
pub mod verify;

/// Parse repeated `--param name=value` flags. Naming a parameter twice is
/// an error; the wire form is a map and cannot carry both values.
pub fn parse_params(raw: &[String]) -> Result<Vec<GenerationParam>, VeritextError> {
    let mut params: Vec<GenerationParam> = Vec::with_capacity(raw.len());
    for assignment in raw {
        let param = GenerationParam::from_assignment(assignment)?;
        if params.iter().any(|p| p.name == param.name) {
            return Err(VeritextError::InvalidRequest(format!(
                "duplicate parameter '{}'",
                param.name
            )));
        }
        params.push(param);
    }
    Ok(params)
}

/// Wire form of parameters: `{"name": value}`.
pub fn params_to_json(params: &[GenerationParam]) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = params
        .iter()
        .map(|p| {
            (
                p.name.clone(),
                serde_json::to_value(&p.value).unwrap_or(serde_json::Value::Null),
            )
        })
        .collect();
    serde_json::Value::Object(map)
}
