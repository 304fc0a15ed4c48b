// crates/veritext-core/src/request.rs
//
// Request canonicalization: raw prompt + generation parameters in,
// deterministic RequestDescriptor out.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use crate::encoding::{CanonicalWriter, REQUEST_DOMAIN};
use crate::error::VeritextError;

/// Default upper bound on prompt length, in Unicode scalar values.
pub const DEFAULT_MAX_PROMPT_CHARS: usize = 8192;

const TAG_BOOL: u8 = 0;
const TAG_INT: u8 = 1;
const TAG_FLOAT: u8 = 2;
const TAG_TEXT: u8 = 3;

/// A typed generation parameter value.
///
/// On the JSON wire values are untagged: `true`, `42`, `0.7`, `"text"`.
/// Integers must fit in an `i64`; larger ones are rejected rather than
/// rounded into a float.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Interpret a command-line literal: booleans, then integers, then
    /// floats, falling back to text. Integer literals outside the `i64`
    /// range stay text so that no digit is lost.
    pub fn parse_literal(raw: &str) -> Self {
        match raw {
            "true" => return ParamValue::Bool(true),
            "false" => return ParamValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = raw.parse::<i64>() {
            return ParamValue::Int(i);
        }
        if is_integer_literal(raw) {
            return ParamValue::Text(raw.to_string());
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return ParamValue::Float(f);
            }
        }
        ParamValue::Text(raw.to_string())
    }

    fn canonical(&self) -> Result<ParamValue, VeritextError> {
        match self {
            ParamValue::Float(f) if !f.is_finite() => Err(VeritextError::InvalidRequest(
                "float parameters must be finite".to_string(),
            )),
            // -0.0 and 0.0 are the same parameter.
            ParamValue::Float(f) if *f == 0.0 => Ok(ParamValue::Float(0.0)),
            ParamValue::Text(s) => Ok(ParamValue::Text(normalize_newlines(s))),
            other => Ok(other.clone()),
        }
    }

    fn encode(&self, writer: &mut CanonicalWriter) {
        match self {
            ParamValue::Bool(b) => {
                writer.put_u8(TAG_BOOL).put_u8(u8::from(*b));
            }
            ParamValue::Int(i) => {
                writer.put_u8(TAG_INT).put_i64(*i);
            }
            ParamValue::Float(f) => {
                writer.put_u8(TAG_FLOAT).put_u64(f.to_bits());
            }
            ParamValue::Text(s) => {
                writer.put_u8(TAG_TEXT).put_str(s);
            }
        }
    }
}

fn is_integer_literal(raw: &str) -> bool {
    let digits = raw.strip_prefix(|c| c == '-' || c == '+').unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ParamValueVisitor)
    }
}

struct ParamValueVisitor;

impl<'de> Visitor<'de> for ParamValueVisitor {
    type Value = ParamValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, a 64-bit signed integer, a float or a string")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ParamValue, E> {
        Ok(ParamValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ParamValue, E> {
        Ok(ParamValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ParamValue, E> {
        i64::try_from(v).map(ParamValue::Int).map_err(|_| {
            E::custom(format!(
                "integer parameter {} is out of range (max {})",
                v,
                i64::MAX
            ))
        })
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<ParamValue, E> {
        i64::try_from(v).map(ParamValue::Int).map_err(|_| {
            E::custom(format!("integer parameter {} is out of range", v))
        })
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<ParamValue, E> {
        i64::try_from(v).map(ParamValue::Int).map_err(|_| {
            E::custom(format!("integer parameter {} is out of range", v))
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ParamValue, E> {
        Ok(ParamValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ParamValue, E> {
        Ok(ParamValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ParamValue, E> {
        Ok(ParamValue::Text(v))
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

/// A single name/value generation parameter (e.g. `temperature = 0.2`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParam {
    pub name: String,
    pub value: ParamValue,
}

impl GenerationParam {
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a `name=value` assignment as given on the command line.
    pub fn from_assignment(raw: &str) -> Result<Self, VeritextError> {
        let (name, value) = raw.split_once('=').ok_or_else(|| {
            VeritextError::InvalidRequest(format!("expected name=value, got '{}'", raw))
        })?;
        Ok(Self::new(name, ParamValue::parse_literal(value)))
    }
}

/// Canonical form of a generation request.
///
/// Built only by [`Canonicalizer`]; the prompt, parameters and the canonical
/// encoding can be read but never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    prompt: String,
    params: Vec<GenerationParam>,
    encoded: Vec<u8>,
}

impl RequestDescriptor {
    /// The normalized prompt text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Parameters, sorted by name.
    pub fn params(&self) -> &[GenerationParam] {
        &self.params
    }

    /// Look up a parameter by (normalized) name.
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .binary_search_by(|p| p.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.params[idx].value)
    }

    /// The deterministic byte encoding of this descriptor.
    pub fn canonical_bytes(&self) -> &[u8] {
        &self.encoded
    }
}

/// Turns raw requests into [`RequestDescriptor`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canonicalizer {
    max_prompt_chars: Option<usize>,
}

impl Canonicalizer {
    /// Canonicalizer enforcing the given prompt length limit.
    pub fn new(max_prompt_chars: usize) -> Self {
        Self {
            max_prompt_chars: Some(max_prompt_chars),
        }
    }

    /// Canonicalizer without a length limit. Verifiers use this to
    /// reconstruct requests accepted under any generator's limit.
    pub fn unbounded() -> Self {
        Self {
            max_prompt_chars: None,
        }
    }

    /// Canonicalize a prompt and its parameters.
    ///
    /// # Errors
    /// `InvalidRequest` when the prompt is empty after normalization, longer
    /// than the configured limit, or when a parameter name is empty, contains
    /// characters outside `[a-z0-9_.-]`, or is duplicated.
    pub fn canonicalize(
        &self,
        prompt: &str,
        params: &[GenerationParam],
    ) -> Result<RequestDescriptor, VeritextError> {
        let prompt = normalize_newlines(prompt).trim().to_string();
        if prompt.is_empty() {
            return Err(VeritextError::InvalidRequest("prompt is empty".to_string()));
        }
        if let Some(max) = self.max_prompt_chars {
            let chars = prompt.chars().count();
            if chars > max {
                return Err(VeritextError::InvalidRequest(format!(
                    "prompt is {} characters, limit is {}",
                    chars, max
                )));
            }
        }

        let mut by_name: BTreeMap<String, ParamValue> = BTreeMap::new();
        for param in params {
            let name = normalize_param_name(&param.name)?;
            let value = param.value.canonical()?;
            if by_name.insert(name.clone(), value).is_some() {
                return Err(VeritextError::InvalidRequest(format!(
                    "duplicate parameter '{}'",
                    name
                )));
            }
        }
        let params: Vec<GenerationParam> = by_name
            .into_iter()
            .map(|(name, value)| GenerationParam { name, value })
            .collect();

        let mut writer = CanonicalWriter::new(REQUEST_DOMAIN);
        writer.put_str(&prompt).put_u64(params.len() as u64);
        for param in &params {
            writer.put_str(&param.name);
            param.value.encode(&mut writer);
        }

        Ok(RequestDescriptor {
            prompt,
            params,
            encoded: writer.finish(),
        })
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROMPT_CHARS)
    }
}

/// Canonicalize with the default prompt length limit.
pub fn canonicalize(
    prompt: &str,
    params: &[GenerationParam],
) -> Result<RequestDescriptor, VeritextError> {
    Canonicalizer::default().canonicalize(prompt, params)
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

fn normalize_param_name(raw: &str) -> Result<String, VeritextError> {
    let name = raw.trim().to_ascii_lowercase();
    if name.is_empty() {
        return Err(VeritextError::InvalidRequest(
            "parameter name is empty".to_string(),
        ));
    }
    let valid = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'.' | b'-'));
    if !valid {
        return Err(VeritextError::InvalidRequest(format!(
            "parameter name '{}' contains invalid characters",
            raw
        )));
    }
    Ok(name)
}
