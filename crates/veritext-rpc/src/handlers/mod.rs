// crates/veritext-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints. Each module defines its request and
// response types and the handler functions for one API group.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};

use veritext_core::request::{GenerationParam, ParamValue};

pub mod generate;
pub mod keys;
pub mod node;
pub mod verify;

/// Generation parameters as sent over the wire: `{"temperature": 0.2}`.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Deserialize a [`ParamMap`], failing on a repeated parameter name instead
/// of keeping the last value.
pub fn unique_params<'de, D>(deserializer: D) -> Result<ParamMap, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(UniqueParamsVisitor)
}

struct UniqueParamsVisitor;

impl<'de> Visitor<'de> for UniqueParamsVisitor {
    type Value = ParamMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of parameter names to values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ParamMap, A::Error> {
        let mut params = ParamMap::new();
        while let Some(name) = access.next_key::<String>()? {
            if params.contains_key(&name) {
                return Err(de::Error::custom(format!("duplicate parameter '{}'", name)));
            }
            let value = access.next_value::<ParamValue>()?;
            params.insert(name, value);
        }
        Ok(params)
    }
}

pub(crate) fn to_params(map: &ParamMap) -> Vec<GenerationParam> {
    map.iter()
        .map(|(name, value)| GenerationParam::new(name.clone(), value.clone()))
        .collect()
}
