// crates/veritext-verify/src/keys.rs
//
// KeyRegistry: the set of engine public keys a verifier is willing to trust.
//
// The registry is a TrustContext: it resolves the key reference carried in a
// signed attestation to a public key. Keys can be added programmatically or
// loaded from a YAML file of the form:
//
//   keys:
//     - label: engine-prod
//       public_key: 3d4017c3e843895a92b70aa74d1b7ebc9c982ccf2ec4968cc0cd55f12af4660c

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use veritext_core::crypto::{key_id, parse_public_key_hex};
use veritext_core::error::VeritextError;
use veritext_core::traits::TrustContext;

/// A trusted engine key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedKey {
    /// Key reference as it appears in signed artifacts.
    pub key_id: String,
    /// Human-readable label (e.g., "engine-prod").
    pub label: String,
    /// Hex-encoded Ed25519 public key.
    pub public_key: String,
}

#[derive(Debug, Deserialize)]
struct YamlKeyFile {
    #[serde(default)]
    keys: Vec<YamlKeyEntry>,
}

#[derive(Debug, Deserialize)]
struct YamlKeyEntry {
    label: String,
    public_key: String,
}

/// Registry of trusted public keys, indexed by key reference.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: BTreeMap<String, ([u8; 32], TrustedKey)>,
}

impl KeyRegistry {
    /// Create a new empty KeyRegistry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `public_key` under `label`. Returns its key reference.
    pub fn add_key(&mut self, label: impl Into<String>, public_key: [u8; 32]) -> String {
        let id = key_id(&public_key);
        let entry = TrustedKey {
            key_id: id.clone(),
            label: label.into(),
            public_key: hex::encode(public_key),
        };
        self.keys.insert(id.clone(), (public_key, entry));
        id
    }

    /// Trust a hex-encoded public key.
    pub fn add_key_hex(
        &mut self,
        label: impl Into<String>,
        public_key_hex: &str,
    ) -> Result<String, VeritextError> {
        let key = parse_public_key_hex(public_key_hex)?;
        Ok(self.add_key(label, key))
    }

    /// Parse a registry from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, VeritextError> {
        let file: YamlKeyFile = serde_yaml::from_str(contents)
            .map_err(|e| VeritextError::Serialization(format!("invalid key file: {}", e)))?;
        let mut registry = Self::new();
        for entry in file.keys {
            registry.add_key_hex(entry.label, &entry.public_key)?;
        }
        Ok(registry)
    }

    /// Load a registry from a YAML file on disk.
    pub fn load_from_yaml(path: &str) -> Result<Self, VeritextError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VeritextError::Serialization(format!("cannot read key file {}: {}", path, e))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// All trusted keys, ordered by key reference.
    pub fn list(&self) -> Vec<&TrustedKey> {
        self.keys.values().map(|(_, entry)| entry).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl TrustContext for KeyRegistry {
    fn resolve(&self, key_id: &str) -> Option<[u8; 32]> {
        self.keys.get(key_id).map(|(key, _)| *key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritext_core::crypto::SigningMaterial;

    #[test]
    fn test_add_and_resolve() {
        let material = SigningMaterial::generate();
        let mut registry = KeyRegistry::new();
        let id = registry.add_key("engine", material.public_key_bytes());

        assert_eq!(id, material.key_id());
        assert_eq!(registry.resolve(&id), Some(material.public_key_bytes()));
        assert_eq!(registry.resolve("ed25519:unknown"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_from_yaml_str() {
        let a = SigningMaterial::generate();
        let b = SigningMaterial::generate();
        let yaml = format!(
            "keys:\n  - label: prod\n    public_key: {}\n  - label: staging\n    public_key: {}\n",
            hex::encode(a.public_key_bytes()),
            hex::encode(b.public_key_bytes())
        );
        let registry = KeyRegistry::from_yaml_str(&yaml).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.resolve(&a.key_id()).is_some());
        assert!(registry.list().iter().any(|k| k.label == "staging"));
    }

    #[test]
    fn test_yaml_with_bad_key_fails() {
        let yaml = "keys:\n  - label: broken\n    public_key: abcd\n";
        assert!(KeyRegistry::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_empty_yaml_is_empty_registry() {
        let registry = KeyRegistry::from_yaml_str("keys: []\n").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_missing_file() {
        assert!(KeyRegistry::load_from_yaml("/nonexistent/veritext/keys.yaml").is_err());
    }
}
