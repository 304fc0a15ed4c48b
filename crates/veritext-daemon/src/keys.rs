// crates/veritext-daemon/src/keys.rs
//
// Signing key loading and the trusted key set served by proof/verify.

use std::io::ErrorKind;

use veritext_core::crypto::SigningMaterial;
use veritext_core::error::VeritextError;
use veritext_verify::KeyRegistry;
use zeroize::Zeroizing;

use crate::config::expand_tilde;

/// Load the engine's signing key from a hex-encoded secret key file.
///
/// A missing file means signing is disabled (`Ok(None)`). A file that
/// exists but does not hold a valid key is an error. The file contents are
/// wiped as soon as the key is parsed.
pub fn load_signing_material(path: &str) -> Result<Option<SigningMaterial>, VeritextError> {
    let path = expand_tilde(path);
    match std::fs::read_to_string(&path).map(Zeroizing::new) {
        Ok(contents) => SigningMaterial::from_secret_hex(contents.trim())
            .map(Some)
            .map_err(|e| VeritextError::Crypto(format!("invalid signing key at {}: {}", path, e))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!("Signing key not found at {}", path);
            Ok(None)
        }
        Err(e) => Err(VeritextError::Crypto(format!(
            "cannot read signing key at {}: {}",
            path, e
        ))),
    }
}

/// Keys trusted by this daemon's verify endpoint: its own signing key (if
/// any) plus the entries of an optional YAML key file.
pub fn build_trust_registry(
    own_key: Option<[u8; 32]>,
    trusted_keys_path: Option<&str>,
) -> Result<KeyRegistry, VeritextError> {
    let mut registry = match trusted_keys_path {
        Some(path) => KeyRegistry::load_from_yaml(&expand_tilde(path))?,
        None => KeyRegistry::new(),
    };
    if let Some(public_key) = own_key {
        registry.add_key("self", public_key);
    }
    Ok(registry)
}
