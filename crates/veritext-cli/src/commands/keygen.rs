// crates/veritext-cli/src/commands/keygen.rs
//
// `veritext keygen`: create the engine's Ed25519 signing key.
//
// Writes `<name>.key` (hex secret, read by veritext-daemon) and `<name>.pub`
// (hex public key, handed to verifiers).

use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

use veritext_core::crypto::SigningMaterial;
use zeroize::Zeroizing;

#[derive(Debug, Args)]
pub struct KeygenCmd {
    /// Directory for the key files (default: ~/.veritext/keys).
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Base name of the key files.
    #[arg(long, default_value = "engine")]
    pub name: String,

    /// Overwrite existing key files.
    #[arg(long)]
    pub force: bool,
}

/// Paths and identity of a freshly written key pair.
#[derive(Debug)]
pub struct KeyFiles {
    pub secret_path: PathBuf,
    pub public_path: PathBuf,
    pub key_id: String,
    pub public_key_hex: String,
}

/// Run the keygen command.
pub async fn run(cmd: &KeygenCmd) -> Result<(), Box<dyn std::error::Error>> {
    let dir = match &cmd.out_dir {
        Some(dir) => dir.clone(),
        None => default_keys_dir()?,
    };
    let files = write_key_pair(&dir, &cmd.name, cmd.force)?;

    println!("Signing key created.");
    println!("  Key id:     {}", files.key_id);
    println!("  Public key: {}", files.public_key_hex);
    println!("  Saved to:   {}", files.public_path.display());
    println!();
    println!("IMPORTANT: Keep the secret key file private.");
    println!("  Secret key: {}", files.secret_path.display());

    Ok(())
}

/// Generate a key pair and write it under `dir`.
pub fn write_key_pair(
    dir: &Path,
    name: &str,
    force: bool,
) -> Result<KeyFiles, Box<dyn std::error::Error>> {
    let secret_path = dir.join(format!("{}.key", name));
    let public_path = dir.join(format!("{}.pub", name));
    if !force && (secret_path.exists() || public_path.exists()) {
        return Err(format!(
            "{} already exists; pass --force to replace it",
            secret_path.display()
        )
        .into());
    }

    let material = SigningMaterial::generate();
    let public_key_hex = hex::encode(material.public_key_bytes());

    fs::create_dir_all(dir)?;
    let secret_hex = Zeroizing::new(hex::encode(material.secret_bytes().as_slice()));
    fs::write(&secret_path, secret_hex.as_bytes())?;
    restrict_permissions(&secret_path)?;
    fs::write(&public_path, &public_key_hex)?;

    Ok(KeyFiles {
        secret_path,
        public_path,
        key_id: material.key_id(),
        public_key_hex,
    })
}

fn default_keys_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".veritext").join("keys"))
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
