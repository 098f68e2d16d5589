//! Signer for the portal's storage account.
//!
//! The storage account is created by `start_stuff_off` and must co-sign that
//! one transaction. A development keypair ships inside the binary so every
//! install talks to the same devnet account.
//!
//! Security:
//! - The bundled key is public to anyone holding the binary. It is only fit
//!   for a single shared test deployment.
//! - Any real deployment must set `base_account.keypair_path` to a key kept
//!   in a proper secret store.

use std::path::Path;

use thiserror::Error;

use crate::keys::{KeyError, Keypair};

const BUNDLED_BASE_ACCOUNT: &str = include_str!("../assets/base_account.json");

#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("Invalid bundled keypair: {0}")]
    Bundled(KeyError),

    #[error("Failed to read keypair {path}: {source}")]
    File { path: String, source: KeyError },
}

/// Which key signs for the storage account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Bundled,
    File,
}

pub fn load_base_account(path: Option<&Path>) -> Result<(Keypair, KeySource), KeyringError> {
    match path {
        Some(path) => {
            let keypair = Keypair::read_file(path).map_err(|source| KeyringError::File {
                path: path.display().to_string(),
                source,
            })?;
            tracing::info!("Storage account signer loaded from {}", path.display());
            Ok((keypair, KeySource::File))
        }
        None => {
            let keypair = bundled_base_account()?;
            tracing::warn!(
                "Using the bundled development key for storage account {}; not for production use",
                keypair.pubkey()
            );
            Ok((keypair, KeySource::Bundled))
        }
    }
}

pub fn bundled_base_account() -> Result<Keypair, KeyringError> {
    Keypair::from_json(BUNDLED_BASE_ACCOUNT).map_err(KeyringError::Bundled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::tests::{TEST_WALLET_ADDRESS, TEST_WALLET_JSON};

    #[test]
    fn test_bundled_key_parses() {
        let (kp, source) = load_base_account(None).unwrap();
        assert_eq!(source, KeySource::Bundled);
        assert_eq!(
            kp.pubkey().to_string(),
            "6VacJDvNiNP9MykwawytpVmyUo9pR8ckgP2JKdyyUD2o"
        );
    }

    #[test]
    fn test_file_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.json");
        std::fs::write(&path, TEST_WALLET_JSON).unwrap();

        let (kp, source) = load_base_account(Some(&path)).unwrap();
        assert_eq!(source, KeySource::File);
        assert_eq!(kp.pubkey().to_string(), TEST_WALLET_ADDRESS);
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_base_account(Some(&dir.path().join("nope.json")));
        assert!(matches!(result, Err(KeyringError::File { .. })));
    }
}
