//! Ed25519 addresses and keypairs in the formats the Solana tooling writes.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ed25519_dalek::{Signer, SigningKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PUBKEY_LEN: usize = 32;
pub const KEYPAIR_LEN: usize = 64;
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A 32-byte account address, shown as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pubkey([u8; PUBKEY_LEN]);

impl Pubkey {
    pub const fn new_from_array(bytes: [u8; PUBKEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; PUBKEY_LEN] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: PUBKEY_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; PUBKEY_LEN] {
        &self.0
    }
}

impl FromStr for Pubkey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| KeyError::InvalidBase58(e.to_string()))?;
        Self::try_from_slice(&bytes)
    }
}

impl TryFrom<String> for Pubkey {
    type Error = KeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Pubkey> for String {
    fn from(key: Pubkey) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

/// Signing keypair. The 64-byte form is `secret seed || public key`, the
/// layout `solana-keygen` and web3.js both use.
#[derive(Clone)]
pub struct Keypair {
    signing: SigningKey,
}

impl Keypair {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; KEYPAIR_LEN] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEYPAIR_LEN,
            actual: bytes.len(),
        })?;
        let signing = SigningKey::from_keypair_bytes(&arr)
            .map_err(|e| KeyError::InvalidKeypair(e.to_string()))?;
        Ok(Self { signing })
    }

    /// Parse either a Solana CLI keypair file (a JSON array of 64 numbers) or
    /// a serialized web3.js `Keypair` (`{"_keypair": {"secretKey": {"0": n, ..}}}`).
    pub fn from_json(json: &str) -> Result<Self, KeyError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let bytes = match &value {
            serde_json::Value::Array(items) => items
                .iter()
                .map(json_byte)
                .collect::<Result<Vec<u8>, KeyError>>()?,
            serde_json::Value::Object(_) => {
                let secret = value
                    .get("_keypair")
                    .and_then(|kp| kp.get("secretKey"))
                    .and_then(|sk| sk.as_object())
                    .ok_or_else(|| KeyError::InvalidKeypair("missing _keypair.secretKey".into()))?;
                (0..secret.len())
                    .map(|i| {
                        secret
                            .get(&i.to_string())
                            .ok_or_else(|| KeyError::InvalidKeypair(format!("missing byte {i}")))
                            .and_then(json_byte)
                    })
                    .collect::<Result<Vec<u8>, KeyError>>()?
            }
            _ => return Err(KeyError::InvalidKeypair("unsupported keypair JSON".into())),
        };
        Self::from_bytes(&bytes)
    }

    pub fn read_file(path: &Path) -> Result<Self, KeyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Solana CLI array form.
    #[cfg(test)]
    pub(crate) fn to_json(&self) -> String {
        let bytes = self.signing.to_keypair_bytes();
        serde_json::Value::from(bytes.to_vec()).to_string()
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey(self.signing.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.signing.sign(message).to_bytes()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair").field("pubkey", &self.pubkey()).finish()
    }
}

fn json_byte(v: &serde_json::Value) -> Result<u8, KeyError> {
    v.as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| KeyError::InvalidKeypair(format!("not a byte: {v}")))
}
