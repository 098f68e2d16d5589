//! Error types for the portal client

use thiserror::Error;

use crate::config::ConfigError;
use crate::idl::DecodeError;
use crate::keyring::KeyringError;
use crate::wallet::WalletError;

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Account decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Keyring error: {0}")]
    Keyring(#[from] KeyringError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid transaction: {0}")]
    Transaction(String),

    #[error("Program rejected transaction {signature}: {reason}")]
    ProgramRejected { signature: String, reason: String },

    #[error("Transaction {0} was not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("Account {account} is owned by {owner}, not the portal program")]
    WrongOwner { account: String, owner: String },
}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        Self::JsonParse(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;
