//! Portal configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::idl;
use crate::keys::Pubkey;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid program id: {0}")]
    ProgramId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn api_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Localnet => "localnet",
        }
    }
}

/// Global portal configuration. Every section and key is optional in the
/// file; missing ones take the defaults below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub program: ProgramConfig,
    pub wallet: WalletConfig,
    pub base_account: BaseAccountConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub cluster: Cluster,
    /// Overrides the cluster's public endpoint.
    pub rpc_url: Option<String>,
    pub commitment: String,
    pub timeout_secs: u64,
    pub confirm_polls: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::Devnet,
            rpc_url: None,
            commitment: "processed".to_string(),
            timeout_secs: 30,
            confirm_polls: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    pub program_id: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            program_id: idl::PROGRAM_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub keypair_path: PathBuf,
    pub trust_file: PathBuf,
}

impl Default for WalletConfig {
    fn default() -> Self {
        let solana_id = dirs::home_dir()
            .map(|h| h.join(".config").join("solana").join("id.json"))
            .unwrap_or_else(|| PathBuf::from("id.json"));
        Self {
            keypair_path: solana_id,
            trust_file: Config::portal_dir().join("trusted-apps.json"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseAccountConfig {
    /// Signer for the storage account. Falls back to the bundled dev key.
    pub keypair_path: Option<PathBuf>,
}

impl Config {
    /// Load config from file, or create default
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn portal_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".scene-portal"))
            .unwrap_or_else(|| PathBuf::from(".scene-portal"))
    }

    pub fn config_path() -> PathBuf {
        Self::portal_dir().join("config.toml")
    }

    pub fn rpc_url(&self) -> &str {
        self.network
            .rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.cluster.api_url())
    }

    pub fn program_id(&self) -> Result<Pubkey, ConfigError> {
        self.program
            .program_id
            .parse()
            .map_err(|e| ConfigError::ProgramId(format!("{}: {e}", self.program.program_id)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }

    /// Identifies this app to the wallet's trust list.
    pub fn origin(&self) -> String {
        format!("scene-portal@{}", self.network.cluster.label())
    }
}
