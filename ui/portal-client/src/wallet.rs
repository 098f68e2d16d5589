//! Wallet bridge.
//!
//! `WalletProvider` is the capability the portal needs from a wallet:
//! connect (silently, or with the user's approval), disconnect, sign.
//! `KeypairFileWallet` provides it from a Solana CLI keypair file, with the
//! apps the user approved remembered in a trust file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use crate::keys::{KeyError, Keypair, Pubkey, SIGNATURE_LEN};

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("user declined the connection request")]
    Declined,

    #[error("app is not trusted by this wallet yet")]
    NotTrusted,

    #[error("wallet is not connected")]
    NotConnected,

    #[error("keypair error: {0}")]
    Keypair(#[from] KeyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Never prompt; fail with `NotTrusted` unless the user approved this
    /// app before.
    pub only_if_trusted: bool,
}

impl ConnectOptions {
    pub fn trusted() -> Self {
        Self { only_if_trusted: true }
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn connect(&self, opts: ConnectOptions) -> Result<Pubkey, WalletError>;

    async fn disconnect(&self);

    fn public_key(&self) -> Option<Pubkey>;

    async fn sign_message(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], WalletError>;
}

/// Asks the user whether `origin` may connect to `wallet`.
#[async_trait]
pub trait ApprovalPrompt: Send + Sync {
    async fn approve(&self, origin: &str, wallet: &Pubkey) -> bool;
}

/// Approved wallets per app origin, persisted as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustStore {
    #[serde(default)]
    origins: BTreeMap<String, Vec<Pubkey>>,
}

impl TrustStore {
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn is_trusted(&self, origin: &str, wallet: &Pubkey) -> bool {
        self.origins
            .get(origin)
            .map_or(false, |keys| keys.contains(wallet))
    }

    pub fn trust(&mut self, origin: &str, wallet: Pubkey) {
        let keys = self.origins.entry(origin.to_string()).or_default();
        if !keys.contains(&wallet) {
            keys.push(wallet);
        }
    }
}

pub struct KeypairFileWallet {
    keypair_path: PathBuf,
    trust_path: PathBuf,
    origin: String,
    trust: Mutex<TrustStore>,
    prompt: Arc<dyn ApprovalPrompt>,
    connected: Mutex<Option<Keypair>>,
}

impl KeypairFileWallet {
    pub fn new(
        keypair_path: PathBuf,
        trust_path: PathBuf,
        origin: &str,
        prompt: Arc<dyn ApprovalPrompt>,
    ) -> Self {
        let trust = TrustStore::load(&trust_path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable trust file {}: {}", trust_path.display(), e);
            TrustStore::default()
        });
        Self {
            keypair_path,
            trust_path,
            origin: origin.to_string(),
            trust: Mutex::new(trust),
            prompt,
            connected: Mutex::new(None),
        }
    }
}

#[async_trait]
impl WalletProvider for KeypairFileWallet {
    fn name(&self) -> &str {
        "keypair file"
    }

    async fn connect(&self, opts: ConnectOptions) -> Result<Pubkey, WalletError> {
        let keypair = Keypair::read_file(&self.keypair_path)?;
        let pubkey = keypair.pubkey();

        let trusted = self.trust.lock().is_trusted(&self.origin, &pubkey);
        if !trusted {
            if opts.only_if_trusted {
                return Err(WalletError::NotTrusted);
            }
            if !self.prompt.approve(&self.origin, &pubkey).await {
                return Err(WalletError::Declined);
            }
            let mut trust = self.trust.lock();
            trust.trust(&self.origin, pubkey);
            trust.save(&self.trust_path)?;
        }

        *self.connected.lock() = Some(keypair);
        Ok(pubkey)
    }

    async fn disconnect(&self) {
        *self.connected.lock() = None;
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected.lock().as_ref().map(Keypair::pubkey)
    }

    async fn sign_message(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], WalletError> {
        self.connected
            .lock()
            .as_ref()
            .map(|kp| kp.sign(message))
            .ok_or(WalletError::NotConnected)
    }
}

/// The wallet available to this app, or `None` when there is no keypair to
/// connect with: the "no wallet installed" case.
pub fn detect_wallet(config: &Config, prompt: Arc<dyn ApprovalPrompt>) -> Option<Arc<dyn WalletProvider>> {
    let keypair_path = config.wallet.keypair_path.clone();
    if !keypair_path.exists() {
        tracing::info!("No wallet keypair at {}", keypair_path.display());
        return None;
    }
    tracing::info!("Wallet keypair found at {}", keypair_path.display());
    Some(Arc::new(KeypairFileWallet::new(
        keypair_path,
        config.wallet.trust_file.clone(),
        &config.origin(),
        prompt,
    )))
}

type Detector = dyn Fn() -> Option<Arc<dyn WalletProvider>> + Send + Sync;

/// The app's wallet, shared by the actions and the program client. When
/// built with a detector, a missing wallet is looked for again on the next
/// connect attempt, so a keypair created after start-up is picked up.
#[derive(Clone)]
pub struct WalletSlot {
    current: Arc<Mutex<Option<Arc<dyn WalletProvider>>>>,
    detect: Option<Arc<Detector>>,
}

impl WalletSlot {
    pub fn fixed(wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            current: Arc::new(Mutex::new(wallet)),
            detect: None,
        }
    }

    /// Runs `detect` now and again on every `find` until it yields a wallet.
    pub fn detecting(detect: impl Fn() -> Option<Arc<dyn WalletProvider>> + Send + Sync + 'static) -> Self {
        let current = detect();
        Self {
            current: Arc::new(Mutex::new(current)),
            detect: Some(Arc::new(detect)),
        }
    }

    /// The wallet found so far.
    pub fn get(&self) -> Option<Arc<dyn WalletProvider>> {
        self.current.lock().clone()
    }

    pub fn find(&self) -> Option<Arc<dyn WalletProvider>> {
        let mut current = self.current.lock();
        if current.is_none() {
            if let Some(detect) = &self.detect {
                *current = detect();
            }
        }
        current.clone()
    }
}
