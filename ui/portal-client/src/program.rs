//! Client for the on-chain GIF portal program.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{PortalError, Result};
use crate::idl::{self, BaseAccount, SYSTEM_PROGRAM_ID};
use crate::keys::{Keypair, Pubkey};
use crate::rpc::RpcClient;
use crate::state::Submission;
use crate::transaction::{AccountMeta, Instruction, Message, Transaction};
use crate::wallet::{WalletError, WalletProvider, WalletSlot};

const CONFIRM_INTERVAL: Duration = Duration::from_millis(500);

/// The four remote operations the portal issues. Writes resolve to the
/// transaction signature once confirmed.
#[async_trait]
pub trait PortalProgram: Send + Sync {
    /// Create the storage account, paid for by `owner`. Calling this for an
    /// account that already exists is rejected by the program.
    async fn initialize_account(&self, owner: &Pubkey) -> Result<String>;

    /// `None` when the storage account does not exist.
    async fn fetch_list(&self, account: &Pubkey) -> Result<Option<Vec<Submission>>>;

    async fn append_entry(&self, account: &Pubkey, link: &str, comment: Option<&str>) -> Result<String>;

    async fn clear_list(&self, account: &Pubkey) -> Result<String>;
}

pub struct RpcPortalProgram {
    rpc: RpcClient,
    program_id: Pubkey,
    wallet: WalletSlot,
    base_account: Keypair,
    confirm_polls: u32,
    confirm_interval: Duration,
}

impl RpcPortalProgram {
    pub fn new(config: &Config, wallet: WalletSlot, base_account: Keypair) -> Result<Self> {
        let rpc = RpcClient::new(config.rpc_url(), &config.network.commitment, config.timeout())?;
        tracing::info!("Portal program {} on {}", config.program.program_id, rpc.url());
        Ok(Self::with_client(
            rpc,
            config.program_id()?,
            wallet,
            base_account,
            config.network.confirm_polls,
        ))
    }

    pub fn with_client(
        rpc: RpcClient,
        program_id: Pubkey,
        wallet: WalletSlot,
        base_account: Keypair,
        confirm_polls: u32,
    ) -> Self {
        Self {
            rpc,
            program_id,
            wallet,
            base_account,
            confirm_polls,
            confirm_interval: CONFIRM_INTERVAL,
        }
    }

    pub fn base_account(&self) -> Pubkey {
        self.base_account.pubkey()
    }

    fn wallet(&self) -> Result<Arc<dyn WalletProvider>> {
        self.wallet
            .get()
            .ok_or(PortalError::Wallet(WalletError::NotConnected))
    }

    /// Sign with the wallet (fee payer) and any extra signer, send, and wait
    /// for confirmation.
    async fn submit(&self, instruction: Instruction, extra_signer: Option<&Keypair>) -> Result<String> {
        let wallet = self.wallet()?;
        let payer = wallet.public_key().ok_or(WalletError::NotConnected)?;

        let blockhash = self.rpc.get_latest_blockhash().await?;
        let message = Message::compile(&payer, &[instruction], blockhash)?;
        let mut tx = Transaction::new(message);

        let payer_sig = wallet.sign_message(tx.message_bytes()).await?;
        tx.add_signature(&payer, payer_sig)?;
        if let Some(signer) = extra_signer {
            let sig = signer.sign(tx.message_bytes());
            tx.add_signature(&signer.pubkey(), sig)?;
        }

        let local = tx.signature();
        let signature = self.rpc.send_transaction(&tx.to_base64()?).await?;
        if local.as_deref() != Some(signature.as_str()) {
            tracing::warn!("Node reported signature {} for transaction {:?}", signature, local);
        }
        tracing::debug!("Sent transaction {}", signature);
        self.rpc
            .confirm_transaction(&signature, self.confirm_polls, self.confirm_interval)
            .await?;
        Ok(signature)
    }

    fn user_instruction(&self, account: &Pubkey, user: Pubkey, data: Vec<u8>) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![AccountMeta::new(*account, false), AccountMeta::new(user, true)],
            data,
        }
    }

    fn connected_user(&self) -> Result<Pubkey> {
        Ok(self.wallet()?.public_key().ok_or(WalletError::NotConnected)?)
    }
}

#[async_trait]
impl PortalProgram for RpcPortalProgram {
    async fn initialize_account(&self, owner: &Pubkey) -> Result<String> {
        if self.connected_user()? != *owner {
            return Err(PortalError::Transaction(format!(
                "{owner} is not the connected wallet"
            )));
        }
        let base = self.base_account.pubkey();
        let ix = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(base, true),
                AccountMeta::new(*owner, true),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            data: idl::start_stuff_off_data(),
        };
        let signature = self.submit(ix, Some(&self.base_account)).await?;
        tracing::info!("Created storage account {} ({})", base, signature);
        Ok(signature)
    }

    async fn fetch_list(&self, account: &Pubkey) -> Result<Option<Vec<Submission>>> {
        let Some(info) = self.rpc.get_account_info(account).await? else {
            return Ok(None);
        };
        if info.owner != self.program_id {
            return Err(PortalError::WrongOwner {
                account: account.to_string(),
                owner: info.owner.to_string(),
            });
        }
        let decoded = BaseAccount::decode(&info.data)?;
        tracing::debug!("Storage account holds {} GIF(s)", decoded.total_gifs);
        Ok(Some(decoded.gif_list.into_iter().map(Submission::from).collect()))
    }

    async fn append_entry(&self, account: &Pubkey, link: &str, comment: Option<&str>) -> Result<String> {
        let user = self.connected_user()?;
        let ix = self.user_instruction(account, user, idl::add_gif_data(link, comment));
        self.submit(ix, None).await
    }

    async fn clear_list(&self, account: &Pubkey) -> Result<String> {
        let user = self.connected_user()?;
        let ix = self.user_instruction(account, user, idl::clear_gifs_data());
        self.submit(ix, None).await
    }
}
