//! Wallet approval requests routed to the approval dialog.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use portal_client::{ApprovalPrompt, Pubkey};

/// A pending "may this app connect?" question.
pub struct ApprovalRequest {
    pub origin: String,
    pub wallet: Pubkey,
    reply: oneshot::Sender<bool>,
}

impl ApprovalRequest {
    pub fn answer(self, approved: bool) {
        // The connect call may have been dropped; nobody is left to tell.
        let _ = self.reply.send(approved);
    }
}

/// Forwards approval questions to the UI and waits for the answer.
pub struct ChannelPrompt {
    requests: mpsc::UnboundedSender<ApprovalRequest>,
}

impl ChannelPrompt {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ApprovalRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { requests: tx }, rx)
    }
}

#[async_trait]
impl ApprovalPrompt for ChannelPrompt {
    async fn approve(&self, origin: &str, wallet: &Pubkey) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = ApprovalRequest {
            origin: origin.to_string(),
            wallet: *wallet,
            reply,
        };
        if self.requests.send(request).is_err() {
            tracing::warn!("Approval dialog is gone; treating as declined");
            return false;
        }
        answer.await.unwrap_or(false)
    }
}
