//! User actions.
//!
//! Every write goes to the program first and is followed by a full re-fetch
//! of the storage account; the list in `PortalState` is only ever replaced
//! by a fetch result. A failed remote call is logged and leaves the view as
//! it was.

use std::sync::Arc;

use crate::keys::Pubkey;
use crate::program::PortalProgram;
use crate::state::{NoticeKind, PortalState, SubmissionList};
use crate::wallet::{ConnectOptions, WalletError, WalletProvider, WalletSlot};

pub const WALLET_MISSING: &str =
    "To sign in, create a Solana wallet keypair with `solana-keygen new` 👻";
pub const SIGNED_IN: &str = "You're signed in!";
pub const SIGNED_OUT: &str = "You've signed out!";
pub const GIF_SENT: &str = "GIF Sent!";
pub const GIFS_CLEARED: &str = "GIFs Cleared!";

/// Handle to wherever the portal state lives (a Dioxus signal in the app).
pub trait PortalView {
    fn update<R>(&self, f: impl FnOnce(&mut PortalState) -> R) -> R;

    fn read<R>(&self, f: impl FnOnce(&PortalState) -> R) -> R;
}

#[derive(Clone)]
pub struct Portal {
    wallet: WalletSlot,
    program: Arc<dyn PortalProgram>,
    base_account: Pubkey,
}

/// Two handles are equal when they drive the same program client.
impl PartialEq for Portal {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.program, &other.program) && self.base_account == other.base_account
    }
}

impl Portal {
    pub fn new(
        wallet: WalletSlot,
        program: Arc<dyn PortalProgram>,
        base_account: Pubkey,
    ) -> Self {
        Self { wallet, program, base_account }
    }

    pub fn base_account(&self) -> Pubkey {
        self.base_account
    }

    /// Start-up reconnect. Never prompts; an untrusted wallet just leaves the
    /// user signed out.
    pub async fn check_if_wallet_is_connected(&self, view: &impl PortalView) {
        let Some(wallet) = self.wallet.find() else {
            view.update(|s| s.push_notice(NoticeKind::Info, WALLET_MISSING));
            return;
        };
        tracing::info!("Wallet found: {}", wallet.name());

        match wallet.connect(ConnectOptions::trusted()).await {
            Ok(key) => {
                tracing::info!("Connected with Public Key: {}", key);
                view.update(|s| s.sign_in(key));
                self.refresh(view).await;
            }
            Err(e) => tracing::debug!("No trusted connection: {}", e),
        }
    }

    pub async fn connect_wallet(&self, view: &impl PortalView) {
        let Some(wallet) = self.wallet.find() else {
            view.update(|s| s.push_notice(NoticeKind::Info, WALLET_MISSING));
            return;
        };

        match wallet.connect(ConnectOptions::default()).await {
            Ok(key) => {
                tracing::info!("Connected with Public Key: {}", key);
                view.update(|s| {
                    s.sign_in(key);
                    s.push_notice(NoticeKind::Success, SIGNED_IN);
                });
                self.refresh(view).await;
            }
            Err(WalletError::Declined) => {
                tracing::info!("Wallet connection declined");
                view.update(PortalState::sign_out);
            }
            Err(e) => {
                tracing::error!("Wallet connection failed: {}", e);
                view.update(PortalState::sign_out);
            }
        }
    }

    pub async fn disconnect_wallet(&self, view: &impl PortalView) {
        view.update(|s| {
            s.sign_out();
            s.push_notice(NoticeKind::Success, SIGNED_OUT);
        });
        if let Some(wallet) = self.wallet.get() {
            wallet.disconnect().await;
        }
        tracing::info!("Wallet disconnected");
    }

    /// Re-read the storage account. Returns whether the view's list was
    /// replaced.
    pub async fn refresh(&self, view: &impl PortalView) -> bool {
        let seq = view.update(PortalState::begin_refresh);
        tracing::info!("Fetching GIF list...");

        let list = match self.program.fetch_list(&self.base_account).await {
            Ok(Some(items)) => {
                tracing::info!("Got the account: {} GIF(s)", items.len());
                SubmissionList::Loaded(items)
            }
            Ok(None) => {
                tracing::info!("Storage account {} not created yet", self.base_account);
                SubmissionList::Uninitialized
            }
            Err(e) => {
                tracing::error!("Error in refresh: {}", e);
                return false;
            }
        };
        view.update(|s| s.finish_refresh(seq, list))
    }

    pub async fn create_gif_account(&self, view: &impl PortalView) {
        let Some(owner) = view.read(|s| s.wallet_address) else {
            tracing::warn!("Initialization requested while signed out");
            return;
        };

        view.update(|s| s.pending_writes += 1);
        match self.program.initialize_account(&owner).await {
            Ok(signature) => {
                tracing::info!(
                    "Created a new storage account w/ address: {} ({})",
                    self.base_account,
                    signature
                );
                self.refresh(view).await;
            }
            Err(e) => tracing::error!("Error creating storage account: {}", e),
        }
        view.update(|s| s.pending_writes -= 1);
    }

    pub async fn send_gif(&self, view: &impl PortalView) {
        let (signed_in, link, comment) = view.read(|s| {
            (
                s.wallet_address.is_some(),
                s.input_value.trim().to_string(),
                Some(s.comment_value.trim().to_string()).filter(|c| !c.is_empty()),
            )
        });
        if link.is_empty() {
            tracing::info!("No gif link given!");
            return;
        }
        if !signed_in {
            tracing::warn!("Submission requested while signed out");
            return;
        }
        tracing::info!("Gif link: {}", link);

        view.update(|s| s.pending_writes += 1);
        match self
            .program
            .append_entry(&self.base_account, &link, comment.as_deref())
            .await
        {
            Ok(signature) => {
                tracing::info!("Gif successfully sent to program: {} ({})", link, signature);
                // Keep anything typed while the write was in flight.
                view.update(|s| {
                    if s.input_value.trim() == link {
                        s.input_value.clear();
                        s.comment_value.clear();
                    }
                });
                self.refresh(view).await;
                view.update(|s| s.push_notice(NoticeKind::Success, GIF_SENT));
            }
            Err(e) => tracing::error!("Error sending GIF: {}", e),
        }
        view.update(|s| s.pending_writes -= 1);
    }

    pub async fn clear_gifs(&self, view: &impl PortalView) {
        if view.read(|s| s.wallet_address.is_none()) {
            tracing::warn!("Clear requested while signed out");
            return;
        }

        view.update(|s| s.pending_writes += 1);
        match self.program.clear_list(&self.base_account).await {
            Ok(signature) => {
                tracing::info!("Gifs cleared ({})", signature);
                self.refresh(view).await;
                view.update(|s| s.push_notice(NoticeKind::Success, GIFS_CLEARED));
            }
            Err(e) => tracing::error!("Error clearing GIFs: {}", e),
        }
        view.update(|s| s.pending_writes -= 1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::*;
    use crate::error::{PortalError, Result};
    use crate::state::{Submission, ViewMode};

    const LINK: &str = "https://example.com/a.gif";

    struct TestView(Mutex<PortalState>);

    impl TestView {
        fn new() -> Self {
            Self(Mutex::new(PortalState::default()))
        }

        fn state(&self) -> PortalState {
            self.0.lock().clone()
        }
    }

    impl PortalView for TestView {
        fn update<R>(&self, f: impl FnOnce(&mut PortalState) -> R) -> R {
            f(&mut self.0.lock())
        }

        fn read<R>(&self, f: impl FnOnce(&PortalState) -> R) -> R {
            f(&self.0.lock())
        }
    }

    struct MockWallet {
        key: Pubkey,
        trusted: bool,
        approve: bool,
        connected: Mutex<Option<Pubkey>>,
    }

    impl MockWallet {
        fn new(trusted: bool, approve: bool) -> Arc<Self> {
            Arc::new(Self {
                key: Pubkey::new_from_array([42u8; 32]),
                trusted,
                approve,
                connected: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl WalletProvider for MockWallet {
        fn name(&self) -> &str {
            "mock"
        }

        async fn connect(&self, opts: ConnectOptions) -> std::result::Result<Pubkey, WalletError> {
            if !self.trusted && opts.only_if_trusted {
                return Err(WalletError::NotTrusted);
            }
            if !self.trusted && !self.approve {
                return Err(WalletError::Declined);
            }
            *self.connected.lock() = Some(self.key);
            Ok(self.key)
        }

        async fn disconnect(&self) {
            *self.connected.lock() = None;
        }

        fn public_key(&self) -> Option<Pubkey> {
            *self.connected.lock()
        }

        async fn sign_message(&self, _message: &[u8]) -> std::result::Result<[u8; 64], WalletError> {
            Ok([0u8; 64])
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Initialize(Pubkey),
        Fetch,
        Append { link: String, user: Pubkey },
        Clear,
    }

    /// In-memory stand-in for the deployed program.
    struct MockProgram {
        wallet: Arc<MockWallet>,
        account: Mutex<Option<Vec<Submission>>>,
        calls: Mutex<Vec<Call>>,
        fail: AtomicBool,
    }

    impl MockProgram {
        fn new(wallet: Arc<MockWallet>, account: Option<Vec<Submission>>) -> Arc<Self> {
            Arc::new(Self {
                wallet,
                account: Mutex::new(account),
                calls: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            })
        }

        fn check(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PortalError::Rpc("node is behind".into()));
            }
            Ok(())
        }

        fn writes(&self) -> Vec<Call> {
            self.calls
                .lock()
                .iter()
                .filter(|c| !matches!(c, Call::Fetch))
                .cloned()
                .collect()
        }
    }

    #[async_trait]
    impl PortalProgram for MockProgram {
        async fn initialize_account(&self, owner: &Pubkey) -> Result<String> {
            self.calls.lock().push(Call::Initialize(*owner));
            self.check()?;
            let mut account = self.account.lock();
            if account.is_some() {
                return Err(PortalError::Rpc("account already in use".into()));
            }
            *account = Some(Vec::new());
            Ok("sig-init".into())
        }

        async fn fetch_list(&self, _account: &Pubkey) -> Result<Option<Vec<Submission>>> {
            self.calls.lock().push(Call::Fetch);
            self.check()?;
            Ok(self.account.lock().clone())
        }

        async fn append_entry(&self, _account: &Pubkey, link: &str, comment: Option<&str>) -> Result<String> {
            let user = self.wallet.public_key().ok_or(WalletError::NotConnected)?;
            self.calls.lock().push(Call::Append { link: link.to_string(), user });
            self.check()?;
            let mut account = self.account.lock();
            let list = account
                .as_mut()
                .ok_or_else(|| PortalError::Rpc("AccountNotInitialized".into()))?;
            list.push(Submission {
                link: link.to_string(),
                author: user,
                comment: comment.map(String::from),
            });
            Ok("sig-add".into())
        }

        async fn clear_list(&self, _account: &Pubkey) -> Result<String> {
            self.calls.lock().push(Call::Clear);
            self.check()?;
            let mut account = self.account.lock();
            let list = account
                .as_mut()
                .ok_or_else(|| PortalError::Rpc("AccountNotInitialized".into()))?;
            list.clear();
            Ok("sig-clear".into())
        }
    }

    fn portal(wallet: &Arc<MockWallet>, program: &Arc<MockProgram>) -> Portal {
        let wallet: Arc<dyn WalletProvider> = wallet.clone();
        let program: Arc<dyn PortalProgram> = program.clone();
        Portal::new(WalletSlot::fixed(Some(wallet)), program, Pubkey::new_from_array([1u8; 32]))
    }

    fn existing(n: usize) -> Vec<Submission> {
        (0..n)
            .map(|i| Submission {
                link: format!("https://example.com/{i}.gif"),
                author: Pubkey::new_from_array([7u8; 32]),
                comment: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_missing_wallet_prompts_once_per_attempt() {
        let program = MockProgram::new(MockWallet::new(true, true), Some(vec![]));
        let portal = Portal::new(WalletSlot::fixed(None), program, Pubkey::default());
        let view = TestView::new();

        portal.connect_wallet(&view).await;
        let state = view.state();
        assert_eq!(state.notices.len(), 1);
        assert_eq!(state.notices[0].kind, NoticeKind::Info);
        assert_eq!(state.notices[0].message, WALLET_MISSING);
        assert_eq!(state.view_mode(), ViewMode::SignedOut);

        portal.connect_wallet(&view).await;
        assert_eq!(view.state().notices.len(), 2);

        portal.check_if_wallet_is_connected(&view).await;
        assert_eq!(view.state().notices.len(), 3);
    }

    #[tokio::test]
    async fn test_wallet_installed_after_start_is_found() {
        let wallet = MockWallet::new(false, true);
        let program = MockProgram::new(wallet.clone(), Some(existing(1)));
        let installed = Arc::new(AtomicBool::new(false));

        let slot = {
            let installed = installed.clone();
            let wallet = wallet.clone();
            WalletSlot::detecting(move || {
                installed
                    .load(Ordering::SeqCst)
                    .then(|| wallet.clone() as Arc<dyn WalletProvider>)
            })
        };
        let portal = Portal::new(slot, program.clone(), Pubkey::new_from_array([1u8; 32]));
        let view = TestView::new();

        portal.connect_wallet(&view).await;
        assert_eq!(view.state().notices[0].message, WALLET_MISSING);
        assert_eq!(view.state().view_mode(), ViewMode::SignedOut);

        installed.store(true, Ordering::SeqCst);
        portal.connect_wallet(&view).await;
        let state = view.state();
        assert_eq!(state.wallet_address, Some(wallet.key));
        assert_eq!(state.gif_list, SubmissionList::Loaded(existing(1)));
        assert_eq!(state.notices.last().unwrap().message, SIGNED_IN);
    }

    #[tokio::test]
    async fn test_trusted_reconnect_loads_list() {
        let wallet = MockWallet::new(true, false);
        let program = MockProgram::new(wallet.clone(), Some(existing(2)));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        let state = view.state();
        assert_eq!(state.wallet_address, Some(wallet.key));
        assert_eq!(state.gif_list, SubmissionList::Loaded(existing(2)));
        assert!(state.notices.is_empty());
    }

    #[tokio::test]
    async fn test_untrusted_reconnect_stays_signed_out() {
        let wallet = MockWallet::new(false, true);
        let program = MockProgram::new(wallet.clone(), Some(vec![]));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        let state = view.state();
        assert_eq!(state.view_mode(), ViewMode::SignedOut);
        assert!(state.notices.is_empty());
        assert!(program.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn test_declined_connect_is_a_no_op() {
        let wallet = MockWallet::new(false, false);
        let program = MockProgram::new(wallet.clone(), Some(vec![]));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.connect_wallet(&view).await;
        let state = view.state();
        assert_eq!(state.view_mode(), ViewMode::SignedOut);
        assert!(state.notices.is_empty());
    }

    #[tokio::test]
    async fn test_send_gif_round_trip() {
        let wallet = MockWallet::new(false, true);
        let program = MockProgram::new(wallet.clone(), Some(existing(1)));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.connect_wallet(&view).await;
        view.update(|s| s.input_value = LINK.to_string());
        portal.send_gif(&view).await;

        assert_eq!(
            program.writes(),
            vec![Call::Append { link: LINK.into(), user: wallet.key }]
        );

        let state = view.state();
        let fetched = program.account.lock().clone().unwrap();
        assert_eq!(state.gif_list, SubmissionList::Loaded(fetched));
        let entries = state.gif_list.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].link, LINK);
        assert_eq!(entries[1].author, wallet.key);
        assert!(state.input_value.is_empty());
        assert_eq!(state.notices.last().unwrap().message, GIF_SENT);
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn test_comment_is_forwarded() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), Some(vec![]));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        view.update(|s| {
            s.input_value = format!("  {LINK}  ");
            s.comment_value = "the best scene".into();
        });
        portal.send_gif(&view).await;

        let entries = view.state().gif_list.entries().unwrap().to_vec();
        assert_eq!(entries[0].link, LINK);
        assert_eq!(entries[0].comment.as_deref(), Some("the best scene"));
        assert!(view.state().comment_value.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_sends_nothing() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), Some(vec![]));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        view.update(|s| s.input_value = "   ".into());
        portal.send_gif(&view).await;

        assert!(program.writes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_keeps_view() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), Some(existing(3)));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        program.fail.store(true, Ordering::SeqCst);
        view.update(|s| s.input_value = LINK.into());
        portal.send_gif(&view).await;

        let state = view.state();
        assert_eq!(state.gif_list, SubmissionList::Loaded(existing(3)));
        assert_eq!(state.input_value, LINK);
        assert!(state.notices.is_empty());
        assert!(!state.is_busy());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_view() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), Some(existing(2)));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        program.fail.store(true, Ordering::SeqCst);
        assert!(!portal.refresh(&view).await);
        assert_eq!(view.state().gif_list, SubmissionList::Loaded(existing(2)));
    }

    #[tokio::test]
    async fn test_clear_leaves_empty_list() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), Some(existing(4)));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        portal.clear_gifs(&view).await;

        let state = view.state();
        assert_eq!(state.gif_list, SubmissionList::Loaded(vec![]));
        assert_eq!(state.view_mode(), ViewMode::Ready);
        assert_eq!(state.notices.last().unwrap().message, GIFS_CLEARED);
    }

    #[tokio::test]
    async fn test_missing_account_needs_initialization() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), None);
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        assert_eq!(view.state().view_mode(), ViewMode::NeedsInitialization);
        assert!(view.state().notices.is_empty());

        portal.create_gif_account(&view).await;
        assert_eq!(program.writes(), vec![Call::Initialize(wallet.key)]);
        let state = view.state();
        assert_eq!(state.view_mode(), ViewMode::Ready);
        assert_eq!(state.gif_list, SubmissionList::Loaded(vec![]));
    }

    #[tokio::test]
    async fn test_disconnect_hides_authenticated_view() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), Some(existing(1)));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        portal.check_if_wallet_is_connected(&view).await;
        assert_eq!(view.state().view_mode(), ViewMode::Ready);

        portal.disconnect_wallet(&view).await;
        let state = view.state();
        assert!(state.wallet_address.is_none());
        assert_eq!(state.view_mode(), ViewMode::SignedOut);
        assert_eq!(state.notices.last().unwrap().message, SIGNED_OUT);
        assert!(wallet.public_key().is_none());
    }

    #[tokio::test]
    async fn test_signed_out_writes_are_ignored() {
        let wallet = MockWallet::new(true, true);
        let program = MockProgram::new(wallet.clone(), Some(vec![]));
        let portal = portal(&wallet, &program);
        let view = TestView::new();

        view.update(|s| s.input_value = LINK.into());
        portal.send_gif(&view).await;
        portal.clear_gifs(&view).await;
        portal.create_gif_account(&view).await;
        assert!(program.calls.lock().is_empty());
    }
}
