//! View state for the portal window.

use crate::idl::ItemStruct;
use crate::keys::Pubkey;

/// One submission, as displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub link: String,
    pub author: Pubkey,
    pub comment: Option<String>,
}

impl From<ItemStruct> for Submission {
    fn from(item: ItemStruct) -> Self {
        Self {
            link: item.gif_link,
            author: item.user_address,
            comment: item.comment,
        }
    }
}

/// Last fetched content of the storage account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionList {
    /// The storage account does not exist yet.
    Uninitialized,
    Loaded(Vec<Submission>),
}

impl Default for SubmissionList {
    fn default() -> Self {
        SubmissionList::Loaded(Vec::new())
    }
}

impl SubmissionList {
    pub fn entries(&self) -> Option<&[Submission]> {
        match self {
            SubmissionList::Uninitialized => None,
            SubmissionList::Loaded(items) => Some(items),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
}

/// A toast message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
}

/// What the window shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    SignedOut,
    NeedsInitialization,
    Ready,
}

/// Top-level reactive state, stored in a Dioxus `Signal` by the UI.
#[derive(Clone, Debug, Default)]
pub struct PortalState {
    pub wallet_address: Option<Pubkey>,
    pub input_value: String,
    pub comment_value: String,
    pub gif_list: SubmissionList,
    pub notices: Vec<Notice>,
    pub pending_writes: u32,
    next_notice_id: u64,
    refresh_issued: u64,
    refresh_applied: u64,
}

impl PortalState {
    pub fn view_mode(&self) -> ViewMode {
        match (&self.wallet_address, &self.gif_list) {
            (None, _) => ViewMode::SignedOut,
            (Some(_), SubmissionList::Uninitialized) => ViewMode::NeedsInitialization,
            (Some(_), SubmissionList::Loaded(_)) => ViewMode::Ready,
        }
    }

    /// A write is in flight; the UI shows progress but keeps accepting input.
    pub fn is_busy(&self) -> bool {
        self.pending_writes > 0
    }

    pub fn push_notice(&mut self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        self.next_notice_id += 1;
        let id = self.next_notice_id;
        self.notices.push(Notice { id, kind, message: message.into() });
        id
    }

    pub fn dismiss_notice(&mut self, id: u64) {
        self.notices.retain(|n| n.id != id);
    }

    pub fn sign_in(&mut self, address: Pubkey) {
        self.wallet_address = Some(address);
    }

    /// Back to the signed-out screen. The list is kept; it is re-fetched on
    /// the next sign-in.
    pub fn sign_out(&mut self) {
        self.wallet_address = None;
        self.input_value.clear();
        self.comment_value.clear();
    }

    /// Reserve a sequence number for a list refresh about to be issued.
    pub fn begin_refresh(&mut self) -> u64 {
        self.refresh_issued += 1;
        self.refresh_issued
    }

    /// Apply a refresh result unless a later-issued refresh already landed.
    /// Returns whether the list was replaced.
    pub fn finish_refresh(&mut self, seq: u64, list: SubmissionList) -> bool {
        if seq < self.refresh_applied {
            tracing::debug!("Dropping stale refresh {} (applied {})", seq, self.refresh_applied);
            return false;
        }
        self.refresh_applied = seq;
        self.gif_list = list;
        true
    }
}

/// `abcd.....<tail from index 40>`, the way wallet addresses are tagged
/// under each GIF.
pub fn shorten_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    let head: String = address.chars().take(4).collect();
    let tail: String = address.chars().skip(40).collect();
    format!("{head}.....{tail}")
}
