//! Client side of the Scene Portal: wallet bridge, program bindings and the
//! view state the desktop UI renders.
//!
//! The on-chain program owns every submission. This crate only builds
//! transactions against it, reads its account back and keeps a view state
//! that mirrors the last successful round trip.

pub mod actions;
pub mod config;
pub mod error;
pub mod idl;
pub mod keyring;
pub mod keys;
pub mod program;
pub mod rpc;
pub mod state;
pub mod transaction;
pub mod wallet;

pub use actions::{Portal, PortalView};
pub use config::Config;
pub use error::{PortalError, Result};
pub use keys::{Keypair, Pubkey};
pub use program::{PortalProgram, RpcPortalProgram};
pub use state::{Notice, NoticeKind, PortalState, Submission, SubmissionList, ViewMode};
pub use wallet::{ApprovalPrompt, ConnectOptions, KeypairFileWallet, WalletError, WalletProvider, WalletSlot};
