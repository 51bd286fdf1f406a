//! Session management.
//!
//! This module provides:
//! - `TokenStore`: persistence for the bearer token (keychain, file, memory)
//! - `AuthCoordinator`: the shared signed-in state, the watchlist-changed
//!   flag, and change notifications for views

pub mod coordinator;
pub mod store;

pub use coordinator::{AuthCoordinator, SessionEvent};
pub use store::{
    FileTokenStore, KeyringTokenStore, MemoryTokenStore, StorageError, TokenStore, TOKEN_KEY,
};
