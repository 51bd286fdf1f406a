//! MovieRank core library.
//!
//! API client, session store and coordinator, models, validation, search and
//! user feedback shared by MovieRank front ends.

pub mod api;
pub mod auth;
pub mod config;
pub mod feedback;
pub mod models;
pub mod notify;
pub mod search;
pub mod service;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthCoordinator, SessionEvent, StorageError, TokenStore};
pub use config::Config;
pub use feedback::{Action, Feedback};
pub use notify::Notifier;
pub use service::{ActionError, MovieDetails, MovieRank, ProfileCache, ProfileData};
