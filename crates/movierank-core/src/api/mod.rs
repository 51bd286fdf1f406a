//! REST API client module for the MovieRank service.
//!
//! This module provides the `ApiClient` for communicating with the
//! MovieRank API to fetch movies, reviews, and the signed-in user's data.
//!
//! Authenticated endpoints use bearer tokens read from the session
//! store on every request.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
