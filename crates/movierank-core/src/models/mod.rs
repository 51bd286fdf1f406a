//! Data models for MovieRank entities.
//!
//! - `Movie`, `GenreBucket`: catalog data for the home screens
//! - `Review`, `NewReview`: star reviews
//! - `Profile`, `WatchlistResponse` and the auth request/response bodies

pub mod movie;
pub mod review;
pub mod user;

pub use movie::{GenreBucket, Movie, PLACEHOLDER_POSTER};
pub use review::{NewReview, Reference, Review, MAX_RATING};
pub use user::{
    LoginRequest, LoginResponse, MessageResponse, Profile, RegisterRequest, WatchlistResponse,
};
