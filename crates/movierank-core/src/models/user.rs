use serde::{Deserialize, Serialize};

use super::Movie;

/// Body of `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "emailOrUsername")]
    pub email_or_username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// `{message}` bodies returned by mutations
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchlistResponse {
    #[serde(default)]
    pub watchlist: Option<Vec<Movie>>,
}

impl WatchlistResponse {
    pub fn into_movies(self) -> Vec<Movie> {
        self.watchlist.unwrap_or_default()
    }
}
