//! API client for communicating with the MovieRank REST API.
//!
//! `ApiClient::request` is the single path every call takes: it resolves the
//! path against the base URL, reads the session token from the store and
//! attaches it as a bearer credential, and maps non-2xx responses to
//! [`ApiError::Status`]. Typed wrappers for each endpoint sit on top.

use std::sync::Arc;

use reqwest::{header, Client, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::models::{
    GenreBucket, LoginRequest, LoginResponse, MessageResponse, Movie, NewReview, Profile,
    RegisterRequest, Review, WatchlistResponse,
};

use super::ApiError;

/// API client for MovieRank.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Self::with_http_client(client, base_url, store)
    }

    /// Create a client around an existing reqwest client, sharing its connection pool
    pub fn with_http_client(
        client: Client,
        base_url: &str,
        store: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            base_url: Self::parse_base_url(base_url)?,
            store,
        })
    }

    fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
        let url = Url::parse(base_url.trim())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{}: expected an http(s) origin",
                base_url
            )));
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments; each segment is percent-encoded
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Resolve a slash-separated path against the base URL
    pub fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.endpoint(&segments)
    }

    /// Current token from the session store. A failed read is treated as no
    /// token so the request still goes out.
    fn bearer_token(&self) -> Option<String> {
        match self.store.get() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read session token, sending request without it");
                None
            }
        }
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.bearer_token() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, body))
        }
    }

    /// Parse a 2xx body; an empty body reads as JSON `null`
    fn parse_body<T: DeserializeOwned>(url: &Url, text: &str) -> Result<T, ApiError> {
        let source = if text.trim().is_empty() { "null" } else { text };
        serde_json::from_str(source).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", url.path(), e))
        })
    }

    async fn send<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let headers = self.auth_headers()?;
        debug!(
            %method,
            path = url.path(),
            authenticated = headers.contains_key(header::AUTHORIZATION),
            "Sending request"
        );

        let mut request = self.client.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let response = match Self::check_response(response).await {
            Ok(response) => response,
            Err(e) => {
                debug!(%method, path = url.path(), error = %e, "Request failed");
                return Err(e);
            }
        };
        let text = response.text().await?;
        Self::parse_body(&url, &text)
    }

    /// Issue a request to `path` (relative to the base URL) with an optional JSON body
    pub async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.resolve(path)?;
        self.send(method, url, body).await
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::GET, self.endpoint(segments)?, None).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, self.endpoint(segments)?, body).await
    }

    async fn delete<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        self.send::<T, ()>(Method::DELETE, self.endpoint(segments)?, None).await
    }

    // ===== Auth =====

    pub async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, ApiError> {
        let response: Option<MessageResponse> = self.post(&["auth", "register"], Some(request)).await?;
        Ok(response.unwrap_or_default())
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post(&["auth", "login"], Some(request)).await
    }

    pub async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        self.get(&["auth", "profile"]).await
    }

    // ===== Movies =====

    /// Fetch all movies grouped by genre, in server order
    pub async fn fetch_genres(&self) -> Result<Vec<GenreBucket>, ApiError> {
        self.get(&["movies", "genres"]).await
    }

    pub async fn fetch_movie(&self, movie_id: &str) -> Result<Movie, ApiError> {
        self.get(&["movies", movie_id]).await
    }

    // ===== Watchlist =====

    pub async fn add_to_watchlist(&self, movie_id: &str) -> Result<MessageResponse, ApiError> {
        let response: Option<MessageResponse> = self
            .post::<_, ()>(&["movies", movie_id, "add-to-watchlist"], None)
            .await?;
        Ok(response.unwrap_or_default())
    }

    pub async fn fetch_watchlist(&self) -> Result<Vec<Movie>, ApiError> {
        let response: Option<WatchlistResponse> = self.get(&["watchlist"]).await?;
        Ok(response.map(WatchlistResponse::into_movies).unwrap_or_default())
    }

    pub async fn remove_from_watchlist(&self, movie_id: &str) -> Result<MessageResponse, ApiError> {
        let response: Option<MessageResponse> = self.delete(&["watchlist", movie_id]).await?;
        Ok(response.unwrap_or_default())
    }

    // ===== Reviews =====

    pub async fn fetch_reviews(&self, movie_id: &str) -> Result<Vec<Review>, ApiError> {
        self.get(&["reviews", movie_id]).await
    }

    /// Fetch the signed-in user's reviews
    pub async fn fetch_user_reviews(&self) -> Result<Vec<Review>, ApiError> {
        self.get(&["reviews", "user"]).await
    }

    pub async fn create_review(&self, review: &NewReview) -> Result<Review, ApiError> {
        self.post(&["reviews"], Some(review)).await
    }
}
