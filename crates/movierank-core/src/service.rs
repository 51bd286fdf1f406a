//! User actions built on the API client and the session coordinator.
//!
//! Every request made while signed in goes through [`MovieRank::check_session`]:
//! a 401 on such a request means the stored token is no longer valid, so the
//! session is expired and the caller gets [`ActionError::SessionExpired`].

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::auth::{AuthCoordinator, StorageError, TokenStore};
use crate::feedback::{LOGIN_REQUIRED_PROFILE, LOGIN_REQUIRED_REVIEW, LOGIN_REQUIRED_WATCHLIST};
use crate::models::{GenreBucket, LoginRequest, Movie, NewReview, Profile, RegisterRequest, Review};
use crate::search::{search_genres, SearchOutcome};
use crate::validation::{validate_login, validate_registration, validate_review, ValidationError};

#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    LoginRequired(&'static str),

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A movie with its reviews
#[derive(Debug, Clone)]
pub struct MovieDetails {
    pub movie: Movie,
    pub reviews: Vec<Review>,
}

/// Everything the profile screen shows
#[derive(Debug, Clone)]
pub struct ProfileData {
    pub profile: Profile,
    pub watchlist: Vec<Movie>,
    pub reviews: Vec<Review>,
}

#[derive(Clone)]
pub struct MovieRank {
    api: ApiClient,
    session: Arc<AuthCoordinator>,
}

impl MovieRank {
    pub fn new(api: ApiClient, session: Arc<AuthCoordinator>) -> Self {
        Self { api, session }
    }

    /// Build the client and coordinator over one token store
    pub fn connect(base_url: &str, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(base_url, Arc::clone(&store))?;
        let session = Arc::new(AuthCoordinator::initialize(store));
        Ok(Self::new(api, session))
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Arc<AuthCoordinator> {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    fn require_session(&self, message: &'static str) -> Result<(), ActionError> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ActionError::LoginRequired(message))
        }
    }

    /// Expire the session when a request sent while signed in comes back 401
    fn check_session<T>(&self, signed_in: bool, result: Result<T, ApiError>) -> Result<T, ActionError> {
        match result {
            Err(e) if signed_in && e.is_unauthorized() => {
                if let Err(store_err) = self.session.expire_session() {
                    warn!(error = %store_err, "Failed to clear expired session");
                }
                Err(ActionError::SessionExpired)
            }
            other => other.map_err(ActionError::from),
        }
    }

    // ===== Auth =====

    /// Create an account. Returns the server's message, if any.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, ActionError> {
        validate_registration(email, username, password)?;
        let request = RegisterRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.api.register(&request).await?;
        info!(username, "Account registered");
        Ok(response.message)
    }

    pub async fn login(&self, email_or_username: &str, password: &str) -> Result<(), ActionError> {
        let identifier = validate_login(email_or_username, password)?;
        let request = LoginRequest {
            email_or_username: identifier,
            password: password.to_string(),
        };
        let response = self.api.login(&request).await?;
        self.session.login(&response.token)?;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), ActionError> {
        self.session.logout()?;
        Ok(())
    }

    // ===== Browsing =====

    pub async fn genres(&self) -> Result<Vec<GenreBucket>, ActionError> {
        let signed_in = self.is_authenticated();
        let result = self.api.fetch_genres().await;
        self.check_session(signed_in, result)
    }

    /// Fetch the genre listing and filter it by title
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, ActionError> {
        let genres = self.genres().await?;
        Ok(search_genres(&genres, query))
    }

    pub async fn movie(&self, movie_id: &str) -> Result<Movie, ActionError> {
        let signed_in = self.is_authenticated();
        let result = self.api.fetch_movie(movie_id).await;
        self.check_session(signed_in, result)
    }

    pub async fn reviews(&self, movie_id: &str) -> Result<Vec<Review>, ActionError> {
        let signed_in = self.is_authenticated();
        let result = self.api.fetch_reviews(movie_id).await;
        self.check_session(signed_in, result)
    }

    /// Fetch a movie and its reviews concurrently. A failed review fetch
    /// leaves the list empty.
    pub async fn movie_details(&self, movie_id: &str) -> Result<MovieDetails, ActionError> {
        let (movie, reviews) = futures::future::join(self.movie(movie_id), self.reviews(movie_id)).await;
        let movie = movie?;
        let reviews = match reviews {
            Ok(reviews) => reviews,
            Err(ActionError::SessionExpired) => return Err(ActionError::SessionExpired),
            Err(e) => {
                warn!(movie_id, error = %e, "Failed to fetch reviews");
                Vec::new()
            }
        };
        Ok(MovieDetails { movie, reviews })
    }

    // ===== Mutations =====

    pub async fn submit_review(&self, movie_id: &str, review: &str, rating: u8) -> Result<Review, ActionError> {
        validate_review(review, rating)?;
        self.require_session(LOGIN_REQUIRED_REVIEW)?;
        let body = NewReview {
            movie_id: movie_id.to_string(),
            review: review.to_string(),
            rating,
        };
        let result = self.api.create_review(&body).await;
        let created = self.check_session(true, result)?;
        debug!(movie_id, review_id = %created.id, "Review created");
        Ok(created)
    }

    /// Add a movie to the watchlist. Returns the server's message, if any.
    pub async fn add_to_watchlist(&self, movie_id: &str) -> Result<Option<String>, ActionError> {
        self.require_session(LOGIN_REQUIRED_WATCHLIST)?;
        let result = self.api.add_to_watchlist(movie_id).await;
        let response = self.check_session(true, result)?;
        self.session.mark_watchlist_changed();
        Ok(response.message)
    }

    pub async fn remove_from_watchlist(&self, movie_id: &str) -> Result<(), ActionError> {
        self.require_session(LOGIN_REQUIRED_WATCHLIST)?;
        let result = self.api.remove_from_watchlist(movie_id).await;
        self.check_session(true, result)?;
        self.session.mark_watchlist_changed();
        Ok(())
    }

    // ===== Profile =====

    /// Fetch the profile, watchlist and own reviews, in that order
    pub async fn profile(&self) -> Result<ProfileData, ActionError> {
        self.require_session(LOGIN_REQUIRED_PROFILE)?;

        let result = self.api.fetch_profile().await;
        let profile = self.check_session(true, result)?;
        let result = self.api.fetch_watchlist().await;
        let watchlist = self.check_session(true, result)?;
        let result = self.api.fetch_user_reviews().await;
        let reviews = self.check_session(true, result)?;

        Ok(ProfileData {
            profile,
            watchlist,
            reviews,
        })
    }
}

/// Profile data held by a view between visits.
///
/// The view refetches on its first load, whenever the watchlist-changed flag
/// is set, and after any sign-in or sign-out since the data was fetched.
/// Loading consumes the flag.
#[derive(Default)]
pub struct ProfileCache {
    data: Option<ProfileData>,
    generation: u64,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(&mut self, app: &MovieRank) -> Result<&ProfileData, ActionError> {
        let generation = app.session().generation();
        let changed = app.session().consume_watchlist_changed();
        let same_session = generation == self.generation;
        let data = match self.data.take() {
            Some(data) if !changed && same_session => data,
            _ => {
                debug!(changed, same_session, "Fetching profile data");
                app.profile().await?
            }
        };
        self.generation = generation;
        Ok(self.data.insert(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, SessionEvent};
    use crate::test_support::TestServer;

    const GENRES: &str = r#"[{"_id":"Action","movies":[{"_id":"m1","title":"X"}]}]"#;

    fn app_for(server: &TestServer, store: Arc<MemoryTokenStore>) -> MovieRank {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let api = ApiClient::with_http_client(http, &server.base_url(), store.clone()).unwrap();
        let session = Arc::new(AuthCoordinator::initialize(store));
        MovieRank::new(api, session)
    }

    #[tokio::test]
    async fn test_short_password_never_reaches_network() {
        let server = TestServer::start(&[("POST", "/api/auth/register", 201, "{}")]).await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::new()));

        let err = app.register("a@b.com", "a", "short").await.unwrap_err();
        assert!(matches!(
            err,
            ActionError::Validation(ValidationError::PasswordTooShort)
        ));
        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_register_returns_server_message() {
        let server = TestServer::start(&[(
            "POST",
            "/api/auth/register",
            201,
            r#"{"message":"User registered successfully"}"#,
        )])
        .await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::new()));

        let message = app.register("a@b.com", "a", "longenough").await.unwrap();
        assert_eq!(message.as_deref(), Some("User registered successfully"));
        assert_eq!(
            server.requests()[0].json(),
            serde_json::json!({"email": "a@b.com", "username": "a", "password": "longenough"})
        );
        assert!(!app.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server =
            TestServer::start(&[("POST", "/api/auth/login", 200, r#"{"token":"abc123"}"#)]).await;
        let store = Arc::new(MemoryTokenStore::new());
        let app = app_for(&server, store.clone());
        let mut events = app.session().subscribe();

        app.login("  Alice ", "secret1").await.unwrap();

        assert_eq!(store.get().unwrap().as_deref(), Some("abc123"));
        assert!(app.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedIn);

        let request = &server.requests()[0];
        assert_eq!(request.json()["emailOrUsername"], "alice");
        assert_eq!(request.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_alone() {
        let server = TestServer::start(&[(
            "POST",
            "/api/auth/login",
            400,
            r#"{"message":"Invalid credentials"}"#,
        )])
        .await;
        let store = Arc::new(MemoryTokenStore::new());
        let app = app_for(&server, store.clone());

        let err = app.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, ActionError::Api(ref e) if e.server_message() == Some("Invalid credentials")));
        assert!(!app.is_authenticated());
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_watchlist_add_marks_profile_for_refetch() {
        let server = TestServer::start(&[
            (
                "POST",
                "/api/movies/m1/add-to-watchlist",
                200,
                r#"{"message":"Movie added to watchlist"}"#,
            ),
            ("GET", "/api/auth/profile", 200, r#"{"username":"a","email":"a@b.com"}"#),
            ("GET", "/api/watchlist", 200, r#"{"watchlist":[{"_id":"m1","title":"X"}]}"#),
            ("GET", "/api/reviews/user", 200, "[]"),
        ])
        .await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::with_token("abc123")));
        let mut cache = ProfileCache::new();

        // First visit fetches
        cache.load(&app).await.unwrap();
        assert_eq!(server.requests().len(), 3);

        // Second visit with no mutation reuses the data
        cache.load(&app).await.unwrap();
        assert_eq!(server.requests().len(), 3);

        let message = app.add_to_watchlist("m1").await.unwrap();
        assert_eq!(message.as_deref(), Some("Movie added to watchlist"));
        let add = &server.requests()[3];
        assert_eq!(add.path, "/api/movies/m1/add-to-watchlist");
        assert_eq!(add.header("authorization"), Some("Bearer abc123"));

        // The flag triggers a refetch and is consumed by it
        let data = cache.load(&app).await.unwrap();
        assert_eq!(data.watchlist[0].id, "m1");
        assert_eq!(data.profile.username, "a");
        assert_eq!(server.requests().len(), 7);
        assert!(!app.session().consume_watchlist_changed());
    }

    #[tokio::test]
    async fn test_mutations_require_login() {
        let server = TestServer::start(&[]).await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::new()));

        let err = app.add_to_watchlist("m1").await.unwrap_err();
        assert!(matches!(err, ActionError::LoginRequired(LOGIN_REQUIRED_WATCHLIST)));

        let err = app.submit_review("m1", "Great", 8).await.unwrap_err();
        assert!(matches!(err, ActionError::LoginRequired(LOGIN_REQUIRED_REVIEW)));

        let err = app.profile().await.unwrap_err();
        assert!(matches!(err, ActionError::LoginRequired(LOGIN_REQUIRED_PROFILE)));

        // Validation runs before the session check
        let err = app.submit_review("m1", "", 8).await.unwrap_err();
        assert!(matches!(err, ActionError::Validation(_)));

        assert!(server.requests().is_empty());
        assert!(!app.session().consume_watchlist_changed());
    }

    #[tokio::test]
    async fn test_unauthorized_expires_signed_in_session() {
        let server = TestServer::start(&[(
            "DELETE",
            "/api/watchlist/m1",
            401,
            r#"{"message":"Token expired"}"#,
        )])
        .await;
        let store = Arc::new(MemoryTokenStore::with_token("old-token"));
        let app = app_for(&server, store.clone());
        let mut events = app.session().subscribe();

        let err = app.remove_from_watchlist("m1").await.unwrap_err();
        assert!(matches!(err, ActionError::SessionExpired));
        assert!(!app.is_authenticated());
        assert_eq!(store.get().unwrap(), None);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::SessionExpired);
    }

    #[tokio::test]
    async fn test_unauthorized_while_signed_out_changes_nothing() {
        let server = TestServer::start(&[("GET", "/api/movies/genres", 401, "{}")]).await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::new()));
        let mut events = app.session().subscribe();

        let err = app.genres().await.unwrap_err();
        assert!(matches!(err, ActionError::Api(ref e) if e.is_unauthorized()));
        assert!(events.try_recv().is_err());
        assert!(!app.session().consume_watchlist_changed());
    }

    #[tokio::test]
    async fn test_search_over_fetched_genres() {
        let server = TestServer::start(&[("GET", "/api/movies/genres", 200, GENRES)]).await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::new()));

        let found = app.search("x").await.unwrap();
        assert_eq!(found.match_count(), 1);
        assert_eq!(found.buckets[0].movies[0].title, "X");

        let missing = app.search("zzz").await.unwrap();
        assert!(missing.buckets.is_empty());
        assert_eq!(missing.message, Some(crate::search::NO_MATCH_MESSAGE));
    }

    #[tokio::test]
    async fn test_movie_details_tolerates_review_failure() {
        let server = TestServer::start(&[
            ("GET", "/api/movies/m1", 200, r#"{"_id":"m1","title":"X","averageRating":7.5}"#),
            ("GET", "/api/reviews/m1", 500, r#"{"message":"boom"}"#),
        ])
        .await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::new()));

        let details = app.movie_details("m1").await.unwrap();
        assert_eq!(details.movie.rating_display(), "7.5/10");
        assert!(details.reviews.is_empty());

        let missing = app.movie_details("m2").await.unwrap_err();
        assert!(matches!(missing, ActionError::Api(ref e) if e.status() == Some(404)));
    }

    #[tokio::test]
    async fn test_submit_review_posts_payload() {
        let server = TestServer::start(&[(
            "POST",
            "/api/reviews",
            201,
            r#"{"_id":"r9","movieId":"m1","review":"Tense","rating":9}"#,
        )])
        .await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::with_token("abc123")));

        let review = app.submit_review("m1", "Tense", 9).await.unwrap();
        assert_eq!(review.id, "r9");
        assert_eq!(
            server.requests()[0].json(),
            serde_json::json!({"movieId": "m1", "review": "Tense", "rating": 9})
        );
    }

    #[tokio::test]
    async fn test_logout_resets_state() {
        let server = TestServer::start(&[]).await;
        let store = Arc::new(MemoryTokenStore::with_token("abc123"));
        let app = app_for(&server, store.clone());
        assert!(app.is_authenticated());

        app.logout().unwrap();
        app.logout().unwrap();
        assert!(!app.is_authenticated());
        assert_eq!(store.get().unwrap(), None);
        assert!(app.session().consume_watchlist_changed());
    }

    #[tokio::test]
    async fn test_profile_refetched_after_signing_in_again() {
        let server = TestServer::start(&[
            ("POST", "/api/auth/login", 200, r#"{"token":"bob-token"}"#),
            ("GET", "/api/auth/profile", 200, r#"{"username":"a","email":"a@b.com"}"#),
            ("GET", "/api/watchlist", 200, r#"{"watchlist":[]}"#),
            ("GET", "/api/reviews/user", 200, "[]"),
        ])
        .await;
        let app = app_for(&server, Arc::new(MemoryTokenStore::with_token("alice-token")));
        let mut cache = ProfileCache::new();

        cache.load(&app).await.unwrap();
        assert_eq!(server.requests().len(), 3);
        assert_eq!(server.requests()[0].header("authorization"), Some("Bearer alice-token"));

        // A new login over the live session must not reuse the old user's data
        app.login("bob", "secret1").await.unwrap();
        cache.load(&app).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 7);
        assert!(requests[4..]
            .iter()
            .all(|r| r.header("authorization") == Some("Bearer bob-token")));

        // Same session, no mutation: served from the cache
        cache.load(&app).await.unwrap();
        assert_eq!(server.requests().len(), 7);
    }

    #[tokio::test]
    async fn test_concurrent_rejections_expire_session_once() {
        let server = TestServer::start(&[
            ("GET", "/api/movies/m1", 401, r#"{"message":"Token expired"}"#),
            ("GET", "/api/reviews/m1", 401, r#"{"message":"Token expired"}"#),
        ])
        .await;
        let store = Arc::new(MemoryTokenStore::with_token("old-token"));
        let app = app_for(&server, store.clone());
        let mut events = app.session().subscribe();

        let err = app.movie_details("m1").await.unwrap_err();
        assert!(matches!(err, ActionError::SessionExpired));
        assert_eq!(server.requests().len(), 2);

        assert_eq!(events.try_recv().unwrap(), SessionEvent::SessionExpired);
        assert!(events.try_recv().is_err());
        assert!(!app.is_authenticated());
        assert_eq!(store.get().unwrap(), None);
    }
}
