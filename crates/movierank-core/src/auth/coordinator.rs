use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{StorageError, TokenStore};

/// Buffer size for the session event channel.
/// Receivers that fall further behind skip to the newest events.
const EVENT_BUFFER_SIZE: usize = 16;

/// Session changes announced to subscribed views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    /// The server rejected the stored token
    SessionExpired,
    WatchlistChanged,
}

/// Owns the authentication state and the watchlist-changed flag.
///
/// Only the coordinator writes either value; views read them and subscribe to
/// [`SessionEvent`]s. Token validity is trusted on read: a persisted token is
/// treated as a live session until a request made with it comes back 401.
///
/// Every sign-in and sign-out bumps a generation counter, so data cached for
/// one session can be recognized as stale in the next.
pub struct AuthCoordinator {
    store: Arc<dyn TokenStore>,
    authenticated: AtomicBool,
    watchlist_changed: AtomicBool,
    generation: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthCoordinator {
    /// Create a coordinator, deriving the initial state from the persisted token
    pub fn initialize(store: Arc<dyn TokenStore>) -> Self {
        let authenticated = match store.get() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read session token, starting signed out");
                false
            }
        };
        debug!(authenticated, "Session state initialized");

        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            store,
            authenticated: AtomicBool::new(authenticated),
            watchlist_changed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            events,
        }
    }

    /// The token store shared with the HTTP client
    pub fn store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// Identifies the current session; changes on every login and sign-out
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Persist the token and enter the signed-in state
    pub fn login(&self, token: &str) -> Result<(), StorageError> {
        self.store.set(token)?;
        self.authenticated.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!("Signed in");
        self.emit(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Drop the token and enter the signed-out state.
    ///
    /// The state is signed out afterwards even when the store fails to clear;
    /// the storage error is still returned.
    pub fn logout(&self) -> Result<(), StorageError> {
        let result = self.end_session();
        info!("Signed out");
        self.emit(SessionEvent::LoggedOut);
        result
    }

    /// Same as [`logout`](Self::logout), announced as an expiry.
    ///
    /// Only the first call for a signed-in session does anything, so
    /// concurrent requests rejected together expire it once.
    pub fn expire_session(&self) -> Result<(), StorageError> {
        if !self.authenticated.swap(false, Ordering::SeqCst) {
            debug!("Session already ended");
            return Ok(());
        }
        let result = self.end_session();
        warn!("Session rejected by server, signed out");
        self.emit(SessionEvent::SessionExpired);
        result
    }

    pub fn mark_watchlist_changed(&self) {
        self.watchlist_changed.store(true, Ordering::SeqCst);
        self.emit(SessionEvent::WatchlistChanged);
    }

    /// Read and reset the watchlist flag. Only the first reader after a
    /// mutation sees `true`.
    pub fn consume_watchlist_changed(&self) -> bool {
        self.watchlist_changed.swap(false, Ordering::SeqCst)
    }

    fn end_session(&self) -> Result<(), StorageError> {
        let result = self.store.clear();
        if let Err(ref e) = result {
            warn!(error = %e, "Failed to clear session token");
        }
        self.authenticated.store(false, Ordering::SeqCst);
        self.watchlist_changed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        result
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}
