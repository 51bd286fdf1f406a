//! Maps action outcomes to the title and message shown to the user.

use crate::auth::SessionEvent;
use crate::notify::Notifier;
use crate::service::ActionError;

pub const LOGIN_REQUIRED_WATCHLIST: &str = "You must log in to add movies to your watchlist.";
pub const LOGIN_REQUIRED_REVIEW: &str = "You must be logged in to submit a review.";
pub const LOGIN_REQUIRED_PROFILE: &str = "You must be signed in to access your profile.";
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// User actions that produce feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    LoadMovies,
    LoadMovie,
    LoadReviews,
    Register,
    Login,
    Logout,
    AddReview,
    AddToWatchlist,
    RemoveFromWatchlist,
    Profile,
}

impl Action {
    /// Message used when nothing more specific is known
    fn fallback_message(self) -> &'static str {
        match self {
            Action::LoadMovies => "Failed to load movies. Please try again later.",
            Action::LoadMovie => "Failed to load movie details. Please try again later.",
            Action::LoadReviews => "Failed to load reviews. Please try again later.",
            Action::Register => "Registration failed. Please try again.",
            Action::Login => "An unexpected error occurred.",
            Action::Logout => "Failed to clear the saved session.",
            Action::AddReview => "Failed to add review. Please try again later.",
            Action::AddToWatchlist => "Failed to add the movie. Please try again.",
            Action::RemoveFromWatchlist => "Failed to remove the movie. Please try again.",
            Action::Profile => "Failed to fetch profile data.",
        }
    }

    /// Whether a server-supplied message is shown as-is
    fn shows_server_message(self) -> bool {
        matches!(
            self,
            Action::Register | Action::AddReview | Action::AddToWatchlist | Action::RemoveFromWatchlist
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub title: String,
    pub message: String,
}

impl Feedback {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn send(&self, notifier: &dyn Notifier) {
        notifier.notify(&self.title, &self.message);
    }

    /// Feedback for a successful action; `server_message` is the `{message}`
    /// body some mutations return.
    pub fn success(action: Action, server_message: Option<&str>) -> Option<Self> {
        let feedback = match action {
            Action::Register => Self::new("Success", "Registration successful! Please log in."),
            Action::Login => Self::new("Login Successful", "Welcome to MovieRank!"),
            Action::Logout => Self::new("Logged Out", "You have been successfully logged out."),
            Action::AddReview => Self::new("Success!", "Your review has been added successfully."),
            Action::AddToWatchlist => Self::new(
                "Success",
                server_message.unwrap_or("Movie added to your watchlist."),
            ),
            Action::RemoveFromWatchlist => Self::new("Success", "Movie removed from your watchlist."),
            Action::LoadMovies | Action::LoadMovie | Action::LoadReviews | Action::Profile => {
                return None
            }
        };
        Some(feedback)
    }

    /// Feedback announcing a session change. Sign-in is reported by the login
    /// action itself.
    pub fn session_event(event: SessionEvent) -> Option<Self> {
        match event {
            SessionEvent::LoggedOut => Self::success(Action::Logout, None),
            SessionEvent::SessionExpired => Some(Self::new("Session Expired", SESSION_EXPIRED)),
            SessionEvent::LoggedIn | SessionEvent::WatchlistChanged => None,
        }
    }

    pub fn failure(action: Action, error: &ActionError) -> Self {
        match error {
            ActionError::Validation(e) => {
                let title = if action == Action::Login {
                    "Missing Credentials"
                } else {
                    "Error"
                };
                Self::new(title, e.to_string())
            }
            ActionError::LoginRequired(message) => Self::new("Login Required", *message),
            ActionError::SessionExpired => Self::new("Session Expired", SESSION_EXPIRED),
            ActionError::Api(e) if action == Action::Login => {
                let message = match e.server_message() {
                    Some(m) if m.contains("Invalid credentials") => {
                        "Incorrect email/username or password."
                    }
                    _ => action.fallback_message(),
                };
                Self::new("Login Failed", message)
            }
            ActionError::Api(e) if action.shows_server_message() => Self::new(
                "Error",
                e.server_message().unwrap_or(action.fallback_message()),
            ),
            ActionError::Api(_) | ActionError::Storage(_) => {
                let title = if action == Action::Login {
                    "Login Failed"
                } else {
                    "Error"
                };
                Self::new(title, action.fallback_message())
            }
        }
    }
}
