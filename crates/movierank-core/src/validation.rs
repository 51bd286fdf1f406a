//! Client-side checks that run before a request is issued.

use thiserror::Error;

use crate::models::MAX_RATING;

/// Shortest password the register form accepts
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    MissingRegistrationFields,

    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,

    #[error("Please enter both email/username and password.")]
    MissingCredentials,

    #[error("Please write a review and select a rating.")]
    IncompleteReview,

    #[error("Rating must be between 1 and 10.")]
    RatingOutOfRange,
}

pub fn validate_registration(email: &str, username: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() || username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingRegistrationFields);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Normalize a login identifier: trimmed and lower-cased
pub fn sanitize_login(email_or_username: &str) -> String {
    email_or_username.trim().to_lowercase()
}

/// Validate login input, returning the sanitized identifier
pub fn validate_login(email_or_username: &str, password: &str) -> Result<String, ValidationError> {
    let identifier = sanitize_login(email_or_username);
    if identifier.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(identifier)
}

/// A rating of 0 means no star was selected
pub fn validate_review(review: &str, rating: u8) -> Result<(), ValidationError> {
    if review.trim().is_empty() || rating == 0 {
        return Err(ValidationError::IncompleteReview);
    }
    if rating > MAX_RATING {
        return Err(ValidationError::RatingOutOfRange);
    }
    Ok(())
}
