//! Review types: reviews as listed by the API and the payload for a new one.

use serde::{Deserialize, Serialize};

use crate::utils::format_rating;

/// Highest rating on the star scale
pub const MAX_RATING: u8 = 10;

/// A related document that the API sends either as a bare id or populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: Option<String>,
        username: Option<String>,
        title: Option<String>,
    },
}

impl Reference {
    pub fn id(&self) -> Option<&str> {
        match self {
            Reference::Id(id) => Some(id),
            Reference::Populated { id, .. } => id.as_deref(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            Reference::Id(_) => None,
            Reference::Populated { username, .. } => username.as_deref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Reference::Id(_) => None,
            Reference::Populated { title, .. } => title.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "movieId")]
    pub movie: Option<Reference>,
    #[serde(rename = "userId")]
    pub user: Option<Reference>,
    #[serde(default)]
    pub review: String,
    pub rating: Option<f64>,
    #[serde(rename = "movieTitle")]
    pub movie_title: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
}

impl Review {
    pub fn author_display(&self) -> &str {
        self.user
            .as_ref()
            .and_then(Reference::username)
            .or(self.author.as_deref())
            .unwrap_or("Anonymous")
    }

    pub fn movie_title_display(&self) -> &str {
        self.movie_title
            .as_deref()
            .or_else(|| self.movie.as_ref().and_then(Reference::title))
            .unwrap_or("Unknown Movie")
    }

    pub fn rating_display(&self) -> String {
        format_rating(self.rating)
    }

    pub fn text_display(&self) -> &str {
        if self.review.trim().is_empty() {
            "No Review"
        } else {
            &self.review
        }
    }
}

/// Body of `POST /reviews`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    #[serde(rename = "movieId")]
    pub movie_id: String,
    pub review: String,
    pub rating: u8,
}
