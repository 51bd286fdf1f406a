use serde::{Deserialize, Serialize};

use crate::utils::{format_date, format_rating};

/// Shown when a movie has no poster
pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/150";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub poster: Option<String>,
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
}

impl Movie {
    pub fn poster_url(&self) -> &str {
        self.poster
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(PLACEHOLDER_POSTER)
    }

    /// "8.5/10", or "N/A" for unrated movies
    pub fn rating_display(&self) -> String {
        format_rating(self.average_rating)
    }

    pub fn release_display(&self) -> String {
        self.release_date
            .as_deref()
            .map(format_date)
            .unwrap_or_default()
    }

    pub fn description_display(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("No description available.")
    }
}

/// Movies grouped under one genre label, as returned by `/movies/genres`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreBucket {
    #[serde(rename = "_id")]
    pub genre: String,
    #[serde(default)]
    pub movies: Vec<Movie>,
}
