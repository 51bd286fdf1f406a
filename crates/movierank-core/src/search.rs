//! Title search over the genre listing.

use crate::models::GenreBucket;
use crate::utils::contains_ignore_case;

/// Shown when a search matches nothing
pub const NO_MATCH_MESSAGE: &str = "No such movie found.";

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub buckets: Vec<GenreBucket>,
    /// Set when a non-empty query matched no movie
    pub message: Option<&'static str>,
}

impl SearchOutcome {
    pub fn match_count(&self) -> usize {
        self.buckets.iter().map(|b| b.movies.len()).sum()
    }
}

/// Filter buckets to movies whose title contains `query`, ignoring case.
///
/// A blank query returns every bucket unchanged. Buckets with no matching
/// movie are dropped.
pub fn search_genres(buckets: &[GenreBucket], query: &str) -> SearchOutcome {
    let query = query.trim();
    if query.is_empty() {
        return SearchOutcome {
            buckets: buckets.to_vec(),
            message: None,
        };
    }

    let filtered: Vec<GenreBucket> = buckets
        .iter()
        .filter_map(|bucket| {
            let movies: Vec<_> = bucket
                .movies
                .iter()
                .filter(|movie| contains_ignore_case(&movie.title, query))
                .cloned()
                .collect();
            (!movies.is_empty()).then(|| GenreBucket {
                genre: bucket.genre.clone(),
                movies,
            })
        })
        .collect();

    let message = filtered.is_empty().then_some(NO_MATCH_MESSAGE);
    SearchOutcome {
        buckets: filtered,
        message,
    }
}
