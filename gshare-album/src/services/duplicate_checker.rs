//! Duplicate suppression by display name
//!
//! Matching is on exact display-name equality only. Two different files
//! with the same name are treated as the same asset; content comparison
//! would be a separate, opt-in check.

use crate::platform::{MediaColumn, MediaIndex};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DuplicateChecker {
    media_index: Arc<dyn MediaIndex>,
}

impl DuplicateChecker {
    pub fn new(media_index: Arc<dyn MediaIndex>) -> Self {
        Self { media_index }
    }

    /// True iff an entry named `prefix + file_name` is already indexed
    ///
    /// A failing query reports `false`: a possible duplicate is preferred
    /// over blocking a legitimate transfer.
    pub async fn exists(&self, prefix: &str, file_name: &str) -> bool {
        let display_name = format!("{}{}", prefix, file_name);

        match self
            .media_index
            .query(MediaColumn::DisplayName, &display_name)
            .await
        {
            Ok(matches) => {
                debug!(display_name = %display_name, matches = matches.len(), "Duplicate check");
                !matches.is_empty()
            }
            Err(e) => {
                warn!(
                    display_name = %display_name,
                    error = %e,
                    "Duplicate query failed, treating as not indexed"
                );
                false
            }
        }
    }
}
