//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::Category;
use crate::store::RecordId;

/// Maximum allowed slug length in bytes
pub const MAX_SLUG_LENGTH: usize = 128;

/// Request body for creating or replacing a category
/// (POST /categories, PUT /categories/:id)
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<RecordId>,
    #[serde(default)]
    pub image: Value,
    #[serde(default)]
    pub hidden: bool,
}

impl CategoryInput {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.title.trim().is_empty() {
            return Some("Title cannot be empty".to_string());
        }
        if self.slug.len() > MAX_SLUG_LENGTH {
            return Some(format!(
                "Slug exceeds maximum length of {} characters",
                MAX_SLUG_LENGTH
            ));
        }
        if !self
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Some("Slug may only contain lowercase letters, digits and '-'".to_string());
        }
        None
    }

    /// Builds the stored record for `id`.
    pub fn into_category(self, id: RecordId) -> Category {
        Category {
            id,
            title: self.title,
            slug: self.slug,
            description: self.description,
            parent_id: self.parent_id,
            image: self.image,
            hidden: self.hidden,
        }
    }
}

/// Request body for POST /cache/invalidate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateRequest {
    /// Record to invalidate; everything when absent
    #[serde(default)]
    pub id: Option<RecordId>,
}
