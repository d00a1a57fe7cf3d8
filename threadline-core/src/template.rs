//! Reusable prompt templates.
//!
//! Consumed only to populate the compose-time picker; templates are not
//! part of the conversation core itself.

use serde::{Deserialize, Serialize};

/// A reusable prompt template from the catalog API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PromptTemplate {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub version: u32,
    pub system_prompt: String,
    pub user_prompt: String,
    pub tags: Vec<String>,
}

impl PromptTemplate {
    /// Case-insensitive picker filter over title and tags.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}
