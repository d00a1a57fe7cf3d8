//! Generated file artifacts.

use crate::Timestamp;
use serde::{Deserialize, Serialize};

/// A generated file streamed out of an execution run. `path` is the unique
/// key within a conversation's file registry; repeated paths replace
/// content in place rather than appending a duplicate entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FileArtifact {
    pub path: String,
    pub content: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub timestamp: Timestamp,
}
