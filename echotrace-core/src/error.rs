//! Error kinds shared by the analysis layer and the runtime engine

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failures surfaced by the analysis operations.
///
/// Zero-division cases inside the scoring pipeline never raise; they resolve
/// to documented numeric defaults so the pipeline stays total. User-visible
/// failure is limited to these two kinds.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// An id did not resolve to the expected node kind in the snapshot
    #[error("{entity} '{id}' not found in snapshot")]
    NotFound { entity: &'static str, id: String },

    /// A time frame with start after end was supplied
    #[error("invalid time frame: start {start} is after end {end}")]
    InvalidTimeFrame {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl AnalysisError {
    pub fn content_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "content",
            id: id.to_string(),
        }
    }

    pub fn source_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "source",
            id: id.to_string(),
        }
    }
}
