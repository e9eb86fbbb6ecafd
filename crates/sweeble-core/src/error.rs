use std::time::Duration;

use thiserror::Error;

use crate::edit::EditKind;

#[derive(Error, Debug)]
pub enum SweebleError {
    #[error("range {start}..{end} is out of bounds for buffer of length {len}")]
    OutOfRange { start: usize, end: usize, len: usize },

    #[error("line {line} is out of bounds for buffer with {count} lines")]
    LineOutOfRange { line: usize, count: usize },

    #[error("edit #{index} ({kind}) at {start}..{end} no longer fits buffer of length {len}")]
    StaleOffset {
        index: usize,
        kind: EditKind,
        start: usize,
        end: usize,
        len: usize,
    },

    #[error("edits #{first} and #{second} overlap")]
    OverlappingEdits { first: usize, second: usize },

    #[error("anchor text not found in buffer: {0:?}")]
    UnresolvedAnchor(String),

    #[error("classification unavailable: {0}")]
    ClassificationUnavailable(String),

    #[error("completion unavailable: {0}")]
    CompletionUnavailable(String),

    #[error("edit proposal unavailable: {0}")]
    ProposalUnavailable(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request superseded by a newer generation")]
    Cancelled,
}

impl SweebleError {
    pub fn out_of_range(start: usize, end: usize, len: usize) -> Self {
        Self::OutOfRange { start, end, len }
    }

    pub fn stale(index: usize, kind: EditKind, start: usize, end: usize, len: usize) -> Self {
        Self::StaleOffset {
            index,
            kind,
            start,
            end,
            len,
        }
    }

    /// Collaborator-facing failures. These degrade to "no suggestion this time"
    /// instead of surfacing to the user.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            Self::ClassificationUnavailable(_)
                | Self::CompletionUnavailable(_)
                | Self::ProposalUnavailable(_)
                | Self::Llm(_)
                | Self::Timeout(_)
                | Self::Http(_)
                | Self::Json(_)
                | Self::Config(_)
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, SweebleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_errors_degrade() {
        assert!(SweebleError::Timeout(Duration::from_secs(3)).is_degradable());
        assert!(SweebleError::Llm("boom".into()).is_degradable());
        assert!(!SweebleError::out_of_range(4, 2, 10).is_degradable());
        assert!(!SweebleError::Cancelled.is_degradable());
    }

    #[test]
    fn test_stale_offset_message() {
        let err = SweebleError::stale(1, EditKind::Replace, 10, 20, 15);
        assert_eq!(
            err.to_string(),
            "edit #1 (REPLACE) at 10..20 no longer fits buffer of length 15"
        );
    }
}
