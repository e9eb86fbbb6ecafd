use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::PromptContext;
use crate::edit::RawEdit;
use crate::error::SweebleError;

/// What kind of help the cursor position calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// Text can simply be appended at the cursor.
    SimpleInsertion,
    /// Existing code elsewhere in the window needs to change.
    ComplexEdit,
    NoSuggestion,
}

impl Classification {
    /// Lenient label parsing. Anything unrecognised means no suggestion.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().trim_matches('"').to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "SIMPLE_INSERTION" => Self::SimpleInsertion,
            "COMPLEX_EDIT" => Self::ComplexEdit,
            _ => Self::NoSuggestion,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SimpleInsertion => f.write_str("SIMPLE_INSERTION"),
            Self::ComplexEdit => f.write_str("COMPLEX_EDIT"),
            Self::NoSuggestion => f.write_str("NO_SUGGESTION"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Decides which branch of the pipeline runs for a context.
#[async_trait::async_trait]
pub trait ClassificationService: Send + Sync {
    async fn classify(&self, context: &PromptContext) -> Result<Classification, SweebleError>;
}

/// Produces text to show inline at the cursor. `Ok(None)` means nothing worth showing.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, context: &PromptContext) -> Result<Option<String>, SweebleError>;
}

/// Proposes anchor-based edits to the code around the cursor.
#[async_trait::async_trait]
pub trait EditProposalService: Send + Sync {
    async fn propose_edits(&self, context: &PromptContext) -> Result<Vec<RawEdit>, SweebleError>;
}

/// Everything the classifier needs from the model side.
pub trait Assistant: ClassificationService + CompletionService + EditProposalService {}

impl<T> Assistant for T where T: ClassificationService + CompletionService + EditProposalService {}
