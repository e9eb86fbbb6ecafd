use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{OpenAiSettings, Settings};
use crate::constants::limits;
use crate::context::PromptContext;
use crate::edit::RawEdit;
use crate::error::SweebleError;
use crate::llm::openai::{ChatRequest, OpenAiClient};
use crate::llm::prompts;
use crate::llm::traits::{Classification, ClassificationService, CompletionService, EditProposalService};

const CODE_FENCE: &str = "```";

/// All three collaborator roles backed by one OpenAI account.
pub struct OpenAiAssistant {
    client: OpenAiClient,
    settings: OpenAiSettings,
}

impl OpenAiAssistant {
    pub fn new(client: OpenAiClient, settings: OpenAiSettings) -> Self {
        Self { client, settings }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let client = OpenAiClient::new(settings.api_key()).with_base_url(&settings.openai.base_url);
        Self::new(client, settings.openai.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.client.has_api_key()
    }
}

/// Keeps configuration problems visible as such; everything else becomes the
/// role-specific "unavailable" error.
fn unavailable(e: SweebleError, wrap: fn(String) -> SweebleError) -> SweebleError {
    match e {
        SweebleError::Config(_) => e,
        other => wrap(other.to_string()),
    }
}

#[async_trait::async_trait]
impl ClassificationService for OpenAiAssistant {
    async fn classify(&self, context: &PromptContext) -> Result<Classification, SweebleError> {
        let request = ChatRequest::new(
            &self.settings.classification_model,
            prompts::classification_system(),
            prompts::user_prompt(context),
        )
        .with_max_tokens(limits::CLASSIFICATION_MAX_TOKENS)
        .with_temperature(limits::CLASSIFICATION_TEMPERATURE)
        .with_schema("classification", prompts::classification_schema());

        let content = self
            .client
            .chat(&request)
            .await
            .map_err(|e| unavailable(e, SweebleError::ClassificationUnavailable))?;
        let classification = parse_classification(&content);
        debug!("Classified context as {}", classification);
        Ok(classification)
    }
}

#[async_trait::async_trait]
impl CompletionService for OpenAiAssistant {
    async fn complete(&self, context: &PromptContext) -> Result<Option<String>, SweebleError> {
        let request = ChatRequest::new(
            &self.settings.completion_model,
            prompts::completion_system(&context.language),
            prompts::user_prompt(context),
        )
        .with_max_tokens(self.settings.completion_max_tokens)
        .with_temperature(self.settings.completion_temperature)
        .with_stop(&[CODE_FENCE]);

        let content = self
            .client
            .chat(&request)
            .await
            .map_err(|e| unavailable(e, SweebleError::CompletionUnavailable))?;
        Ok(clean_completion(&content))
    }
}

#[async_trait::async_trait]
impl EditProposalService for OpenAiAssistant {
    async fn propose_edits(&self, context: &PromptContext) -> Result<Vec<RawEdit>, SweebleError> {
        let request = ChatRequest::new(
            &self.settings.completion_model,
            prompts::proposal_system(&context.language),
            prompts::user_prompt(context),
        )
        .with_max_tokens(self.settings.proposal_max_tokens)
        .with_temperature(self.settings.proposal_temperature)
        .with_schema("code_changes", prompts::proposal_schema());

        let content = self
            .client
            .chat(&request)
            .await
            .map_err(|e| unavailable(e, SweebleError::ProposalUnavailable))?;
        parse_edit_proposals(&content).map_err(|e| SweebleError::ProposalUnavailable(e.to_string()))
    }
}

#[derive(Deserialize)]
struct ClassificationReply {
    classification: String,
}

pub fn parse_classification(content: &str) -> Classification {
    let body = strip_fences(content);
    match serde_json::from_str::<ClassificationReply>(body) {
        Ok(reply) => Classification::from_label(&reply.classification),
        Err(_) => Classification::from_label(body),
    }
}

/// Model output to insertable text, or `None` when there is nothing to insert.
pub fn clean_completion(content: &str) -> Option<String> {
    let text = unescape(strip_fences(content));
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parse `{"changes": [...]}` (or a bare array), skipping entries that do not
/// describe an edit. Sorted by descending confidence.
pub fn parse_edit_proposals(content: &str) -> Result<Vec<RawEdit>, SweebleError> {
    let value: Value = serde_json::from_str(strip_fences(content))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("changes") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut edits: Vec<RawEdit> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawEdit>(item) {
            Ok(edit) => {
                let confidence = edit.confidence;
                Some(edit.with_confidence(confidence))
            }
            Err(e) => {
                debug!("Skipping malformed change: {}", e);
                None
            }
        })
        .collect();
    edits.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    Ok(edits)
}

/// Drop a surrounding markdown code fence (with optional language tag).
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix(CODE_FENCE) else {
        return content;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix(CODE_FENCE).unwrap_or(body).trim_end_matches(['\n', '\r'])
}

/// Undo literal `\n`, `\"` and `\\` escapes the model sometimes emits.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    out.push('\n');
                    chars.next();
                    continue;
                }
                Some('"') => {
                    out.push('"');
                    chars.next();
                    continue;
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}
