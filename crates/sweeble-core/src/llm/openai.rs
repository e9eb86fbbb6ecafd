use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constants::{endpoints, timing};
use crate::error::SweebleError;
use crate::llm::traits::Message;

/// One chat-completions call.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
    /// JSON schema the reply must follow, with the name it is registered under.
    pub schema: Option<(String, Value)>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![Message::system(system), Message::user(user)],
            max_tokens: 256,
            temperature: 0.0,
            stop: Vec::new(),
            schema: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_stop(mut self, stop: &[&str]) -> Self {
        self.stop = stop.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.schema = Some((name.into(), schema));
        self
    }

    fn body(&self) -> OpenAIRequest<'_> {
        OpenAIRequest {
            model: &self.model,
            messages: &self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop: if self.stop.is_empty() { None } else { Some(&self.stop) },
            response_format: self.schema.as_ref().map(|(name, schema)| {
                serde_json::json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": name,
                        "strict": true,
                        "schema": schema,
                    }
                })
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Thin chat-completions client. Retries and overall deadlines belong to callers.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(timing::CONNECT_TIMEOUT_MS))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Content of the first choice.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, SweebleError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SweebleError::Config("OpenAI API key is not configured".into()))?;
        let url = format!("{}{}", self.base_url, endpoints::CHAT_COMPLETIONS_PATH);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request.body())
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(SweebleError::Llm(format!(
                "OpenAI API error ({}): {}",
                status, response_text
            )));
        }

        parse_chat_response(&response_text)
    }
}

fn parse_chat_response(body: &str) -> Result<String, SweebleError> {
    let api_response: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| SweebleError::Llm(format!("Failed to parse response: {e}")))?;

    if let Some(usage) = &api_response.usage {
        debug!(
            "OpenAI usage: {} prompt / {} completion tokens",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| SweebleError::Llm("No response from API".into()))
        .map(|choice| choice.message.content.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let request = ChatRequest::new("gpt-4o-mini", "sys", "user")
            .with_max_tokens(10)
            .with_stop(&["```"])
            .with_schema("classification", serde_json::json!({"type": "object"}));
        let body = serde_json::to_value(request.body()).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 10);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
        assert_eq!(body["stop"][0], "```");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "classification");
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let body = serde_json::to_value(ChatRequest::new("m", "s", "u").body()).unwrap();
        assert!(body.get("stop").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"choices":[{"message":{"content":"hello"}},{"message":{"content":"other"}}],
                       "usage":{"prompt_tokens":3,"completion_tokens":1}}"#;
        assert_eq!(parse_chat_response(body).unwrap(), "hello");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_chat_response(r#"{"choices":[]}"#), Err(SweebleError::Llm(_))));
        assert!(matches!(parse_chat_response("not json"), Err(SweebleError::Llm(_))));
        let null_content = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert_eq!(parse_chat_response(null_content).unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let client = OpenAiClient::new(None).with_base_url("http://127.0.0.1:9/");
        let err = client.chat(&ChatRequest::new("m", "s", "u")).await.unwrap_err();
        assert!(matches!(err, SweebleError::Config(_)));
        assert!(err.is_degradable());
    }
}
