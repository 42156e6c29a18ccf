/// LLM Client — the single point of entry for all Claude API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// Model: claude-sonnet-4-5 (hardcoded — do not make configurable to prevent drift)
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
/// Upper bound on tool round-trips within a single flow.
pub const MAX_TOOL_ROUNDS: usize = 4;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Model requested unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Tool loop exceeded {0} rounds")]
    ToolLoop(usize),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    /// Block types this client does not use.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }
}

/// Tool definition as advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// A callback the model may invoke mid-conversation. The returned string is
/// sent back to the model as the tool result.
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;
    fn invoke(&self, input: &Value) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolSpec>,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|b| match b {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn tool_uses(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolUse { id, name, input } => {
                Some((id.as_str(), name.as_str(), input))
            }
            _ => None,
        })
    }

    fn wants_tools(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use") && self.tool_uses().next().is_some()
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all flows.
/// Wraps the Anthropic Messages API with optional retries, a tool loop and
/// structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    max_attempts: u32,
}

impl LlmClient {
    /// `max_attempts` of 1 means a failed call is reported as-is, never retried.
    pub fn new(api_key: String, max_attempts: u32) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            max_attempts: max_attempts.max(1),
        })
    }

    /// Sends a whole conversation. Retries on 429 (rate limit) and 5xx errors
    /// with exponential backoff while attempts remain.
    pub async fn converse(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[&dyn Tool],
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages,
            tools: tools.iter().map(|t| t.spec()).collect(),
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}, stop_reason={:?}",
                llm_response.usage.input_tokens,
                llm_response.usage.output_tokens,
                llm_response.stop_reason
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::Exhausted {
            attempts: self.max_attempts,
        }))
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        self.call_json_with_tools(prompt, system, &[]).await
    }

    /// Like [`call_json`](Self::call_json), but lets the model invoke `tools`
    /// before producing its final answer.
    pub async fn call_json_with_tools<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
        tools: &[&dyn Tool],
    ) -> Result<T, LlmError> {
        let mut messages = vec![Message::text(Role::User, prompt)];

        for round in 0..=MAX_TOOL_ROUNDS {
            let response = self.converse(system, &messages, tools).await?;
            match tool_step(response, tools, round)? {
                ToolStep::Answer(text) => return parse_json_output(&text),
                ToolStep::Continue { assistant, results } => {
                    messages.push(assistant);
                    messages.push(results);
                }
            }
        }

        Err(LlmError::ToolLoop(MAX_TOOL_ROUNDS))
    }
}

/// What to do after one model turn of a tool conversation.
#[derive(Debug)]
enum ToolStep {
    Answer(String),
    /// Send the model's turn and the tool results back for another round.
    Continue { assistant: Message, results: Message },
}

/// Decides the next step after `response`, the model's reply in `round`.
/// Tools are not run once the round budget is spent.
fn tool_step(
    response: LlmResponse,
    tools: &[&dyn Tool],
    round: usize,
) -> Result<ToolStep, LlmError> {
    if !response.wants_tools() {
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        return Ok(ToolStep::Answer(text.to_string()));
    }
    if round >= MAX_TOOL_ROUNDS {
        return Err(LlmError::ToolLoop(MAX_TOOL_ROUNDS));
    }

    let results = run_tools(&response, tools)?;
    Ok(ToolStep::Continue {
        assistant: Message {
            role: Role::Assistant,
            content: response
                .content
                .into_iter()
                .filter(|b| *b != ContentBlock::Other)
                .collect(),
        },
        results: Message {
            role: Role::User,
            content: results,
        },
    })
}

/// Executes every tool call in `response`, producing the tool-result blocks
/// for the next user turn.
fn run_tools(response: &LlmResponse, tools: &[&dyn Tool]) -> Result<Vec<ContentBlock>, LlmError> {
    response
        .tool_uses()
        .map(|(id, name, input)| {
            let tool = tools
                .iter()
                .find(|t| t.spec().name == name)
                .ok_or_else(|| LlmError::UnknownTool(name.to_string()))?;
            debug!("Model invoked tool '{name}'");
            Ok(ContentBlock::ToolResult {
                tool_use_id: id.to_string(),
                content: tool.invoke(input)?,
            })
        })
        .collect()
}

/// Parses model text as JSON, tolerating markdown code fences.
pub fn parse_json_output<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    serde_json::from_str(strip_json_fences(text)).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
