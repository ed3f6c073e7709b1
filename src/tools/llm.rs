use crate::error::ToolError;
use crate::tools::source::clean_source;
use crate::tools::ContractAuthor;
use crate::utils::config::LlmSettings;
use crate::utils::error::compact_error_message;
use crate::utils::secrets::SecretString;
use crate::workflow::types::Finding;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GENERATE_TEMPERATURE: f32 = 0.3;
const REPAIR_TEMPERATURE: f32 = 0.2;
const GENERATE_MAX_TOKENS: u32 = 2_000;
const REPAIR_MAX_TOKENS: u32 = 3_000;

const GENERATE_SYSTEM_PROMPT: &str = "You are an expert Solidity smart-contract developer. \
Generate complete, compilable contract code for the user's request.\n\n\
Requirements:\n\
1. Use Solidity 0.8.20\n\
2. Include the complete contract logic\n\
3. The code must compile\n\
4. Output only code, no explanations\n\n\
Format example:\n\
// SPDX-License-Identifier: MIT\n\
pragma solidity ^0.8.20;\n\n\
contract MyContract {\n    // contract logic\n}";

const REPAIR_SYSTEM_PROMPT: &str = "You are a smart-contract security expert. Fix the detected \
vulnerabilities in the code and add security comments describing each fix. Output only the \
complete fixed code, no other explanation.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat-completions client (DeepSeek by default).
pub struct ChatCompletionsAuthor {
    client: Client,
    api_url: String,
    model: String,
    api_key: SecretString,
    timeout: Duration,
}

impl ChatCompletionsAuthor {
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Self {
        let client = match Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(err) => {
                tracing::warn!(
                    "[TOOLS] failed to construct LLM HTTP client: {err}. Falling back to default client."
                );
                Client::new()
            }
        };
        Self {
            client,
            api_url: api_url.into(),
            model: model.into(),
            api_key,
            timeout,
        }
    }

    /// `None` when no API key was provided.
    pub fn from_settings(settings: &LlmSettings) -> Option<Self> {
        let key = settings.api_key.clone()?;
        Some(Self::new(
            settings.api_url.clone(),
            settings.model.clone(),
            key,
            Duration::from_millis(settings.timeout_ms),
        ))
    }

    async fn complete(
        &self,
        system: &str,
        user: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ToolError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            max_tokens,
            stream: false,
        };

        let resp = tokio::time::timeout(
            self.timeout,
            self.client
                .post(&self.api_url)
                .bearer_auth(self.api_key.expose())
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| {
            ToolError::Model(format!(
                "chat completion timed out after {}ms",
                self.timeout.as_millis()
            ))
        })?
        .map_err(|err| ToolError::Model(compact_error_message(&err.to_string(), 260)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|err| ToolError::Model(compact_error_message(&err.to_string(), 260)))?;
        if !status.is_success() {
            return Err(ToolError::Model(format!(
                "HTTP {}: {}",
                status,
                compact_error_message(&text, 200)
            )));
        }
        extract_completion(&text)
    }
}

/// First choice's content, or an error when the reply is empty.
pub fn extract_completion(body: &str) -> Result<String, ToolError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|err| {
        ToolError::Model(format!(
            "malformed chat completion ({err}): {}",
            compact_error_message(body, 160)
        ))
    })?;
    let Some(choice) = parsed.choices.into_iter().next() else {
        return Err(ToolError::Model("model returned no choices".to_string()));
    };
    match choice.message.and_then(|m| m.content) {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(ToolError::Model("model returned empty content".to_string())),
    }
}

/// Numbered finding list embedded in the repair prompt.
pub fn describe_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .enumerate()
        .map(|(i, f)| {
            format!(
                "{}. {} (line {}) - severity: {}\n   suggestion: {}",
                i + 1,
                f.kind,
                f.line,
                f.severity,
                f.suggestion
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ContractAuthor for ChatCompletionsAuthor {
    async fn generate(&self, description: &str) -> Result<String, ToolError> {
        if description.trim().is_empty() {
            return Err(ToolError::InvalidSource(
                "contract description is empty".to_string(),
            ));
        }
        tracing::info!("[TOOLS] requesting contract generation from {}", self.model);
        let raw = self
            .complete(
                GENERATE_SYSTEM_PROMPT,
                format!("Generate a smart contract: {description}"),
                GENERATE_TEMPERATURE,
                GENERATE_MAX_TOKENS,
            )
            .await?;
        Ok(clean_source(&raw))
    }

    async fn repair(&self, code: &str, findings: &[Finding]) -> Result<String, ToolError> {
        tracing::info!(
            "[TOOLS] requesting repair of {} findings from {}",
            findings.len(),
            self.model
        );
        let raw = self
            .complete(
                REPAIR_SYSTEM_PROMPT,
                format!(
                    "Original code:\n```solidity\n{code}\n```\n\nDetected vulnerabilities:\n{}\n\nFix these vulnerabilities and return the complete code.",
                    describe_findings(findings)
                ),
                REPAIR_TEMPERATURE,
                REPAIR_MAX_TOKENS,
            )
            .await?;
        Ok(clean_source(&raw))
    }
}
