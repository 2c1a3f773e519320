use super::{CodeExecutionResult, Content, ExecutableCode, FunctionCall, PartData, safety};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub thoughts_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub safety_ratings: Vec<SafetyRating>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    pub category: safety::HarmCategory,
    pub probability: safety::HarmProbability,
    #[serde(default)]
    pub blocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    FinishReasonUnspecified,
    Stop,
    MaxTokens,
    Safety,
    Recitation,
    Language,
    Blocklist,
    ProhibitedContent,
    Spii,
    MalformedFunctionCall,
    Other,
    #[serde(other)]
    Unknown,
}

impl FinishReason {
    /// Generation stopped because a safety or content policy fired.
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            FinishReason::Safety
                | FinishReason::Blocklist
                | FinishReason::ProhibitedContent
                | FinishReason::Spii
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockReason {
    BlockReasonUnspecified,
    Safety,
    Other,
    Blocklist,
    ProhibitedContent,
    #[serde(other)]
    Unknown,
}

/// The call succeeded but did not carry what the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoResult {
    #[error("no candidates returned (block reason: {block_reason:?})")]
    NoCandidates { block_reason: Option<BlockReason> },
    #[error("candidate has no content (finish reason: {finish_reason:?})")]
    NoContent { finish_reason: Option<FinishReason> },
    #[error("candidate has no text")]
    NoText,
    #[error("no function call received")]
    NoFunctionCall,
}

#[derive(Debug, Error)]
pub enum StructuredOutputError {
    #[error(transparent)]
    NoResult(#[from] NoResult),
    #[error("structured output does not match the expected shape: {0}")]
    Json(#[from] serde_json::Error),
}

impl Response {
    pub fn first_candidate(&self) -> Result<&Candidate, NoResult> {
        self.candidates.first().ok_or_else(|| NoResult::NoCandidates {
            block_reason: self.prompt_feedback.as_ref().and_then(|f| f.block_reason),
        })
    }

    fn first_content(&self) -> Result<&Content, NoResult> {
        let candidate = self.first_candidate()?;
        candidate.content.as_ref().ok_or(NoResult::NoContent {
            finish_reason: candidate.finish_reason,
        })
    }

    /// Text of the first candidate, thoughts excluded.
    pub fn text(&self) -> Result<String, NoResult> {
        self.first_content()?.text().ok_or(NoResult::NoText)
    }

    /// Text contributed by this response, empty when it carries none.
    pub(crate) fn text_fragment(&self) -> String {
        self.text().unwrap_or_default()
    }

    /// Summaries the model produced while thinking, in order.
    pub fn thoughts(&self) -> Vec<&str> {
        self.parts()
            .filter(|part| part.thought)
            .filter_map(|part| match &part.data {
                PartData::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates.first().and_then(|c| c.finish_reason)
    }

    /// Ratings of the first candidate, or of the prompt when it was blocked
    /// before any candidate was produced.
    pub fn safety_ratings(&self) -> &[SafetyRating] {
        match self.candidates.first() {
            Some(candidate) => &candidate.safety_ratings,
            None => self
                .prompt_feedback
                .as_ref()
                .map(|f| f.safety_ratings.as_slice())
                .unwrap_or_default(),
        }
    }

    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts()
            .filter_map(|part| match &part.data {
                PartData::FunctionCall(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    pub fn function_call(&self) -> Result<&FunctionCall, NoResult> {
        self.first_content()?;
        self.function_calls()
            .into_iter()
            .next()
            .ok_or(NoResult::NoFunctionCall)
    }

    pub fn executable_code(&self) -> Vec<&ExecutableCode> {
        self.parts()
            .filter_map(|part| match &part.data {
                PartData::ExecutableCode(code) => Some(code),
                _ => None,
            })
            .collect()
    }

    pub fn code_execution_results(&self) -> Vec<&CodeExecutionResult> {
        self.parts()
            .filter_map(|part| match &part.data {
                PartData::CodeExecutionResult(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    /// Parse the text of the first candidate as JSON, for requests made with
    /// an `application/json` response type.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, StructuredOutputError> {
        Ok(serde_json::from_str(&self.text()?)?)
    }

    fn parts(&self) -> impl Iterator<Item = &super::Part> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|content| content.parts.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCount {
    #[serde(default)]
    pub total_tokens: u32,
    #[serde(default)]
    pub cached_content_token_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_token_limit: Option<u32>,
    #[serde(default)]
    pub output_token_limit: Option<u32>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    /// Whether the model accepts `method`, e.g. `"generateContent"` or `"embedContent"`.
    pub fn supports(&self, method: &str) -> bool {
        self.supported_generation_methods.iter().any(|m| m == method)
    }
}

/// One page of a model listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPage {
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}
