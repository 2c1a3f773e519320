use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::fmt::Formatter;

pub const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct Content {
    #[serde(default)]
    pub role: Role,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::new(Role::Model, vec![Part::text(text)])
    }

    pub fn user_parts(parts: impl Into<Vec<Part>>) -> Self {
        Self::new(Role::User, parts.into())
    }

    /// Reply to a function call proposed by the model.
    pub fn function_response(response: FunctionResponse) -> Self {
        Self::new(
            Role::User,
            vec![Part::new(PartData::FunctionResponse(response))],
        )
    }

    /// Non-thought text parts joined in order.
    pub fn text(&self) -> Option<String> {
        let mut text: Option<String> = None;
        for part in self.parts.iter().filter(|p| !p.thought) {
            if let PartData::Text(fragment) = &part.data {
                text.get_or_insert_with(String::new).push_str(fragment);
            }
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PartData {
    Text(String),
    InlineData(InlineData),
    FileData(FileData),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    ExecutableCode(ExecutableCode),
    CodeExecutionResult(CodeExecutionResult),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new, Setters)]
#[serde(rename_all = "camelCase")]
#[setters(prefix = "with_", into)]
pub struct Part {
    #[serde(flatten)]
    #[setters(skip)]
    pub data: PartData,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[new(default)]
    pub thought: bool,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(PartData::Text(text.into()))
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(PartData::InlineData(InlineData::new(mime_type, data.into())))
    }

    pub fn file_data(mime_type: impl Into<String>, file_uri: impl Into<String>) -> Self {
        Self::new(PartData::FileData(FileData::new(mime_type, file_uri)))
    }
}

impl From<&str> for Part {
    fn from(text: &str) -> Self {
        Part::text(text)
    }
}

impl From<String> for Part {
    fn from(text: String) -> Self {
        Part::text(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(into)]
    pub id: Option<String>,
    #[new(into)]
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl FunctionCall {
    /// Decode the named arguments into a caller-defined struct.
    pub fn args_as<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(self.args.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResult {
    #[new(into)]
    pub result: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(into)]
    pub id: Option<String>,
    #[new(into)]
    pub name: String,
    #[new(into)]
    pub response: FunctionResult,
}

impl FunctionResponse {
    /// Answer `call` with `result`, echoing its id.
    pub fn for_call(call: &FunctionCall, result: impl Into<serde_json::Value>) -> Self {
        Self::new(
            call.id.clone(),
            call.name.clone(),
            FunctionResult::new(result),
        )
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
/// Binary data sent as part of a message.
///
/// The bytes are encoded using base64 when serialized to JSON.
pub struct InlineData {
    #[new(into)]
    mime_type: String,
    #[serde(
        serialize_with = "serialize_base64",
        deserialize_with = "deserialize_base64"
    )]
    data: Vec<u8>,
}

impl InlineData {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

impl std::fmt::Debug for InlineData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineData")
            .field("mime_type", &self.mime_type)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    #[new(into)]
    mime_type: String,
    #[new(into)]
    file_uri: String,
}

impl FileData {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_uri(&self) -> &str {
        &self.file_uri
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new)]
pub struct ExecutableCode {
    #[new(into)]
    pub language: String,
    #[new(into)]
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Enumeration of possible outcomes of the code execution.
pub enum CodeExecutionOutcome {
    #[serde(rename = "OUTCOME_UNSPECIFIED")]
    Unspecified,
    /// Code execution completed successfully.
    #[serde(rename = "OUTCOME_OK")]
    Ok,
    /// Code execution finished but with a failure. stderr should contain the reason.
    #[serde(rename = "OUTCOME_FAILED")]
    Failed,
    /// Code execution ran for too long, and was cancelled. There may or may not be a partial output present.
    #[serde(rename = "OUTCOME_DEADLINE_EXCEEDED")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new, Setters)]
#[setters(prefix = "with_", strip_option, into)]
pub struct CodeExecutionResult {
    pub outcome: CodeExecutionOutcome,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Model,
    System,
}

pub mod safety {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum HarmCategory {
        HarmCategoryUnspecified,
        HarmCategorySexuallyExplicit,
        HarmCategoryHateSpeech,
        HarmCategoryHarassment,
        HarmCategoryDangerousContent,
        HarmCategoryCivicIntegrity,
        #[serde(other)]
        Unknown,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum HarmProbability {
        HarmProbabilityUnspecified,
        Negligible,
        Low,
        Medium,
        High,
        #[serde(other)]
        Unknown,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum HarmBlockThreshold {
        HarmBlockThresholdUnspecified,
        BlockLowAndAbove,
        #[serde(rename = "BLOCK_MEDIUM_AND_ABOVE")]
        BlockMedAndAbove,
        BlockOnlyHigh,
        BlockNone,
        Off,
    }
}

/// The call boundary to a hosted model.
///
/// [`rest::Client`] talks to the Gemini REST endpoints; anything else that can
/// produce responses (a proxy, a recorded fixture) can stand in for it.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, request: request::Request) -> Result<response::Response, Error>;

    async fn stream_content(&self, request: request::Request) -> Result<ContentStream, Error>;
}

/// Serialize a byte array as a base64 encoded string.
fn serialize_base64<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&general_purpose::STANDARD.encode(bytes))
}

/// Deserialize a base64 encoded string into raw bytes.
fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    general_purpose::STANDARD
        .decode(s)
        .map_err(serde::de::Error::custom)
}

pub mod chat;
pub mod embedding;
mod error;
pub mod media;
pub mod request;
pub mod response;
pub mod rest;
pub mod schema;
mod sse;
pub mod stream;

pub use error::{BuildError, Error, Phase, TransportError};
pub use stream::{Aggregate, ContentStream, StreamState};
