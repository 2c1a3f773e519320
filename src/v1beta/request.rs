use super::media::Attachment;
use super::schema::Schema;
use super::{BuildError, Content, Error, Part, Role, safety};
use derive_new::new;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A fully assembled `generateContent` request.
///
/// The model id selects the endpoint and is not part of the JSON body.
#[derive(Debug, Clone, Deserialize, Serialize, new, Setters)]
#[setters(prefix = "with_")]
#[setters(into, strip_option)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(skip)]
    #[setters(skip)]
    #[new(into)]
    model: String,
    #[setters(skip)]
    #[new(into)]
    contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[new(default)]
    tools: Vec<Tool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    tool_config: Option<ToolConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[new(default)]
    safety_settings: Vec<SafetySetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    generation_config: Option<GenerationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    system_instruction: Option<SystemInstruction>,
}

impl Request {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn generation_config(&self) -> Option<&GenerationConfig> {
        self.generation_config.as_ref()
    }

    pub fn system_instruction(&self) -> Option<&SystemInstruction> {
        self.system_instruction.as_ref()
    }
}

/// What the caller asks: a bare string or an already assembled conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Text(String),
    Contents(Vec<Content>),
}

impl Prompt {
    pub fn into_contents(self) -> Vec<Content> {
        match self {
            Prompt::Text(text) if text.is_empty() => Vec::new(),
            Prompt::Text(text) => vec![Content::user_text(text)],
            Prompt::Contents(contents) => contents,
        }
    }
}

impl Default for Prompt {
    fn default() -> Self {
        Prompt::Contents(Vec::new())
    }
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<Content> for Prompt {
    fn from(content: Content) -> Self {
        Prompt::Contents(vec![content])
    }
}

impl From<Vec<Content>> for Prompt {
    fn from(contents: Vec<Content>) -> Self {
        Prompt::Contents(contents)
    }
}

impl From<Vec<Part>> for Prompt {
    fn from(parts: Vec<Part>) -> Self {
        Prompt::Contents(vec![Content::user_parts(parts)])
    }
}

/// Assembles a [`Request`], checking local input before anything is sent.
///
/// ```no_run
/// use gemini::v1beta::request::{GenerationConfig, RequestBuilder};
///
/// # fn run() -> Result<(), gemini::v1beta::Error> {
/// let request = RequestBuilder::new("gemini-2.0-flash", "Tell me a story about a magic backpack.")
///     .with_generation_config(
///         GenerationConfig::new()
///             .with_max_output_tokens(20)
///             .with_temperature(1.0),
///     )
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, new, Setters)]
#[setters(prefix = "with_", into, strip_option)]
pub struct RequestBuilder {
    #[setters(skip)]
    #[new(into)]
    model: String,
    #[new(into)]
    prompt: Prompt,
    #[new(default)]
    #[setters(skip)]
    attachments: Vec<Attachment>,
    #[new(default)]
    generation_config: Option<GenerationConfig>,
    #[new(default)]
    tools: Vec<Tool>,
    #[new(default)]
    tool_config: Option<ToolConfig>,
    #[new(default)]
    safety_settings: Vec<SafetySetting>,
    #[new(default)]
    system_instruction: Option<SystemInstruction>,
}

impl RequestBuilder {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    /// Queue a binary attachment. It is read by [`RequestBuilder::build`] and
    /// appended after the parts of the last user turn.
    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Split the prompt off the builder, with queued attachments read into it.
    /// The returned builder keeps the configuration and has neither.
    pub fn take_conversation(mut self) -> Result<(Self, Vec<Content>), Error> {
        let mut contents = std::mem::take(&mut self.prompt).into_contents();
        let attachments = std::mem::take(&mut self.attachments);
        append_attachments(&mut contents, attachments).map_err(|source| Error::Build {
            model: self.model.clone(),
            source,
        })?;
        Ok((self, contents))
    }

    pub fn build(self) -> Result<Request, Error> {
        let model = self.model.clone();
        self.assemble().map_err(|source| Error::Build { model, source })
    }

    fn assemble(self) -> Result<Request, BuildError> {
        let mut system_instruction = self.system_instruction;
        let mut contents = Vec::new();
        for content in self.prompt.into_contents() {
            if content.role == Role::System {
                system_instruction
                    .get_or_insert_with(SystemInstruction::default)
                    .parts
                    .extend(content.parts);
            } else {
                contents.push(content);
            }
        }

        append_attachments(&mut contents, self.attachments)?;

        if contents.is_empty() {
            return Err(BuildError::EmptyPrompt);
        }

        if let Some(schema) = self
            .generation_config
            .as_ref()
            .and_then(|config| config.response_schema.as_ref())
        {
            schema.validate()?;
        }

        for declaration in self.tools.iter().flat_map(Tool::function_declarations) {
            declaration.validate()?;
        }

        debug!(
            model = %self.model,
            contents = contents.len(),
            tools = self.tools.len(),
            "request assembled"
        );

        Ok(Request {
            model: self.model,
            contents,
            tools: self.tools,
            tool_config: self.tool_config,
            safety_settings: self.safety_settings,
            generation_config: self.generation_config,
            system_instruction,
        })
    }
}

/// Reads `attachments` and appends them after the parts of the last user turn,
/// or as a new user turn when there is none.
fn append_attachments(
    contents: &mut Vec<Content>,
    attachments: Vec<Attachment>,
) -> Result<(), BuildError> {
    if attachments.is_empty() {
        return Ok(());
    }
    let mut parts = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        parts.push(attachment.into_part()?);
    }
    match contents.iter().rposition(|c| c.role == Role::User) {
        Some(index) => contents[index].parts.extend(parts),
        None => contents.push(Content::user_parts(parts)),
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, new)]
#[serde(rename_all = "camelCase")]
pub struct SystemInstruction {
    #[new(into)]
    pub parts: Vec<Part>,
}

impl From<&str> for SystemInstruction {
    fn from(text: &str) -> Self {
        Self::new(vec![Part::text(text)])
    }
}

impl From<String> for SystemInstruction {
    fn from(text: String) -> Self {
        Self::new(vec![Part::text(text)])
    }
}

impl From<Content> for SystemInstruction {
    fn from(content: Content) -> Self {
        Self::new(content.parts)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, new)]
pub struct CodeExecution {}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, new)]
pub struct GoogleSearch {}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tool {
    FunctionDeclarations(Vec<FunctionDeclaration>),
    CodeExecution(CodeExecution),
    GoogleSearch(GoogleSearch),
}

impl Tool {
    pub fn functions(declarations: impl Into<Vec<FunctionDeclaration>>) -> Self {
        Tool::FunctionDeclarations(declarations.into())
    }

    pub fn code_execution() -> Self {
        Tool::CodeExecution(CodeExecution::new())
    }

    pub fn function_declarations(&self) -> &[FunctionDeclaration] {
        match self {
            Tool::FunctionDeclarations(declarations) => declarations,
            Tool::CodeExecution(_) | Tool::GoogleSearch(_) => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, new, Setters)]
#[setters(prefix = "with_")]
#[setters(into, strip_option)]
#[serde(rename_all = "camelCase")]
pub struct FunctionDeclaration {
    #[setters(skip)]
    #[new(into)]
    name: String,
    #[setters(skip)]
    #[new(into)]
    description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    parameters: Option<Schema>,
}

impl FunctionDeclaration {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> Option<&Schema> {
        self.parameters.as_ref()
    }

    fn validate(&self) -> Result<(), BuildError> {
        let Some(parameters) = &self.parameters else {
            return Ok(());
        };
        let malformed = |source| BuildError::FunctionParameters {
            name: self.name.clone(),
            source: Box::new(source),
        };
        parameters.validate().map_err(malformed)?;
        if !parameters.is_object() {
            return Err(malformed(BuildError::Schema {
                path: "$".to_string(),
                reason: "parameters must be an object",
            }));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum FunctionCallingMode {
    #[serde(rename = "MODE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "AUTO")]
    Auto,
    #[serde(rename = "ANY")]
    Any,
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "VALIDATED")]
    Validated,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, new, Setters)]
#[setters(prefix = "with_", strip_option)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallingConfig {
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<FunctionCallingMode>,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    allowed_function_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, new, Setters)]
#[setters(prefix = "with_", strip_option)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_calling_config: Option<FunctionCallingConfig>,
}

impl ToolConfig {
    pub fn with_mode(mode: FunctionCallingMode) -> Self {
        Self::new().with_function_calling_config(FunctionCallingConfig::new().with_mode(mode))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, new)]
#[serde(rename_all = "camelCase")]
pub struct SafetySetting {
    pub category: safety::HarmCategory,
    pub threshold: safety::HarmBlockThreshold,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, new, Setters)]
#[setters(prefix = "with_", strip_option)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    include_thoughts: Option<bool>,
    #[new(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thinking_budget: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Setters, new, Default, PartialEq)]
#[setters(prefix = "with_", strip_option)]
#[serde(rename_all = "camelCase")]
/// Configuration options controlling text generation.
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    candidate_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    #[setters(into)]
    stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    seed: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    presence_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    frequency_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    #[setters(into)]
    response_mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    #[setters(into)]
    response_schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[new(default)]
    thinking_config: Option<ThinkingConfig>,
}

impl GenerationConfig {
    pub fn response_schema(&self) -> Option<&Schema> {
        self.response_schema.as_ref()
    }

    pub fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }
}
