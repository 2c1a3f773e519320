//! Text embeddings (`embedContent` and `batchEmbedContents`).

use super::Content;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};

/// What the embedding will be used for. Lets the service tune the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    TaskTypeUnspecified,
    RetrievalQuery,
    RetrievalDocument,
    SemanticSimilarity,
    Classification,
    Clustering,
    QuestionAnswering,
    FactVerification,
}

/// One content to embed. Batches are slices of these, all naming the same model.
#[derive(Debug, Clone, PartialEq, Serialize, Setters)]
#[setters(prefix = "with_", into, strip_option)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    #[setters(skip)]
    model: String,
    #[setters(skip)]
    content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<TaskType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<u32>,
}

impl EmbedContentRequest {
    /// `model` may be given with or without its `models/` prefix.
    pub fn new(model: impl Into<String>, content: impl Into<Content>) -> Self {
        let model = model.into();
        let model = if model.starts_with("models/") {
            model
        } else {
            format!("models/{model}")
        };
        Self {
            model,
            content: content.into(),
            task_type: None,
            title: None,
            output_dimensionality: None,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn content(&self) -> &Content {
        &self.content
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Embedding {
    #[serde(default)]
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbedContentResponse {
    pub(crate) embedding: Embedding,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchEmbedContentsResponse {
    #[serde(default)]
    pub(crate) embeddings: Vec<Embedding>,
}
