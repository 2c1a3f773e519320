//! Model listing and text embeddings.

use gemini::v1beta::{
    Content,
    embedding::{EmbedContentRequest, TaskType},
};
use tracing::info;

#[path = "common/setup.rs"]
mod setup;

const EMBEDDING_MODEL: &str = "text-embedding-004";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();
    let client = config.client();

    for model in client.list_all_models().await? {
        if model.supports("embedContent") {
            println!("{}", model.name);
        }
    }

    let request = EmbedContentRequest::new(
        EMBEDDING_MODEL,
        Content::user_text("What is the meaning of life?"),
    )
    .with_task_type(TaskType::RetrievalQuery);
    let embedding = client.embed_content(&request).await?;
    info!(dimensions = embedding.dimensions(), "embedded query");

    let documents = [
        "How does Alphabet Inc. make money?",
        "How many paws are in my house?",
    ];
    let requests: Vec<_> = documents
        .iter()
        .map(|text| {
            EmbedContentRequest::new(EMBEDDING_MODEL, Content::user_text(*text))
                .with_task_type(TaskType::RetrievalDocument)
                .with_output_dimensionality(256u32)
        })
        .collect();
    let embeddings = client.batch_embed_contents(EMBEDDING_MODEL, &requests).await?;
    for (text, embedding) in documents.iter().zip(&embeddings) {
        println!("{text}: {:?}", &embedding.values[..embedding.values.len().min(4)]);
    }
    Ok(())
}
