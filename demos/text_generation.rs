//! Text generation: one blocking call, one streamed call, and a token count.

use gemini::v1beta::request::GenerationConfig;
use tokio_stream::StreamExt;
use tracing::info;

#[path = "common/setup.rs"]
mod setup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();
    let client = config.client();

    let request = config
        .request("Write a story about a magic backpack.")
        .with_generation_config(
            GenerationConfig::new()
                .with_max_output_tokens(200)
                .with_temperature(1.0),
        )
        .build()?;
    let response = client.generate_content(request).await?;
    println!("{}", response.text()?);
    if let Some(usage) = &response.usage_metadata {
        info!(?usage, "usage");
    }

    let request = config
        .request("Write a story about a magic backpack.")
        .with_system_instruction("You are a cat. Your name is Neko.")
        .build()?;
    let mut stream = client.stream_content(request).await?;
    while let Some(chunk) = stream.next().await {
        print!("{}", chunk?.text().unwrap_or_default());
    }
    println!();
    info!(chunks = stream.chunk_count(), finish_reason = ?stream.aggregate().finish_reason, "stream done");

    let contents = config
        .request("The quick brown fox jumps over the lazy dog.")
        .build()?;
    let count = client.count_tokens(&config.model, contents.contents()).await?;
    let model = client.get_model(&config.model).await?;
    println!(
        "{} tokens (input limit {:?}, output limit {:?})",
        count.total_tokens, model.input_token_limit, model.output_token_limit
    );

    Ok(())
}
