//! Multi-turn chat, blocking and streamed.

use gemini::v1beta::{Content, chat::Chat};
use tokio_stream::StreamExt;
use tracing::info;

#[path = "common/setup.rs"]
mod setup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();

    let template = config.request(vec![
        Content::user_text("Hello"),
        Content::model_text("Great to meet you. What would you like to know?"),
    ]);
    let mut chat = Chat::new(config.client(), template)?;

    let response = chat.send_message("I have 2 dogs in my house.").await?;
    println!("{}", response.text()?);

    let mut stream = chat
        .send_message_stream("How many paws are in my house?")
        .await?;
    while let Some(chunk) = stream.next().await {
        print!("{}", chunk?.text().unwrap_or_default());
    }
    println!();
    drop(stream);

    for content in chat.history() {
        info!(role = ?content.role, text = ?content.text(), "history");
    }

    Ok(())
}
