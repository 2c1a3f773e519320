//! Prompts with local media attached. Files are read from `GEMINI_MEDIA_DIR`
//! (default `media/`).

use gemini::v1beta::{Content, Part};
use tracing::info;

#[path = "common/setup.rs"]
mod setup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();
    let client = config.client();
    let media = config.media();

    let request = config
        .request("Tell me about this instrument.")
        .attach(media.attachment("organ.jpg", "image/jpeg"))
        .build()?;
    println!("{}", client.generate_content(request).await?.text()?);

    let request = config
        .request("Give me a summary of this audio file.")
        .attach(media.guess_attachment("sample.mp3")?)
        .build()?;
    println!("{}", client.generate_content(request).await?.text()?);

    // Explicit parts keep the text after the image.
    let request = config
        .request(Content::user_parts(vec![
            Part::file_data("image/jpeg", "https://storage.googleapis.com/generativeai-downloads/images/scones.jpg"),
            Part::text("What is in this picture?"),
        ]))
        .build()?;
    let response = client.generate_content(request).await?;
    info!(finish_reason = ?response.finish_reason(), "done");
    println!("{}", response.text()?);

    Ok(())
}
