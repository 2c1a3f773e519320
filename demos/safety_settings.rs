//! Safety settings, and telling a blocked answer apart from a failure.

use gemini::v1beta::{
    request::SafetySetting,
    response::NoResult,
    safety::{HarmBlockThreshold, HarmCategory},
};
use tracing::warn;

#[path = "common/setup.rs"]
mod setup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();

    let request = config
        .request("I support Martians Soccer Club and I think Jupiterians Football Club sucks! Write an ironic phrase about them.")
        .with_safety_settings(vec![
            SafetySetting::new(HarmCategory::HarmCategoryHarassment, HarmBlockThreshold::BlockOnlyHigh),
            SafetySetting::new(
                HarmCategory::HarmCategoryHateSpeech,
                HarmBlockThreshold::BlockMedAndAbove,
            ),
        ])
        .build()?;
    let response = config.client().generate_content(request).await?;

    match response.text() {
        Ok(text) => println!("{text}"),
        Err(NoResult::NoCandidates { block_reason }) => warn!(?block_reason, "prompt blocked"),
        Err(no_result) => warn!(%no_result, finish_reason = ?response.finish_reason(), "no answer"),
    }
    for rating in response.safety_ratings() {
        println!("{:?}: {:?}", rating.category, rating.probability);
    }

    Ok(())
}
