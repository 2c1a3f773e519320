//! Code execution: the model writes and runs Python on the service side.

use gemini::v1beta::request::Tool;

#[path = "common/setup.rs"]
mod setup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();

    let request = config
        .request(
            "What is the sum of the first 50 prime numbers? \
             Generate and run code for the calculation, and make sure you get all 50.",
        )
        .with_tools(vec![Tool::code_execution()])
        .build()?;
    let response = config.client().generate_content(request).await?;

    for code in response.executable_code() {
        println!("--- {} ---\n{}", code.language, code.code);
    }
    for result in response.code_execution_results() {
        println!("--- {:?} ---\n{}", result.outcome, result.output.as_deref().unwrap_or_default());
    }
    println!("{}", response.text()?);

    Ok(())
}
