//! Function calling: the model proposes arithmetic calls, this program runs
//! them and sends the results back.

use gemini::v1beta::{
    Content, FunctionCall, FunctionResponse,
    chat::Chat,
    request::{FunctionCallingMode, FunctionDeclaration, Tool, ToolConfig},
    schema::Schema,
};
use serde::Deserialize;
use tracing::info;

#[path = "common/setup.rs"]
mod setup;

#[derive(Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

fn declare(name: &str, description: &str) -> FunctionDeclaration {
    FunctionDeclaration::new(name, description).with_parameters(
        Schema::object([
            ("a", Schema::number().with_description("The first number.")),
            ("b", Schema::number().with_description("The second number.")),
        ])
        .with_required(["a", "b"]),
    )
}

fn run(call: &FunctionCall) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
    let Operands { a, b } = call.args_as()?;
    Ok(match call.name.as_str() {
        "add" => a + b,
        "subtract" => a - b,
        "multiply" => a * b,
        "divide" => a / b,
        other => return Err(format!("unknown function {other}").into()),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = setup::init();

    let template = config
        .request("")
        .with_tools(vec![Tool::functions(vec![
            declare("add", "Returns a + b."),
            declare("subtract", "Returns a - b."),
            declare("multiply", "Returns a * b."),
            declare("divide", "Returns a / b."),
        ])])
        .with_tool_config(ToolConfig::with_mode(FunctionCallingMode::Auto));
    let mut chat = Chat::new(config.client(), template)?;

    let mut response = chat
        .send_message("I have 57 cats, each owns 44 mittens, how many mittens is that in total?")
        .await?;
    loop {
        let calls: Vec<FunctionCall> = response.function_calls().into_iter().cloned().collect();
        if calls.is_empty() {
            break;
        }
        let mut parts = Vec::with_capacity(calls.len());
        for call in &calls {
            let result = run(call)?;
            info!(function = %call.name, result, "function called");
            parts.extend(Content::function_response(FunctionResponse::for_call(call, result)).parts);
        }
        response = chat.send_message(Content::user_parts(parts)).await?;
    }
    println!("{}", response.text()?);

    Ok(())
}
