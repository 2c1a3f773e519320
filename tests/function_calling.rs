mod common;

use common::{MockServer, Reply, text_response};
use gemini::v1beta::{
    Content, FunctionResponse,
    chat::Chat,
    request::{FunctionCallingMode, FunctionDeclaration, RequestBuilder, Tool, ToolConfig},
    rest::Client,
    schema::Schema,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Operands {
    a: f64,
    b: f64,
}

fn operands() -> Schema {
    Schema::object([
        ("a", Schema::number().with_description("The first number.")),
        ("b", Schema::number().with_description("The second number.")),
    ])
    .with_required(["a", "b"])
}

fn arithmetic() -> Tool {
    Tool::functions(vec![
        FunctionDeclaration::new("add", "Returns the sum of a and b.").with_parameters(operands()),
        FunctionDeclaration::new("subtract", "Returns a minus b.").with_parameters(operands()),
    ])
}

fn call(name: &str, args: serde_json::Value) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"functionCall": {"id": "call-1", "name": name, "args": args}}]},
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn round_trip_through_a_tool() {
    let mut server = MockServer::start(vec![
        Reply::ok(call("subtract", json!({"a": 10, "b": 4}))),
        Reply::ok(text_response("10 minus 4 is 6.")),
    ])
    .await;
    let client = Client::new("key").with_api_base(server.api_base());
    let template = RequestBuilder::new("test", "")
        .with_tools(vec![arithmetic()])
        .with_tool_config(ToolConfig::with_mode(FunctionCallingMode::Auto));
    let mut chat = Chat::new(client, template).unwrap();

    let response = chat.send_message("What is 10 minus 4?").await.unwrap();
    let proposed = response.function_call().unwrap().clone();
    assert_eq!(proposed.name, "subtract");
    let Operands { a, b } = proposed.args_as().unwrap();

    let reply = Content::function_response(FunctionResponse::for_call(&proposed, a - b));
    let response = chat.send_message(reply).await.unwrap();
    assert_eq!(response.text().unwrap(), "10 minus 4 is 6.");
    assert_eq!(chat.history().len(), 4);

    let first = server.next_request().await.json();
    assert_eq!(first["tools"][0]["functionDeclarations"][1]["name"], "subtract");
    assert_eq!(first["toolConfig"]["functionCallingConfig"]["mode"], "AUTO");

    let second = server.next_request().await.json();
    let contents = second["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[1]["parts"][0]["functionCall"]["name"], "subtract");
    assert_eq!(
        contents[2]["parts"][0]["functionResponse"],
        json!({"id": "call-1", "name": "subtract", "response": {"result": 6.0}})
    );
}

#[tokio::test]
async fn several_calls_in_one_turn() {
    let server = MockServer::start(vec![Reply::ok(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [
                {"functionCall": {"name": "add", "args": {"a": 2, "b": 3}}},
                {"functionCall": {"name": "subtract", "args": {"a": 9, "b": 1}}}
            ]}
        }]
    }))])
    .await;
    let client = Client::new("key").with_api_base(server.api_base());
    let request = RequestBuilder::new("test", "Add 2 and 3, then subtract 1 from 9.")
        .with_tools(vec![arithmetic()])
        .build()
        .unwrap();

    let response = client.generate_content(request).await.unwrap();
    let results: Vec<f64> = response
        .function_calls()
        .into_iter()
        .map(|call| {
            let Operands { a, b } = call.args_as().unwrap();
            match call.name.as_str() {
                "add" => a + b,
                "subtract" => a - b,
                other => panic!("unexpected function {other}"),
            }
        })
        .collect();
    assert_eq!(results, vec![5.0, 8.0]);
}

#[test]
fn malformed_arguments_do_not_decode() {
    let response: gemini::v1beta::response::Response =
        serde_json::from_value(call("add", json!({"a": "two"}))).unwrap();
    let call = response.function_call().unwrap();
    assert!(call.args_as::<Operands>().is_err());
}
