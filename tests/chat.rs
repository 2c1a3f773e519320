mod common;

use async_trait::async_trait;
use common::{MockServer, Reply, text_response};
use gemini::v1beta::{
    Content, ContentGenerator, ContentStream, Error, PartData, Phase, Role, StreamState,
    TransportError,
    chat::Chat,
    media::Attachment,
    request::{Request, RequestBuilder},
    response::Response,
    rest::Client,
};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio_stream::StreamExt;

/// Replays canned chunks and records what it was asked.
#[derive(Debug, Default)]
struct Scripted {
    replies: Mutex<VecDeque<Vec<Result<Response, TransportError>>>>,
    requests: Mutex<Vec<Request>>,
}

impl Scripted {
    fn reply(self, chunks: Vec<Result<Response, TransportError>>) -> Self {
        self.replies.lock().unwrap().push_back(chunks);
        self
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: Request) -> Vec<Result<Response, TransportError>> {
        self.requests.lock().unwrap().push(request);
        self.replies.lock().unwrap().pop_front().expect("scripted reply")
    }
}

#[async_trait]
impl ContentGenerator for Scripted {
    async fn generate_content(&self, request: Request) -> Result<Response, Error> {
        let model = request.model().to_string();
        match self.next(request).into_iter().next().expect("one chunk") {
            Ok(response) => Ok(response),
            Err(source) => Err(Error::Call { model, source }),
        }
    }

    async fn stream_content(&self, request: Request) -> Result<ContentStream, Error> {
        let model = request.model().to_string();
        let chunks = self.next(request);
        Ok(ContentStream::new(model, tokio_stream::iter(chunks)))
    }
}

fn text(text: &str) -> Response {
    serde_json::from_value(text_response(text)).unwrap()
}

fn blocked() -> Response {
    serde_json::from_value(serde_json::json!({
        "candidates": [{"finishReason": "SAFETY", "index": 0}]
    }))
    .unwrap()
}

fn inline_parts(contents: &[Content]) -> usize {
    contents
        .iter()
        .flat_map(|content| &content.parts)
        .filter(|part| matches!(part.data, PartData::InlineData(_)))
        .count()
}

fn unavailable() -> TransportError {
    TransportError::Api {
        status: 503,
        message: "UNAVAILABLE: The model is overloaded.".to_string(),
    }
}

fn seeded() -> RequestBuilder {
    RequestBuilder::new(
        "test",
        vec![
            Content::user_text("Hello"),
            Content::model_text("Great to meet you. What would you like to know?"),
        ],
    )
}

#[tokio::test]
async fn history_grows_by_two_per_turn() {
    let generator = Scripted::default()
        .reply(vec![Ok(text("Two."))])
        .reply(vec![Ok(text("Four paws each, so eight."))]);
    let mut chat = Chat::new(generator, seeded()).unwrap();
    assert_eq!(chat.history().len(), 2);

    let response = chat.send_message("I have 2 dogs in my house.").await.unwrap();
    assert_eq!(response.text().unwrap(), "Two.");
    assert_eq!(chat.history().len(), 4);

    chat.send_message("How many paws are in my house?").await.unwrap();
    assert_eq!(chat.history().len(), 6);
    assert_eq!(chat.history()[4], Content::user_text("How many paws are in my house?"));
    assert_eq!(chat.history()[5].role, Role::Model);

    let requests = chat.generator().requests();
    assert_eq!(requests[0].contents().len(), 3);
    assert_eq!(requests[1].contents().len(), 5);
}

#[tokio::test]
async fn failed_turn_leaves_history_untouched() {
    let generator = Scripted::default().reply(vec![Err(unavailable())]);
    let mut chat = Chat::new(generator, seeded()).unwrap();

    let err = chat.send_message("I have 2 dogs in my house.").await.unwrap_err();
    assert_eq!(err.phase(), Phase::Call);
    assert!(err.is_transient());
    assert_eq!(chat.history().len(), 2);
}

#[tokio::test]
async fn blocked_reply_is_not_committed() {
    let generator = Scripted::default()
        .reply(vec![Ok(blocked())])
        .reply(vec![Ok(text("Sure."))]);
    let mut chat = Chat::new(generator, seeded()).unwrap();

    let response = chat.send_message("Something unsafe.").await.unwrap();
    assert!(response.text().is_err());
    assert_eq!(chat.history().len(), 2);

    chat.send_message("Something else, then.").await.unwrap();
    assert_eq!(chat.history().len(), 4);
    assert_eq!(chat.history()[2], Content::user_text("Something else, then."));

    let requests = chat.generator().requests();
    let contents = requests[1].contents();
    assert_eq!(contents.len(), 3);
    for pair in contents.windows(2) {
        assert!(!(pair[0].role == Role::User && pair[1].role == Role::User));
    }
}

#[tokio::test]
async fn blocked_stream_is_not_committed() {
    let generator = Scripted::default().reply(vec![Ok(blocked())]);
    let mut chat = Chat::new(generator, seeded()).unwrap();

    let mut stream = chat.send_message_stream("Something unsafe.").await.unwrap();
    while let Some(chunk) = stream.next().await {
        chunk.unwrap();
    }
    assert_eq!(stream.text(), "");
    assert_eq!(stream.state(), StreamState::Closed);
    drop(stream);

    assert_eq!(chat.history().len(), 2);
    assert!(chat.history().iter().all(|content| !content.parts.is_empty()));
}

#[tokio::test]
async fn template_attachments_are_read_once_into_history() {
    let generator = Scripted::default()
        .reply(vec![Ok(text("A small organ."))])
        .reply(vec![Ok(text("Brown."))]);
    let template = RequestBuilder::new("test", "Look at this picture.")
        .attach(Attachment::from_bytes(b"\x89PNG".to_vec(), "image/png"));
    let mut chat = Chat::new(generator, template).unwrap();
    assert_eq!(chat.history().len(), 1);
    assert_eq!(chat.history()[0].parts.len(), 2);
    assert_eq!(inline_parts(chat.history()), 1);

    chat.send_message("What is it?").await.unwrap();
    chat.send_message("What color is it?").await.unwrap();
    assert_eq!(chat.history().len(), 5);

    let requests = chat.generator().requests();
    let contents = requests[1].contents();
    assert_eq!(contents, &chat.history()[..4]);
    assert_eq!(inline_parts(contents), 1);
    assert_eq!(contents[3], Content::user_text("What color is it?"));
}

#[tokio::test]
async fn unreadable_template_attachment_fails_the_chat() {
    let path = std::env::temp_dir().join(format!("{}.png", uuid::Uuid::new_v4()));
    let template = RequestBuilder::new("test", "Look at this picture.")
        .attach(Attachment::from_path(path.clone(), "image/png"));

    let err = Chat::new(Scripted::default(), template).unwrap_err();
    assert_eq!(err.phase(), Phase::Build);
    assert_eq!(err.model(), "test");
}

#[tokio::test]
async fn empty_turn_is_a_build_error() {
    let mut chat = Chat::new(Scripted::default(), RequestBuilder::new("test", "")).unwrap();
    let err = chat.send_message("").await.unwrap_err();
    assert_eq!(err.phase(), Phase::Build);
    assert!(chat.generator().requests().is_empty());
}

#[tokio::test]
async fn streamed_turn_is_committed_when_drained() {
    let generator = Scripted::default().reply(vec![Ok(text("Two ")), Ok(text("dogs."))]);
    let mut chat = Chat::new(generator, seeded()).unwrap();

    let mut stream = chat.send_message_stream("I have 2 dogs in my house.").await.unwrap();
    while let Some(chunk) = stream.next().await {
        chunk.unwrap();
    }
    assert_eq!(stream.text(), "Two dogs.");
    assert_eq!(stream.state(), StreamState::Closed);
    drop(stream);

    assert_eq!(chat.history().len(), 4);
    assert_eq!(chat.history()[3], Content::model_text("Two dogs."));
}

#[tokio::test]
async fn abandoned_stream_is_not_committed() {
    let generator = Scripted::default().reply(vec![Ok(text("Two ")), Ok(text("dogs."))]);
    let mut chat = Chat::new(generator, seeded()).unwrap();

    let mut stream = chat.send_message_stream("I have 2 dogs in my house.").await.unwrap();
    stream.next().await.unwrap().unwrap();
    stream.close();
    assert!(stream.next().await.is_none());
    drop(stream);

    assert_eq!(chat.history().len(), 2);
}

#[tokio::test]
async fn stream_error_is_not_committed() {
    let generator = Scripted::default().reply(vec![Ok(text("Two ")), Err(unavailable())]);
    let mut chat = Chat::new(generator, seeded()).unwrap();

    let mut stream = chat.send_message_stream("I have 2 dogs in my house.").await.unwrap();
    stream.next().await.unwrap().unwrap();
    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.phase(), Phase::Stream);
    assert!(stream.next().await.is_none());
    drop(stream);

    assert_eq!(chat.history().len(), 2);
}

#[tokio::test]
async fn chat_over_rest_replays_history() {
    let mut server = MockServer::start(vec![
        Reply::ok(text_response("Hello! How can I help?")),
        Reply::ok(text_response("You said hi.")),
    ])
    .await;
    let client = Client::new("key").with_api_base(server.api_base());
    let mut chat = Chat::new(client, RequestBuilder::new("test", "")).unwrap();

    chat.send_message("hi").await.unwrap();
    chat.send_message("What did I say?").await.unwrap();

    server.next_request().await;
    let second = server.next_request().await.json();
    let contents = second["contents"].as_array().unwrap();
    assert_eq!(contents.len(), 3);
    assert_eq!(contents[0]["parts"][0]["text"], "hi");
    assert_eq!(contents[1]["role"], "model");
    assert_eq!(contents[2]["parts"][0]["text"], "What did I say?");
}
