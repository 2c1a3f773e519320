//! Multi-turn conversations.
//!
//! A [`Chat`] keeps the history and replays it on every turn; the service
//! itself is stateless. A turn is committed only once the model has answered
//! with content. Failed, blocked and abandoned turns leave the history as it
//! was.

use super::request::{Prompt, RequestBuilder};
use super::response::Response;
use super::{Content, ContentGenerator, ContentStream, Error, StreamState};
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio_stream::Stream;
use tracing::debug;

#[derive(Debug)]
pub struct Chat<G> {
    generator: G,
    template: RequestBuilder,
    history: Vec<Content>,
}

impl<G: ContentGenerator> Chat<G> {
    /// Start a chat. The template supplies the model and the configuration of
    /// every turn. Its prompt and attachments, if any, seed the history; the
    /// attachments are read here, once.
    pub fn new(generator: G, template: RequestBuilder) -> Result<Self, Error> {
        let (template, history) = template.take_conversation()?;
        Ok(Self {
            generator,
            template,
            history,
        })
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    fn request(&self, turn: &[Content]) -> Result<super::request::Request, Error> {
        let mut contents = self.history.clone();
        contents.extend_from_slice(turn);
        self.template.clone().with_prompt(contents).build()
    }

    pub async fn send_message(&mut self, message: impl Into<Prompt>) -> Result<Response, Error> {
        let turn = message.into().into_contents();
        let request = self.request(&turn)?;
        let response = self.generator.generate_content(request).await?;

        let reply = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .filter(|content| !content.parts.is_empty());
        match reply {
            Some(content) => {
                self.history.extend(turn);
                self.history.push(content.clone());
                debug!(history = self.history.len(), "chat turn committed");
            }
            None => {
                debug!(finish_reason = ?response.finish_reason(), "empty reply, turn dropped");
            }
        }
        Ok(response)
    }

    /// Send a message and stream the reply. The turn is added to the history
    /// when the returned stream finishes without error and carried content.
    pub async fn send_message_stream(
        &mut self,
        message: impl Into<Prompt>,
    ) -> Result<ChatStream<'_>, Error> {
        let turn = message.into().into_contents();
        let request = self.request(&turn)?;
        let inner = self.generator.stream_content(request).await?;
        Ok(ChatStream {
            history: &mut self.history,
            turn,
            inner,
            failed: false,
        })
    }
}

/// A streamed chat reply that records itself in the history on completion.
#[derive(Debug)]
pub struct ChatStream<'a> {
    history: &'a mut Vec<Content>,
    turn: Vec<Content>,
    inner: ContentStream,
    failed: bool,
}

impl ChatStream<'_> {
    pub fn text(&self) -> &str {
        self.inner.text()
    }

    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn state(&self) -> StreamState {
        self.inner.state()
    }
}

impl Stream for ChatStream<'_> {
    type Item = Result<Response, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let was_open = this.inner.state() == StreamState::Open;
        let item = ready!(Pin::new(&mut this.inner).poll_next(cx));
        match &item {
            Some(Err(_)) => this.failed = true,
            None if was_open && !this.failed => {
                let reply = this.inner.aggregate().to_content();
                if reply.parts.is_empty() {
                    debug!(
                        finish_reason = ?this.inner.aggregate().finish_reason,
                        "empty streamed reply, turn dropped"
                    );
                } else {
                    this.history.append(&mut this.turn);
                    this.history.push(reply);
                    debug!(history = this.history.len(), "streamed chat turn committed");
                }
            }
            _ => {}
        }
        Poll::Ready(item)
    }
}
