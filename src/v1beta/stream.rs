//! Consumption of `streamGenerateContent` responses.

use super::response::{FinishReason, Response, SafetyRating, UsageMetadata};
use super::{Content, Error, FunctionCall, Part, PartData, Role, TransportError};
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio_stream::{Stream, StreamExt};
use tracing::debug;

type ChunkStream = Pin<Box<dyn Stream<Item = Result<Response, TransportError>> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Chunks may still arrive.
    Open,
    /// End of stream was seen and the body is being released. Transient:
    /// `poll_next` moves on to `Closed` before it returns, so callers only
    /// see it in the release log.
    Draining,
    /// The body has been released. No more chunks will be yielded.
    Closed,
}

/// Everything a stream has delivered so far, folded into one value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub text: String,
    pub function_calls: Vec<FunctionCall>,
    pub finish_reason: Option<FinishReason>,
    pub safety_ratings: Vec<SafetyRating>,
    pub usage_metadata: Option<UsageMetadata>,
}

impl Aggregate {
    fn absorb(&mut self, chunk: &Response) {
        self.text.push_str(&chunk.text_fragment());
        self.function_calls
            .extend(chunk.function_calls().into_iter().cloned());
        if let Some(reason) = chunk.finish_reason() {
            self.finish_reason = Some(reason);
        }
        let ratings = chunk.safety_ratings();
        if !ratings.is_empty() {
            self.safety_ratings = ratings.to_vec();
        }
        if chunk.usage_metadata.is_some() {
            self.usage_metadata = chunk.usage_metadata.clone();
        }
    }

    /// The model turn this stream produced, for appending to a conversation.
    pub fn to_content(&self) -> Content {
        let mut parts = Vec::with_capacity(1 + self.function_calls.len());
        if !self.text.is_empty() {
            parts.push(Part::text(self.text.clone()));
        }
        parts.extend(
            self.function_calls
                .iter()
                .cloned()
                .map(|call| Part::new(PartData::FunctionCall(call))),
        );
        Content::new(Role::Model, parts)
    }
}

/// A lazily produced, finite sequence of response chunks.
///
/// Every chunk is yielded as it arrives and its text is appended to a running
/// [`Aggregate`]. The underlying body is released exactly once: at end of
/// stream, after a mid-stream error, on [`ContentStream::close`], or on drop,
/// whichever comes first.
pub struct ContentStream {
    model: String,
    inner: Option<ChunkStream>,
    state: StreamState,
    aggregate: Aggregate,
    chunks: usize,
}

impl std::fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentStream")
            .field("model", &self.model)
            .field("state", &self.state)
            .field("chunks", &self.chunks)
            .finish()
    }
}

impl ContentStream {
    pub fn new<S>(model: impl Into<String>, chunks: S) -> Self
    where
        S: Stream<Item = Result<Response, TransportError>> + Send + 'static,
    {
        Self {
            model: model.into(),
            inner: Some(Box::pin(chunks)),
            state: StreamState::Open,
            aggregate: Aggregate::default(),
            chunks: 0,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Chunks yielded so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    /// Text received so far.
    pub fn text(&self) -> &str {
        &self.aggregate.text
    }

    /// Stop consuming and release the body. Safe to call repeatedly.
    pub fn close(&mut self) {
        self.release();
    }

    /// Drain the remaining chunks and return the full text.
    pub async fn into_text(self) -> Result<String, Error> {
        Ok(self.into_aggregate().await?.text)
    }

    /// Drain the remaining chunks and return everything they carried.
    pub async fn into_aggregate(mut self) -> Result<Aggregate, Error> {
        while let Some(chunk) = self.next().await {
            chunk?;
        }
        Ok(std::mem::take(&mut self.aggregate))
    }

    fn release(&mut self) {
        if let Some(inner) = self.inner.take() {
            drop(inner);
            debug!(
                model = %self.model,
                from = ?self.state,
                chunks = self.chunks,
                text_len = self.aggregate.text.len(),
                "stream released"
            );
        }
        self.state = StreamState::Closed;
    }
}

impl Stream for ContentStream {
    type Item = Result<Response, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(inner.as_mut().poll_next(cx)) {
            Some(Ok(chunk)) => {
                this.chunks += 1;
                this.aggregate.absorb(&chunk);
                debug!(model = %this.model, chunk = this.chunks, "chunk received");
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(source)) => {
                this.release();
                Poll::Ready(Some(Err(Error::Stream {
                    model: this.model.clone(),
                    source,
                })))
            }
            None => {
                this.state = StreamState::Draining;
                this.release();
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for ContentStream {
    fn drop(&mut self) {
        self.release();
    }
}
