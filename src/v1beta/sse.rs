//! Decoding of `alt=sse` bodies into typed events.

use super::TransportError;
use async_stream::try_stream;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::str;
use tokio_stream::{Stream, StreamExt};

/// Buffers body bytes and splits them into lines. The `data:` lines of an
/// event are joined with `\n` and deserialized when the blank line that ends
/// the event arrives. Comments and other fields are skipped.
pub(crate) fn parse_sse_stream<T, S>(byte_stream: S) -> impl Stream<Item = Result<T, TransportError>> + Send
where
    T: DeserializeOwned + Send,
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send,
{
    try_stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut buffer = Vec::new();
        let mut data: Vec<String> = Vec::new();

        while let Some(chunk) = byte_stream.next().await {
            buffer.extend_from_slice(&chunk?);

            while let Some(newline) = buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = buffer.drain(..=newline).collect();
                let line = str::from_utf8(&line_bytes)?.trim_end_matches(['\n', '\r']);

                if line.is_empty() {
                    if let Some(event) = take_event(&mut data) {
                        yield serde_json::from_str::<T>(&event)?;
                    }
                } else if let Some(value) = field_value(line, "data") {
                    data.push(value.to_string());
                }
            }
        }

        // The body may end without the final blank line.
        let rest = str::from_utf8(&buffer)?.trim_end_matches(['\n', '\r']);
        if let Some(value) = field_value(rest, "data") {
            data.push(value.to_string());
        }
        if let Some(event) = take_event(&mut data) {
            yield serde_json::from_str::<T>(&event)?;
        }
    }
}

fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let value = line.strip_prefix(field)?.strip_prefix(':')?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

fn take_event(data: &mut Vec<String>) -> Option<String> {
    let event = data.join("\n");
    data.clear();
    (!event.trim().is_empty()).then_some(event)
}
