#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// One canned HTTP reply.
pub struct Reply {
    status: &'static str,
    content_type: &'static str,
    chunks: Vec<Vec<u8>>,
}

impl Reply {
    pub fn json(status: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: "application/json",
            chunks: vec![body.into()],
        }
    }

    pub fn ok(body: serde_json::Value) -> Self {
        Self::json("200 OK", body.to_string())
    }

    /// An event stream written one chunk at a time, closed after the last one.
    pub fn sse(chunks: Vec<&'static str>) -> Self {
        Self {
            status: "200 OK",
            content_type: "text/event-stream",
            chunks: chunks.into_iter().map(|c| c.as_bytes().to_vec()).collect(),
        }
    }
}

/// What the client sent.
#[derive(Debug)]
pub struct Captured {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub struct MockServer {
    pub addr: SocketAddr,
    requests: mpsc::UnboundedReceiver<Captured>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// Serves `replies` in order, one connection each.
    pub async fn start(replies: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, requests) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            for reply in replies {
                let (mut stream, _) = listener.accept().await.unwrap();
                let captured = read_request(&mut stream).await;
                let _ = tx.send(captured);
                write_reply(&mut stream, reply).await;
            }
        });
        Self {
            addr,
            requests,
            handle,
        }
    }

    pub fn api_base(&self) -> String {
        format!("http://{}/v1beta/models", self.addr)
    }

    pub async fn next_request(&mut self) -> Captured {
        self.requests.recv().await.expect("request captured")
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read_request(stream: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        if n == 0 {
            break buf.len();
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let headers: Vec<(String, String)> = head
        .lines()
        .skip(1)
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();
    let content_length = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Captured {
        request_line: head.lines().next().unwrap_or_default().to_string(),
        headers,
        body: buf[header_end..].to_vec(),
    }
}

async fn write_reply(stream: &mut TcpStream, reply: Reply) {
    let Reply {
        status,
        content_type,
        chunks,
    } = reply;

    if content_type == "text/event-stream" {
        let headers = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(headers.as_bytes()).await.unwrap();
        for chunk in chunks {
            stream.write_all(&chunk).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    } else {
        let body = chunks.concat();
        let headers = format!(
            "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(headers.as_bytes()).await.unwrap();
        stream.write_all(&body).await.unwrap();
    }
    let _ = stream.shutdown().await;
}

pub fn text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP",
            "index": 0
        }]
    })
}
