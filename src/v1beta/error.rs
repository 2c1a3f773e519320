use std::path::PathBuf;
use thiserror::Error;

/// Where in the life of a call a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Local input was rejected before anything was sent.
    Build,
    /// The request was sent but no usable response came back.
    Call,
    /// The stream was open and failed between chunks.
    Stream,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build request for `{model}`: {source}")]
    Build {
        model: String,
        #[source]
        source: BuildError,
    },
    #[error("request to `{model}` failed: {source}")]
    Call {
        model: String,
        #[source]
        source: TransportError,
    },
    #[error("stream from `{model}` failed: {source}")]
    Stream {
        model: String,
        #[source]
        source: TransportError,
    },
}

impl Error {
    pub fn phase(&self) -> Phase {
        match self {
            Error::Build { .. } => Phase::Build,
            Error::Call { .. } => Phase::Call,
            Error::Stream { .. } => Phase::Stream,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Error::Build { model, .. } | Error::Call { model, .. } | Error::Stream { model, .. } => {
                model
            }
        }
    }

    /// Network failures, rate limiting and server errors. Nothing in this
    /// crate retries; this only tells the caller whether trying again could help.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Build { .. } => false,
            Error::Call { source, .. } | Error::Stream { source, .. } => source.is_transient(),
        }
    }
}

/// Local input problems, detected before any network call.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read attachment {}: {source}", .path.display())]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read attachment stream: {0}")]
    AttachmentReader(#[source] std::io::Error),
    #[error("cannot infer a MIME type for {}", .0.display())]
    UnknownMimeType(PathBuf),
    #[error("malformed schema at `{path}`: {reason}")]
    Schema { path: String, reason: &'static str },
    #[error("parameters of function `{name}` are malformed: {source}")]
    FunctionParameters {
        name: String,
        #[source]
        source: Box<BuildError>,
    },
    #[error("prompt has no contents")]
    EmptyPrompt,
}

/// Failures of the transport or the remote service.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("invalid UTF-8 in event stream: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Api { status, .. } => *status == 429 || *status >= 500,
            TransportError::Http(e) => !e.is_decode() && !e.is_builder(),
            TransportError::Json(_) | TransportError::Utf8(_) | TransportError::Url(_) => false,
        }
    }
}
