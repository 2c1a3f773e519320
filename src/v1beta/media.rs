//! Local media for multimodal prompts.
//!
//! Bytes are paired with a MIME type chosen by the caller; nothing here looks
//! at the content, so a wrong type only shows up as an error from the service.

use super::{BuildError, Part};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maps a file extension to the MIME type Gemini expects for it.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "mp3" => "audio/mp3",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "aiff" => "audio/aiff",
        "mp4" => "video/mp4",
        "mpeg" | "mpg" => "video/mpeg",
        "mov" => "video/mov",
        "avi" => "video/avi",
        "webm" => "video/webm",
        "wmv" => "video/wmv",
        "3gp" => "video/3gpp",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" => "text/md",
        "html" => "text/html",
        "csv" => "text/csv",
        _ => return None,
    };
    Some(mime)
}

#[derive(Debug, Clone, PartialEq)]
enum Source {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// Binary input for a prompt. Paths are read lazily, when the request is built.
#[derive(Clone, PartialEq)]
pub struct Attachment {
    source: Source,
    mime_type: String,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Attachment");
        match &self.source {
            Source::Path(path) => s.field("path", path),
            Source::Bytes(bytes) => s.field("bytes", &bytes.len()),
        };
        s.field("mime_type", &self.mime_type).finish()
    }
}

impl Attachment {
    pub fn from_path(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        Self {
            source: Source::Path(path.into()),
            mime_type: mime_type.into(),
        }
    }

    /// Like [`Attachment::from_path`], with the MIME type taken from the extension.
    pub fn guess_from_path(path: impl Into<PathBuf>) -> Result<Self, BuildError> {
        let path = path.into();
        match mime_type_for(&path) {
            Some(mime_type) => Ok(Self::from_path(path, mime_type)),
            None => Err(BuildError::UnknownMimeType(path)),
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            source: Source::Bytes(bytes.into()),
            mime_type: mime_type.into(),
        }
    }

    /// Drains `reader` now; the reader is dropped before this returns.
    pub fn from_reader(mut reader: impl Read, mime_type: impl Into<String>) -> Result<Self, BuildError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(BuildError::AttachmentReader)?;
        Ok(Self::from_bytes(bytes, mime_type))
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn into_part(self) -> Result<Part, BuildError> {
        let bytes = match self.source {
            Source::Bytes(bytes) => bytes,
            Source::Path(path) => read_file(&path)?,
        };
        debug!(mime_type = %self.mime_type, bytes = bytes.len(), "attachment loaded");
        Ok(Part::inline_data(self.mime_type, bytes))
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, BuildError> {
    let attachment_error = |source| BuildError::Attachment {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(attachment_error)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(attachment_error)?;
    Ok(bytes)
}

/// Directory holding sample media, resolved relative to an explicit root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDir {
    root: PathBuf,
}

impl MediaDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    pub fn attachment(&self, name: impl AsRef<Path>, mime_type: impl Into<String>) -> Attachment {
        Attachment::from_path(self.path(name), mime_type)
    }

    pub fn guess_attachment(&self, name: impl AsRef<Path>) -> Result<Attachment, BuildError> {
        Attachment::guess_from_path(self.path(name))
    }
}
