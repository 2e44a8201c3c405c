use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;

use crate::ServerEvent;

pub type RunId = u64;

/// One markdown file to send in the multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    ChannelOpened,
    ChannelClosed {
        reason: String,
    },
    Push(ServerEvent),
    UploadCompleted {
        run: RunId,
        result: Result<String, TransportError>,
    },
    TriggerCompleted {
        run: RunId,
        result: Result<(), TransportError>,
    },
    DownloadCompleted {
        result: Result<PathBuf, TransportError>,
    },
}

/// Failure talking to the server. `message` is what the user gets to see.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    /// The server answered with `success: false`.
    Rejected,
    MissingSession,
    MalformedResponse,
    ChannelUnavailable,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Rejected => write!(f, "rejected by server"),
            FailureKind::MissingSession => write!(f, "missing session id"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::ChannelUnavailable => write!(f, "push channel unavailable"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}
