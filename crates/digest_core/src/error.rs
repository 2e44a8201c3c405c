use thiserror::Error;

use crate::Severity;

/// Every failure the client reports to the user. `Display` is the notice text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Please select only Markdown (.md) files.")]
    NoEligibleFiles,
    #[error("Please select at least one file to process.")]
    NoFilesSelected,
    #[error("Error: {0}")]
    Upload(String),
    #[error("Error: {0}")]
    TriggerRejected(String),
    #[error("Session mismatch: server announced {announced} but this run is bound to {bound}")]
    SessionMismatch { announced: String, bound: String },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Connection to the server was lost: {0}")]
    ChannelLost(String),
    #[error("Download failed: {0}")]
    DownloadFailed(String),
}

impl ClientError {
    pub fn severity(&self) -> Severity {
        match self {
            ClientError::NoEligibleFiles
            | ClientError::NoFilesSelected
            | ClientError::ChannelLost(_) => Severity::Warning,
            ClientError::Upload(_)
            | ClientError::TriggerRejected(_)
            | ClientError::SessionMismatch { .. }
            | ClientError::ProcessingFailed(_)
            | ClientError::DownloadFailed(_) => Severity::Danger,
        }
    }
}
