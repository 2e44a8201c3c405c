use std::path::PathBuf;

use crate::{CandidateFile, Country, NoticeId, RunId, Timer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The client component came up; the push channel should be opened.
    Started,
    /// User picked or dropped files.
    FilesAdded(Vec<CandidateFile>),
    /// User removed the staged file at this position.
    FileRemoved(usize),
    /// User chose a country.
    CountrySelected(Country),
    /// User clicked the process button.
    ProcessClicked,
    /// User closed the startup modal. Purely cosmetic.
    ModalDismissed,
    /// The upload request resolved. `Ok` carries the server's session id,
    /// `Err` the message to show.
    UploadFinished {
        run: RunId,
        result: Result<String, String>,
    },
    /// The processing-trigger request resolved.
    TriggerFinished {
        run: RunId,
        result: Result<(), String>,
    },
    ChannelOpened,
    ChannelClosed { reason: String },
    /// Server-pushed event.
    Push(PushEvent),
    TimerFired(Timer),
    NoticeDismissed(NoticeId),
    DownloadClicked,
    DownloadFinished { result: Result<PathBuf, String> },
    ResetClicked,
    /// UI/render tick.
    Tick,
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Session id announced by the server on channel connect. Advisory only.
    Connected { session_id: String },
    /// Server acknowledged our `join_session`.
    SessionJoined { session_id: String },
    StatusUpdate { message: String },
    ProgressUpdate { value: u32 },
    TerminalOutput { text: String },
    ProcessingComplete(Completion),
}

/// Payload of the terminal `processing_complete` event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub success: bool,
    pub country: Option<String>,
    pub download_url: Option<String>,
    pub error: Option<String>,
}
