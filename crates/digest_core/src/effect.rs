use std::time::Duration;

use crate::{CandidateFile, Country, NoticeId, RunId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the push channel to the server.
    OpenChannel,
    /// Multipart upload of every candidate file plus the country field.
    Upload {
        run: RunId,
        country: Country,
        files: Vec<CandidateFile>,
    },
    /// Join the session-scoped room on the push channel.
    JoinSession { session_id: String },
    /// Ask the server to start processing the uploaded session.
    TriggerProcessing { run: RunId, session_id: String },
    /// Deliver `Msg::TimerFired(timer)` after `after` has elapsed.
    Schedule { after: Duration, timer: Timer },
    ScrollTo(ScrollTarget),
    /// Forget the file picker's current value so the same path can be picked again.
    ClearFilePicker,
    /// Fetch the finished digest.
    Download { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    /// Switch the startup modal to its "started" text.
    ModalStarted { run: RunId },
    /// Hide the startup modal and reveal the progress section.
    RevealProgress { run: RunId },
    /// Auto-remove a notice.
    ExpireNotice { id: NoticeId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Progress,
    Download,
}
