use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::intake::CandidateSet;
use crate::notice::NoticeBoard;
use crate::view_model::{AppViewModel, FileRowView, StageView};
use crate::{
    format_file_size, CandidateFile, Country, IntakeStats, Notice, NoticeId, ProgressSnapshot,
    Severity, STAGE_LABELS,
};

pub type RunId = u64;

pub(crate) const MODAL_STARTING: &str = "Starting processing...";
pub(crate) const MODAL_STARTED: &str = "Processing Started!";

/// Explicit lifecycle of one submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    /// Multipart upload in flight.
    Uploading { run: RunId },
    /// Upload accepted and session joined; trigger request in flight.
    Triggering { run: RunId, session_id: String },
    /// Server is processing; push events drive the progress display.
    Tracking { run: RunId, session_id: String },
    Completed {
        run: RunId,
        session_id: String,
        download_url: Option<String>,
        country: String,
    },
    Failed {
        run: RunId,
        session_id: String,
        error: String,
    },
}

/// Coarse phase names used by rendering surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseLabel {
    #[default]
    Idle,
    Submitting,
    Tracking,
    Completed,
    Failed,
}

impl RunPhase {
    /// The "currently processing" guard.
    pub fn is_processing(&self) -> bool {
        matches!(
            self,
            RunPhase::Uploading { .. } | RunPhase::Triggering { .. } | RunPhase::Tracking { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed { .. } | RunPhase::Failed { .. })
    }

    /// Whether push events addressed to the joined session are applied.
    pub fn accepts_push(&self) -> bool {
        matches!(self, RunPhase::Triggering { .. } | RunPhase::Tracking { .. })
    }

    pub fn run(&self) -> Option<RunId> {
        match self {
            RunPhase::Idle => None,
            RunPhase::Uploading { run }
            | RunPhase::Triggering { run, .. }
            | RunPhase::Tracking { run, .. }
            | RunPhase::Completed { run, .. }
            | RunPhase::Failed { run, .. } => Some(*run),
        }
    }

    /// The authoritative session id, once the upload response has bound one.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            RunPhase::Idle | RunPhase::Uploading { .. } => None,
            RunPhase::Triggering { session_id, .. }
            | RunPhase::Tracking { session_id, .. }
            | RunPhase::Completed { session_id, .. }
            | RunPhase::Failed { session_id, .. } => Some(session_id),
        }
    }

    pub fn label(&self) -> PhaseLabel {
        match self {
            RunPhase::Idle => PhaseLabel::Idle,
            RunPhase::Uploading { .. } | RunPhase::Triggering { .. } => PhaseLabel::Submitting,
            RunPhase::Tracking { .. } => PhaseLabel::Tracking,
            RunPhase::Completed { .. } => PhaseLabel::Completed,
            RunPhase::Failed { .. } => PhaseLabel::Failed,
        }
    }
}

/// Cosmetic delays and notice lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Delay before the modal switches to its "started" text.
    pub started_delay: Duration,
    /// Further delay before the modal closes and progress is revealed.
    pub reveal_delay: Duration,
    /// How long a notice stays up unless dismissed.
    pub notice_lifetime: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            started_delay: Duration::from_millis(500),
            reveal_delay: Duration::from_millis(800),
            notice_lifetime: Duration::from_secs(5),
        }
    }
}

impl Pacing {
    /// No artificial delays; notices keep their lifetime.
    pub fn immediate() -> Self {
        Self {
            started_delay: Duration::ZERO,
            reveal_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    files: CandidateSet,
    country: Country,
    phase: RunPhase,
    last_run: RunId,
    advisory_session: Option<String>,
    progress: ProgressSnapshot,
    progress_visible: bool,
    modal_text: Option<String>,
    notices: NoticeBoard,
    last_intake: Option<IntakeStats>,
    channel_connected: bool,
    saved_download: Option<PathBuf>,
    pacing: Pacing,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pacing(pacing: Pacing) -> Self {
        Self {
            pacing,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let (download_visible, download_url) = match &self.phase {
            RunPhase::Completed { download_url, .. } => (true, download_url.clone()),
            _ => (false, None),
        };
        AppViewModel {
            phase: self.phase.label(),
            is_processing: self.phase.is_processing(),
            can_submit: self.can_submit(),
            country: self.country,
            session_id: self.phase.session_id().map(ToOwned::to_owned),
            files: self
                .files
                .as_slice()
                .iter()
                .enumerate()
                .map(|(index, file)| FileRowView {
                    index,
                    name: file.name.clone(),
                    size_label: format_file_size(file.size),
                })
                .collect(),
            last_intake: self.last_intake,
            modal_text: self.modal_text.clone(),
            progress_visible: self.progress_visible,
            percent: self.progress.percent(),
            status_text: self.progress.status_line().to_string(),
            stages: self
                .progress
                .stages()
                .iter()
                .map(|stage| StageView {
                    index: stage.index,
                    label: STAGE_LABELS[stage.index as usize],
                    status: stage.status,
                    icon: stage.icon,
                })
                .collect(),
            output_lines: self.progress.output().to_vec(),
            download_visible,
            download_url,
            saved_download: self.saved_download.clone(),
            notices: self.notices.as_slice().to_vec(),
            channel_connected: self.channel_connected,
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn files(&self) -> &[CandidateFile] {
        self.files.as_slice()
    }

    pub fn country(&self) -> Country {
        self.country
    }

    pub fn phase(&self) -> &RunPhase {
        &self.phase
    }

    pub fn progress(&self) -> &ProgressSnapshot {
        &self.progress
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.as_slice()
    }

    pub fn advisory_session(&self) -> Option<&str> {
        self.advisory_session.as_deref()
    }

    /// Submit button enablement: files staged and no run in flight.
    pub fn can_submit(&self) -> bool {
        !self.files.as_slice().is_empty() && !self.phase.is_processing()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn stage_files(&mut self, accepted: Vec<CandidateFile>, rejected: usize) {
        let (added, duplicates) = self.files.extend(accepted);
        self.last_intake = Some(IntakeStats {
            added,
            duplicates,
            rejected,
        });
        self.mark_dirty();
    }

    pub(crate) fn remove_file(&mut self, index: usize) -> Option<CandidateFile> {
        let removed = self.files.remove(index);
        self.mark_dirty();
        removed
    }

    pub(crate) fn select_country(&mut self, country: Country) {
        if self.country != country {
            self.country = country;
            self.mark_dirty();
        }
    }

    /// Enters `Uploading` for a fresh run and shows the startup modal.
    /// Any earlier run's progress and download are dropped first.
    pub(crate) fn begin_upload(&mut self) -> RunId {
        self.clear_run_output();
        self.last_run += 1;
        let run = self.last_run;
        self.phase = RunPhase::Uploading { run };
        self.modal_text = Some(MODAL_STARTING.to_string());
        self.mark_dirty();
        run
    }

    /// Binds the upload response's session id to the run. Any advisory id
    /// learned earlier is superseded.
    pub(crate) fn bind_session(&mut self, run: RunId, session_id: String) {
        self.advisory_session = None;
        self.phase = RunPhase::Triggering { run, session_id };
        self.mark_dirty();
    }

    pub(crate) fn set_phase(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.mark_dirty();
    }

    /// Abandons a submission that never reached the server's pipeline.
    pub(crate) fn abort_submission(&mut self) {
        self.phase = RunPhase::Idle;
        self.modal_text = None;
        self.clear_run_output();
        self.mark_dirty();
    }

    fn clear_run_output(&mut self) {
        self.progress = ProgressSnapshot::default();
        self.progress_visible = false;
        self.saved_download = None;
    }

    pub(crate) fn set_advisory_session(&mut self, session_id: String) {
        self.advisory_session = Some(session_id);
    }

    pub(crate) fn modal_visible(&self) -> bool {
        self.modal_text.is_some()
    }

    pub(crate) fn set_modal_text(&mut self, text: &str) {
        self.modal_text = Some(text.to_string());
        self.mark_dirty();
    }

    pub(crate) fn hide_modal(&mut self) {
        if self.modal_text.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn reveal_progress(&mut self) {
        self.progress_visible = true;
        self.mark_dirty();
    }

    pub(crate) fn progress_mut(&mut self) -> &mut ProgressSnapshot {
        self.mark_dirty();
        &mut self.progress
    }

    pub(crate) fn push_notice(&mut self, severity: Severity, message: String) -> NoticeId {
        self.mark_dirty();
        self.notices.push(severity, message)
    }

    pub(crate) fn remove_notice(&mut self, id: NoticeId) {
        if self.notices.remove(id) {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_channel_connected(&mut self, connected: bool) {
        if self.channel_connected != connected {
            self.channel_connected = connected;
            self.mark_dirty();
        }
    }

    pub(crate) fn record_download(&mut self, path: &Path) {
        self.saved_download = Some(path.to_path_buf());
        self.mark_dirty();
    }

    /// Back to a pristine `Idle`. Notices, the chosen country, channel state
    /// and pacing survive; the run counter keeps counting so late results of
    /// the abandoned run stay stale.
    pub(crate) fn reset(&mut self) {
        self.files.clear();
        self.phase = RunPhase::Idle;
        self.advisory_session = None;
        self.progress = ProgressSnapshot::default();
        self.progress_visible = false;
        self.modal_text = None;
        self.last_intake = None;
        self.saved_download = None;
        self.mark_dirty();
    }
}
