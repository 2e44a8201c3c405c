use std::path::PathBuf;

use digest_logging::{digest_anomaly, digest_debug, digest_error, digest_info};

use crate::state::MODAL_STARTED;
use crate::{
    AppState, CandidateFile, ClientError, Completion, Effect, Msg, PushEvent, RunId, RunPhase,
    ScrollTarget, Severity, Timer, TOTAL_STAGES,
};

const COMPLETED_STATUS: &str = "Processing completed successfully!";
const UNKNOWN_ERROR: &str = "unknown error";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => vec![Effect::OpenChannel],
        Msg::FilesAdded(files) => add_files(&mut state, files),
        Msg::FileRemoved(index) => {
            if state.remove_file(index).is_none() {
                digest_anomaly!("remove of file index {} ignored: out of range", index);
            }
            Vec::new()
        }
        Msg::CountrySelected(country) => {
            state.select_country(country);
            Vec::new()
        }
        Msg::ProcessClicked => start_processing(&mut state),
        Msg::ModalDismissed => {
            // Background work keeps going; only the overlay goes away.
            state.hide_modal();
            Vec::new()
        }
        Msg::UploadFinished { run, result } => upload_finished(&mut state, run, result),
        Msg::TriggerFinished { run, result } => trigger_finished(&mut state, run, result),
        Msg::ChannelOpened => {
            digest_info!("push channel open");
            state.set_channel_connected(true);
            Vec::new()
        }
        Msg::ChannelClosed { reason } => channel_closed(&mut state, reason),
        Msg::Push(event) => apply_push(&mut state, event),
        Msg::TimerFired(timer) => timer_fired(&mut state, timer),
        Msg::NoticeDismissed(id) => {
            state.remove_notice(id);
            Vec::new()
        }
        Msg::DownloadClicked => download_clicked(&state),
        Msg::DownloadFinished { result } => download_finished(&mut state, result),
        Msg::ResetClicked => {
            digest_info!("resetting client state");
            state.reset();
            vec![Effect::ScrollTo(ScrollTarget::Top)]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Shows a notice and schedules its expiry.
fn notify(state: &mut AppState, severity: Severity, message: String) -> Effect {
    let id = state.push_notice(severity, message);
    Effect::Schedule {
        after: state.pacing().notice_lifetime,
        timer: Timer::ExpireNotice { id },
    }
}

fn report(state: &mut AppState, error: ClientError) -> Effect {
    notify(state, error.severity(), error.to_string())
}

fn add_files(state: &mut AppState, files: Vec<CandidateFile>) -> Vec<Effect> {
    let offered = files.len();
    let accepted: Vec<CandidateFile> = files.into_iter().filter(CandidateFile::is_accepted).collect();
    if accepted.is_empty() {
        return vec![report(state, ClientError::NoEligibleFiles)];
    }
    let rejected = offered - accepted.len();
    state.stage_files(accepted, rejected);
    vec![Effect::ClearFilePicker]
}

fn start_processing(state: &mut AppState) -> Vec<Effect> {
    if state.files().is_empty() {
        return vec![report(state, ClientError::NoFilesSelected)];
    }
    if state.phase().is_processing() {
        digest_anomaly!("process request ignored in phase {:?}", state.phase().label());
        return Vec::new();
    }

    let run = state.begin_upload();
    digest_info!(
        "run {} submitting {} file(s) for {}",
        run,
        state.files().len(),
        state.country()
    );
    vec![Effect::Upload {
        run,
        country: state.country(),
        files: state.files().to_vec(),
    }]
}

/// Transport failure at upload or trigger: back to `Idle` with files intact.
fn fail_submission(state: &mut AppState, error: ClientError) -> Vec<Effect> {
    digest_error!("submission failed: {}", error);
    state.abort_submission();
    vec![report(state, error)]
}

fn upload_finished(state: &mut AppState, run: RunId, result: Result<String, String>) -> Vec<Effect> {
    if *state.phase() != (RunPhase::Uploading { run }) {
        digest_anomaly!("stale upload result for run {} dropped", run);
        return Vec::new();
    }
    let session_id = match result {
        Ok(session_id) => session_id,
        Err(message) => return fail_submission(state, ClientError::Upload(message)),
    };

    if let Some(advisory) = state.advisory_session() {
        if advisory != session_id {
            digest_debug!(
                "advisory session {} superseded by upload session {}",
                advisory,
                session_id
            );
        }
    }
    digest_info!("run {} bound to session {}", run, session_id);
    state.bind_session(run, session_id.clone());

    vec![
        Effect::JoinSession {
            session_id: session_id.clone(),
        },
        Effect::Schedule {
            after: state.pacing().started_delay,
            timer: Timer::ModalStarted { run },
        },
        Effect::TriggerProcessing { run, session_id },
    ]
}

fn trigger_finished(state: &mut AppState, run: RunId, result: Result<(), String>) -> Vec<Effect> {
    if state.phase().run() != Some(run) {
        digest_anomaly!("stale trigger result for run {} dropped", run);
        return Vec::new();
    }
    match (state.phase().clone(), result) {
        (RunPhase::Triggering { run, session_id }, Ok(())) => {
            digest_info!("run {} processing started", run);
            state.set_phase(RunPhase::Tracking { run, session_id });
            Vec::new()
        }
        (RunPhase::Tracking { .. }, Ok(())) => Vec::new(),
        (RunPhase::Triggering { .. } | RunPhase::Tracking { .. }, Err(message)) => {
            fail_submission(state, ClientError::TriggerRejected(message))
        }
        (phase, result) => {
            // Terminal push raced ahead of the trigger response.
            digest_debug!(
                "trigger result {:?} for run {} arrived in phase {:?}",
                result,
                run,
                phase.label()
            );
            Vec::new()
        }
    }
}

fn timer_fired(state: &mut AppState, timer: Timer) -> Vec<Effect> {
    match timer {
        Timer::ModalStarted { run } => {
            if state.phase().run() != Some(run) {
                return Vec::new();
            }
            // A dismissed modal stays dismissed.
            if state.modal_visible() {
                state.set_modal_text(MODAL_STARTED);
            }
            vec![Effect::Schedule {
                after: state.pacing().reveal_delay,
                timer: Timer::RevealProgress { run },
            }]
        }
        Timer::RevealProgress { run } => {
            if state.phase().run() != Some(run) {
                return Vec::new();
            }
            state.hide_modal();
            state.reveal_progress();
            if state.phase().is_terminal() {
                Vec::new()
            } else {
                vec![Effect::ScrollTo(ScrollTarget::Progress)]
            }
        }
        Timer::ExpireNotice { id } => {
            state.remove_notice(id);
            Vec::new()
        }
    }
}

fn channel_closed(state: &mut AppState, reason: String) -> Vec<Effect> {
    state.set_channel_connected(false);
    if state.phase().is_processing() {
        vec![report(state, ClientError::ChannelLost(reason))]
    } else {
        digest_info!("push channel closed: {}", reason);
        Vec::new()
    }
}

/// The push channel's session id is advisory. While a run is bound, a
/// different id is an integrity error; the bound id stays authoritative.
fn check_announced_session(state: &mut AppState, announced: String) -> Vec<Effect> {
    let bound = state.phase().session_id().map(ToOwned::to_owned);
    match bound {
        None => {
            digest_debug!("advisory session {} recorded", announced);
            state.set_advisory_session(announced);
            Vec::new()
        }
        Some(bound) if bound == announced => Vec::new(),
        Some(bound) if state.phase().is_terminal() => {
            digest_anomaly!(
                "session {} announced after run bound to {} ended",
                announced,
                bound
            );
            Vec::new()
        }
        Some(bound) => {
            digest_error!(
                "session integrity error: announced {} while bound to {}",
                announced,
                bound
            );
            vec![report(state, ClientError::SessionMismatch { announced, bound })]
        }
    }
}

fn apply_push(state: &mut AppState, event: PushEvent) -> Vec<Effect> {
    match event {
        PushEvent::Connected { session_id } | PushEvent::SessionJoined { session_id } => {
            return check_announced_session(state, session_id);
        }
        _ if !state.phase().accepts_push() => {
            digest_anomaly!("push event ignored in phase {:?}: {:?}", state.phase().label(), event);
            return Vec::new();
        }
        _ => {}
    }

    match event {
        PushEvent::StatusUpdate { message } => {
            mark_tracking(state);
            state.progress_mut().set_status(message);
            Vec::new()
        }
        PushEvent::ProgressUpdate { value } => {
            if value > TOTAL_STAGES {
                digest_anomaly!("progress value {} clamped to {}", value, TOTAL_STAGES);
            }
            mark_tracking(state);
            state.progress_mut().apply_value(value);
            Vec::new()
        }
        PushEvent::TerminalOutput { text } => {
            mark_tracking(state);
            state.progress_mut().append_output(&text);
            Vec::new()
        }
        PushEvent::ProcessingComplete(completion) => processing_complete(state, completion),
        PushEvent::Connected { .. } | PushEvent::SessionJoined { .. } => Vec::new(),
    }
}

/// A push event proves processing started even if the trigger response is
/// still in flight.
fn mark_tracking(state: &mut AppState) {
    if let RunPhase::Triggering { run, session_id } = state.phase().clone() {
        state.set_phase(RunPhase::Tracking { run, session_id });
    }
}

fn processing_complete(state: &mut AppState, completion: Completion) -> Vec<Effect> {
    let (run, session_id) = match state.phase() {
        RunPhase::Triggering { run, session_id } | RunPhase::Tracking { run, session_id } => {
            (*run, session_id.clone())
        }
        phase => {
            digest_anomaly!("processing_complete ignored in phase {:?}", phase.label());
            return Vec::new();
        }
    };

    if completion.success {
        let country = completion
            .country
            .unwrap_or_else(|| state.country().to_string());
        if completion.download_url.is_none() {
            digest_anomaly!("run {} completed without a download url", run);
        }
        digest_info!("run {} completed for {}", run, country);
        let message = format!("Monthly digest for {country} has been generated successfully!");
        state.set_phase(RunPhase::Completed {
            run,
            session_id,
            download_url: completion.download_url,
            country,
        });
        let progress = state.progress_mut();
        progress.apply_value(TOTAL_STAGES);
        progress.set_status(COMPLETED_STATUS);
        let notice = notify(state, Severity::Success, message);
        vec![Effect::ScrollTo(ScrollTarget::Download), notice]
    } else {
        let error = completion
            .error
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        digest_error!("run {} failed: {}", run, error);
        state.set_phase(RunPhase::Failed {
            run,
            session_id,
            error: error.clone(),
        });
        vec![report(state, ClientError::ProcessingFailed(error))]
    }
}

fn download_clicked(state: &AppState) -> Vec<Effect> {
    match state.phase() {
        RunPhase::Completed {
            download_url: Some(url),
            ..
        } => vec![Effect::Download { url: url.clone() }],
        phase => {
            digest_anomaly!("download requested in phase {:?} without a target", phase.label());
            Vec::new()
        }
    }
}

fn download_finished(state: &mut AppState, result: Result<PathBuf, String>) -> Vec<Effect> {
    match result {
        Ok(path) => {
            digest_info!("digest saved to {:?}", path);
            state.record_download(&path);
            let message = format!("Digest saved to {}", path.display());
            vec![notify(state, Severity::Success, message)]
        }
        Err(message) => vec![report(state, ClientError::DownloadFailed(message))],
    }
}
