use std::sync::Once;

use digest_core::{
    percent_for, update, AppState, CandidateFile, Completion, Country, Effect, Msg, Pacing,
    PhaseLabel, PushEvent, ScrollTarget, Severity, StageIcon, StageStatus, Timer,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(digest_logging::initialize_for_tests);
}

fn push(state: AppState, event: PushEvent) -> (AppState, Vec<Effect>) {
    update(state, Msg::Push(event))
}

/// Drives a fresh state to `Tracking` bound to session `s1`.
fn tracking(country: Country) -> AppState {
    let files = vec![
        CandidateFile::new("a.md", b"# a".to_vec()),
        CandidateFile::new("b.md", b"# b".to_vec()),
    ];
    let state = AppState::with_pacing(Pacing::immediate());
    let (state, _) = update(state, Msg::FilesAdded(files));
    let (state, _) = update(state, Msg::CountrySelected(country));
    let (state, _) = update(state, Msg::ProcessClicked);
    let (state, _) = update(
        state,
        Msg::UploadFinished {
            run: 1,
            result: Ok("s1".to_string()),
        },
    );
    let (state, _) = update(state, Msg::TimerFired(Timer::ModalStarted { run: 1 }));
    let (state, _) = update(state, Msg::TimerFired(Timer::RevealProgress { run: 1 }));
    let (state, _) = update(
        state,
        Msg::TriggerFinished {
            run: 1,
            result: Ok(()),
        },
    );
    assert_eq!(state.view().phase, PhaseLabel::Tracking);
    state
}

fn statuses(state: &AppState) -> Vec<StageStatus> {
    state.view().stages.iter().map(|s| s.status).collect()
}

#[test]
fn percent_rounds_to_nearest() {
    let percents: Vec<u8> = (0..=6).map(percent_for).collect();
    assert_eq!(percents, vec![0, 17, 33, 50, 67, 83, 100]);
    assert_eq!(percent_for(9), 100);
}

#[test]
fn status_update_replaces_line_verbatim() {
    init_logging();
    let state = tracking(Country::Sweden);
    let (state, _) = push(
        state,
        PushEvent::StatusUpdate {
            message: "  Merging stories...".to_string(),
        },
    );
    assert_eq!(state.view().status_text, "  Merging stories...");
}

#[test]
fn progress_update_classifies_stages() {
    init_logging();
    let (state, _) = push(tracking(Country::Sweden), PushEvent::ProgressUpdate { value: 3 });
    let view = state.view();

    assert_eq!(view.percent, 50);
    use StageStatus::*;
    assert_eq!(
        statuses(&state),
        vec![Completed, Completed, Completed, Active, Pending, Pending, Pending]
    );
    assert_eq!(view.stages[1].icon, StageIcon::Check);
    assert_eq!(view.stages[3].icon, StageIcon::Compress);
    assert_eq!(view.stages[6].icon, StageIcon::WordDocument);
}

#[test]
fn progress_update_is_idempotent() {
    init_logging();
    let (once, _) = push(tracking(Country::Sweden), PushEvent::ProgressUpdate { value: 4 });
    let (twice, _) = push(once.clone(), PushEvent::ProgressUpdate { value: 4 });

    assert_eq!(once.view().percent, twice.view().percent);
    assert_eq!(once.view().stages, twice.view().stages);
}

#[test]
fn percent_is_monotonic_for_monotonic_input() {
    init_logging();
    let mut state = tracking(Country::Sweden);
    let mut last = 0;
    for value in [0, 1, 1, 2, 4, 4, 5, 6] {
        state = push(state, PushEvent::ProgressUpdate { value }).0;
        let percent = state.view().percent;
        assert!(percent >= last, "{percent} < {last} at value {value}");
        last = percent;
    }
}

#[test]
fn terminal_output_is_trimmed_and_append_only() {
    init_logging();
    let mut state = tracking(Country::Sweden);
    for text in ["first\n", "  second  ", "third"] {
        state = push(
            state,
            PushEvent::TerminalOutput {
                text: text.to_string(),
            },
        )
        .0;
    }
    assert_eq!(state.view().output_lines, vec!["first", "second", "third"]);
}

#[test]
fn end_to_end_success_scenario() {
    init_logging();
    let state = tracking(Country::Finland);
    let (state, _) = push(state, PushEvent::ProgressUpdate { value: 3 });
    assert_eq!(state.view().percent, 50);

    let (state, effects) = push(
        state,
        PushEvent::ProcessingComplete(Completion {
            success: true,
            country: Some("Finland".to_string()),
            download_url: Some("/dl/s1".to_string()),
            error: None,
        }),
    );

    let view = state.view();
    assert_eq!(view.phase, PhaseLabel::Completed);
    assert_eq!(view.percent, 100);
    assert!(view.download_visible);
    assert_eq!(view.download_url.as_deref(), Some("/dl/s1"));
    assert!(!view.is_processing);
    assert_eq!(view.status_text, "Processing completed successfully!");
    assert_eq!(view.notices[0].severity, Severity::Success);
    assert!(view.notices[0].message.contains("Finland"));
    assert_eq!(effects[0], Effect::ScrollTo(ScrollTarget::Download));
}

#[test]
fn success_shows_download_regardless_of_history() {
    init_logging();
    let (state, _) = push(
        tracking(Country::Poland),
        PushEvent::ProcessingComplete(Completion {
            success: true,
            country: None,
            download_url: Some("/download/s1/digest.zip".to_string()),
            error: None,
        }),
    );
    let view = state.view();
    assert!(view.download_visible);
    assert_eq!(view.download_url.as_deref(), Some("/download/s1/digest.zip"));
    assert!(!view.is_processing);
    // Falls back to the selected country.
    assert!(view.notices[0].message.contains("Poland"));
}

#[test]
fn failure_keeps_progress_and_hides_download() {
    init_logging();
    let (state, _) = push(tracking(Country::Sweden), PushEvent::ProgressUpdate { value: 2 });
    let (state, _) = push(
        state,
        PushEvent::ProcessingComplete(Completion {
            success: false,
            error: Some("No training data files found!".to_string()),
            ..Completion::default()
        }),
    );

    let view = state.view();
    assert_eq!(view.phase, PhaseLabel::Failed);
    assert!(!view.is_processing);
    assert!(!view.download_visible);
    assert_eq!(view.percent, 33);
    assert!(view.progress_visible);
    assert_eq!(view.notices[0].severity, Severity::Danger);
    assert_eq!(
        view.notices[0].message,
        "Processing failed: No training data files found!"
    );
    // Files stay staged, so the user may retry right away.
    assert!(view.can_submit);
}

#[test]
fn events_after_terminal_state_are_ignored() {
    init_logging();
    let (state, _) = push(
        tracking(Country::Sweden),
        PushEvent::ProcessingComplete(Completion {
            success: true,
            download_url: Some("/dl/s1".to_string()),
            ..Completion::default()
        }),
    );
    let before = state.view();

    let (state, effects) = push(state, PushEvent::ProgressUpdate { value: 1 });
    assert!(effects.is_empty());
    let (state, effects) = push(
        state,
        PushEvent::ProcessingComplete(Completion {
            success: false,
            error: Some("late".to_string()),
            ..Completion::default()
        }),
    );
    assert!(effects.is_empty());

    let after = state.view();
    assert_eq!(after.percent, before.percent);
    assert_eq!(after.phase, PhaseLabel::Completed);
    assert_eq!(after.notices.len(), before.notices.len());
}

#[test]
fn events_before_session_join_are_ignored() {
    init_logging();
    let (state, effects) = push(AppState::new(), PushEvent::ProgressUpdate { value: 2 });
    assert!(effects.is_empty());
    assert_eq!(state.view().percent, 0);
    assert!(state
        .view()
        .stages
        .iter()
        .all(|stage| stage.status == StageStatus::Pending));
}
