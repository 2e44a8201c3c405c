use std::sync::Once;

use digest_core::{
    update, AppState, CandidateFile, Completion, Effect, Msg, Pacing, PushEvent, Severity,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(digest_logging::initialize_for_tests);
}

fn uploading() -> AppState {
    let (state, _) = update(
        AppState::with_pacing(Pacing::immediate()),
        Msg::FilesAdded(vec![CandidateFile::new("a.md", b"a".to_vec())]),
    );
    update(state, Msg::ProcessClicked).0
}

fn connected(session_id: &str) -> Msg {
    Msg::Push(PushEvent::Connected {
        session_id: session_id.to_string(),
    })
}

#[test]
fn connected_before_upload_is_advisory_only() {
    init_logging();
    let (state, effects) = update(AppState::new(), connected("old"));
    assert!(effects.is_empty());
    assert_eq!(state.advisory_session(), Some("old"));
    assert_eq!(state.view().session_id, None);
}

#[test]
fn upload_response_is_authoritative() {
    init_logging();
    let (state, _) = update(uploading(), connected("stale"));
    let (state, effects) = update(
        state,
        Msg::UploadFinished {
            run: 1,
            result: Ok("s1".to_string()),
        },
    );

    assert_eq!(state.view().session_id.as_deref(), Some("s1"));
    assert_eq!(state.advisory_session(), None);
    assert!(effects.contains(&Effect::TriggerProcessing {
        run: 1,
        session_id: "s1".to_string()
    }));
    assert!(state.notices().is_empty());
}

#[test]
fn matching_announcement_after_binding_is_quiet() {
    init_logging();
    let (state, _) = update(
        uploading(),
        Msg::UploadFinished {
            run: 1,
            result: Ok("s1".to_string()),
        },
    );
    let (state, effects) = update(state, connected("s1"));
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::Push(PushEvent::SessionJoined {
            session_id: "s1".to_string(),
        }),
    );
    assert!(effects.is_empty());
    assert!(state.notices().is_empty());
}

#[test]
fn mismatched_announcement_is_an_integrity_error() {
    init_logging();
    let (state, _) = update(
        uploading(),
        Msg::UploadFinished {
            run: 1,
            result: Ok("s1".to_string()),
        },
    );
    let (state, _) = update(state, connected("s2"));

    assert_eq!(state.view().session_id.as_deref(), Some("s1"));
    assert_eq!(state.notices().len(), 1);
    assert_eq!(state.notices()[0].severity, Severity::Danger);
    assert!(state.notices()[0].message.contains("s2"));
    // Tracking continues on the bound session.
    let (state, _) = update(state, Msg::Push(PushEvent::ProgressUpdate { value: 2 }));
    assert_eq!(state.view().percent, 33);
}

#[test]
fn mismatch_after_terminal_state_is_only_logged() {
    init_logging();
    let (state, _) = update(
        uploading(),
        Msg::UploadFinished {
            run: 1,
            result: Ok("s1".to_string()),
        },
    );
    let (state, _) = update(
        state,
        Msg::Push(PushEvent::ProcessingComplete(Completion {
            success: false,
            error: Some("boom".to_string()),
            ..Completion::default()
        })),
    );
    let notices = state.notices().len();
    let (state, effects) = update(state, connected("s9"));
    assert!(effects.is_empty());
    assert_eq!(state.notices().len(), notices);
}
