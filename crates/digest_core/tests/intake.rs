use std::sync::Once;

use digest_core::{update, AppState, CandidateFile, Effect, IntakeStats, Msg, Severity};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(digest_logging::initialize_for_tests);
}

fn file(name: &str, content: &str) -> CandidateFile {
    CandidateFile::new(name, content.as_bytes().to_vec())
}

fn names(state: &AppState) -> Vec<String> {
    state.files().iter().map(|f| f.name.clone()).collect()
}

#[test]
fn accepts_markdown_case_insensitively_and_clears_picker() {
    init_logging();
    let files = vec![file("a.md", "x"), file("B.MD", "y"), file("notes.txt", "z")];

    let (mut state, effects) = update(AppState::new(), Msg::FilesAdded(files));

    assert_eq!(names(&state), vec!["a.md", "B.MD"]);
    assert_eq!(effects, vec![Effect::ClearFilePicker]);
    assert_eq!(
        state.view().last_intake,
        Some(IntakeStats {
            added: 2,
            duplicates: 0,
            rejected: 1
        })
    );
    assert!(state.view().can_submit);
    assert!(state.consume_dirty());
}

#[test]
fn no_eligible_files_warns_without_mutation() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::FilesAdded(vec![file("keep.md", "")]));
    let before = state.files().to_vec();

    let (state, effects) = update(
        state,
        Msg::FilesAdded(vec![file("image.png", ""), file("doc.markdown", "")]),
    );

    assert_eq!(state.files(), before.as_slice());
    assert_eq!(state.notices().len(), 1);
    assert_eq!(state.notices()[0].severity, Severity::Warning);
    assert_eq!(
        state.notices()[0].message,
        "Please select only Markdown (.md) files."
    );
    assert!(matches!(effects.as_slice(), [Effect::Schedule { .. }]));
}

#[test]
fn duplicate_names_are_dropped_across_calls() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::FilesAdded(vec![file("a.md", "first"), file("a.md", "second")]),
    );
    let (state, _) = update(
        state,
        Msg::FilesAdded(vec![file("b.md", ""), file("a.md", "third")]),
    );

    assert_eq!(names(&state), vec!["a.md", "b.md"]);
    // Name identity, not content: the first copy wins.
    assert_eq!(&state.files()[0].content[..], b"first");
    let stats = state.view().last_intake.unwrap();
    assert_eq!(stats.added, 1);
    assert_eq!(stats.duplicates, 1);
}

#[test]
fn set_size_matches_distinct_accepted_names() {
    init_logging();
    let batches: Vec<Vec<&str>> = vec![
        vec!["a.md", "b.txt", "c.MD"],
        vec!["c.MD", "d.md", "a.md"],
        vec!["e.md", "e.md", "f.pdf"],
    ];
    let mut state = AppState::new();
    let mut distinct = std::collections::BTreeSet::new();
    for batch in batches {
        for name in &batch {
            if name.to_ascii_lowercase().ends_with(".md") {
                distinct.insert(name.to_string());
            }
        }
        let files = batch.into_iter().map(|n| file(n, "")).collect();
        state = update(state, Msg::FilesAdded(files)).0;
    }

    let staged = names(&state);
    let unique: std::collections::BTreeSet<_> = staged.iter().cloned().collect();
    assert_eq!(unique.len(), staged.len());
    assert_eq!(staged.len(), distinct.len());
}

#[test]
fn remove_file_by_position_recomputes_enablement() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::FilesAdded(vec![file("a.md", ""), file("b.md", "")]),
    );
    let (state, _) = update(state, Msg::FileRemoved(0));
    assert_eq!(names(&state), vec!["b.md"]);
    assert!(state.view().can_submit);

    let (state, _) = update(state, Msg::FileRemoved(0));
    assert!(state.files().is_empty());
    assert!(!state.view().can_submit);

    let (state, effects) = update(state, Msg::FileRemoved(3));
    assert!(state.files().is_empty());
    assert!(effects.is_empty());
}

#[test]
fn file_rows_show_human_sizes() {
    init_logging();
    let big = CandidateFile::new("big.md", vec![b'x'; 1536]);
    let (state, _) = update(AppState::new(), Msg::FilesAdded(vec![big, file("empty.md", "")]));

    let rows = state.view().files;
    assert_eq!(rows[0].size_label, "1.5 KB");
    assert_eq!(rows[1].size_label, "0 Bytes");
    assert_eq!(rows[1].index, 1);
}
