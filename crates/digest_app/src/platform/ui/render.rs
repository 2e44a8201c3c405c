//! Terminal rendering of [`AppViewModel`].
//!
//! The terminal is append-only, so rendering prints what changed since the
//! previous frame. [`RenderMemory`] holds what has already been printed.

use std::collections::HashSet;

use digest_core::{
    AppViewModel, NoticeId, PhaseLabel, ScrollTarget, Severity, StageIcon, StageStatus,
};

const BAR_WIDTH: usize = 30;

#[derive(Debug, Default)]
pub struct RenderMemory {
    phase: Option<PhaseLabel>,
    files: Vec<String>,
    modal: Option<String>,
    progress_line: Option<String>,
    stage_line: Option<String>,
    output_lines: usize,
    notices: HashSet<NoticeId>,
    channel_connected: Option<bool>,
    download_url: Option<String>,
}

/// Lines to print for this frame. `stamp` prefixes notices.
pub fn render(view: &AppViewModel, memory: &mut RenderMemory, stamp: &str) -> Vec<String> {
    let mut lines = Vec::new();

    if memory.channel_connected != Some(view.channel_connected) {
        // Only report a drop once the channel has been up.
        if view.channel_connected || memory.channel_connected.is_some() {
            lines.push(
                if view.channel_connected {
                    "Connected to server"
                } else {
                    "Disconnected from server"
                }
                .to_string(),
            );
        }
        memory.channel_connected = Some(view.channel_connected);
    }

    let names: Vec<&str> = view.files.iter().map(|row| row.name.as_str()).collect();
    if names != memory.files {
        if !view.files.is_empty() {
            lines.push(format!("Selected files ({}):", view.files.len()));
            lines.extend(
                view.files
                    .iter()
                    .map(|row| format!("  {:>2}. {} ({})", row.index + 1, row.name, row.size_label)),
            );
        }
        if let Some(stats) = view.last_intake.filter(|stats| stats.duplicates + stats.rejected > 0) {
            lines.push(format!(
                "  added {}, skipped {} duplicate(s), rejected {} non-markdown file(s)",
                stats.added, stats.duplicates, stats.rejected
            ));
        }
        memory.files = names.into_iter().map(str::to_owned).collect();
    }

    for notice in view.notices.iter().rev() {
        if memory.notices.insert(notice.id) {
            lines.push(format!("[{stamp}] {} {}", severity_tag(notice.severity), notice.message));
        }
    }
    memory
        .notices
        .retain(|id| view.notices.iter().any(|notice| notice.id == *id));

    if view.modal_text != memory.modal {
        if let Some(text) = &view.modal_text {
            lines.push(format!("** {text} **"));
        }
        memory.modal = view.modal_text.clone();
    }

    if memory.phase != Some(view.phase) {
        if let Some(line) = phase_line(view) {
            lines.push(line);
        }
        memory.phase = Some(view.phase);
    }

    if view.progress_visible {
        let progress = progress_line(view.percent, &view.status_text);
        if memory.progress_line.as_ref() != Some(&progress) {
            lines.push(progress.clone());
            memory.progress_line = Some(progress);
        }
        let stages = stage_line(view);
        if memory.stage_line.as_ref() != Some(&stages) {
            lines.push(stages.clone());
            memory.stage_line = Some(stages);
        }
    } else {
        memory.progress_line = None;
        memory.stage_line = None;
    }

    if view.output_lines.len() < memory.output_lines {
        memory.output_lines = 0;
    }
    for line in &view.output_lines[memory.output_lines..] {
        lines.push(format!("  | {line}"));
    }
    memory.output_lines = view.output_lines.len();

    if view.download_visible && view.download_url != memory.download_url {
        match &view.download_url {
            Some(url) => lines.push(format!("Digest ready: {url}")),
            None => lines.push("Digest ready, but the server sent no download link".to_string()),
        }
        memory.download_url = view.download_url.clone();
    }

    lines
}

/// Section heading printed when the view asks to bring a region into focus.
pub fn heading(target: ScrollTarget) -> &'static str {
    match target {
        ScrollTarget::Top => "==== Digest client ====",
        ScrollTarget::Progress => "---- Progress ----",
        ScrollTarget::Download => "---- Download ----",
    }
}

fn phase_line(view: &AppViewModel) -> Option<String> {
    match view.phase {
        PhaseLabel::Idle => None,
        PhaseLabel::Submitting => Some(format!(
            "Submitting {} file(s) for {}",
            view.files.len(),
            view.country
        )),
        PhaseLabel::Tracking => Some(match &view.session_id {
            Some(session) => format!("Tracking session {session}"),
            None => "Tracking".to_string(),
        }),
        PhaseLabel::Completed => Some("Run completed".to_string()),
        PhaseLabel::Failed => Some("Run failed".to_string()),
    }
}

fn progress_line(percent: u8, status: &str) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        percent,
        status
    )
}

fn stage_line(view: &AppViewModel) -> String {
    view.stages
        .iter()
        .map(|stage| {
            let mark = match (stage.status, stage.icon) {
                (_, StageIcon::Check) | (StageStatus::Completed, _) => 'x',
                (StageStatus::Active, _) => '>',
                (StageStatus::Pending, _) => ' ',
            };
            format!("[{mark}] {}", stage.label)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "OK  ",
        Severity::Info => "INFO",
        Severity::Warning => "WARN",
        Severity::Danger => "FAIL",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digest_core::{update, AppState, CandidateFile, Msg, Pacing, PushEvent};

    fn staged_state() -> AppState {
        let state = AppState::with_pacing(Pacing::immediate());
        let (state, _) = update(
            state,
            Msg::FilesAdded(vec![CandidateFile::new("monday.md", &b"# Monday"[..])]),
        );
        state
    }

    #[test]
    fn unchanged_view_prints_nothing_the_second_time() {
        let view = staged_state().view();
        let mut memory = RenderMemory::default();

        let first = render(&view, &mut memory, "12:00:00");
        assert!(first.iter().any(|line| line.contains("monday.md")));
        assert!(render(&view, &mut memory, "12:00:01").is_empty());
    }

    #[test]
    fn notices_are_printed_once_with_their_stamp() {
        let (state, _) = update(AppState::new(), Msg::ProcessClicked);
        let view = state.view();
        let mut memory = RenderMemory::default();

        let lines = render(&view, &mut memory, "09:15:00");
        assert_eq!(
            lines,
            vec!["[09:15:00] WARN Please select at least one file to process.".to_string()]
        );
        assert!(render(&view, &mut memory, "09:15:01").is_empty());
    }

    #[test]
    fn output_lines_are_appended_incrementally() {
        let mut state = staged_state();
        let mut effects_seen = Vec::new();
        for msg in [
            Msg::ProcessClicked,
            Msg::UploadFinished {
                run: 1,
                result: Ok("s-1".to_string()),
            },
        ] {
            let (next, effects) = update(state, msg);
            state = next;
            effects_seen.extend(effects);
        }
        for effect in effects_seen {
            if let digest_core::Effect::Schedule { timer, .. } = effect {
                state = update(state, Msg::TimerFired(timer)).0;
            }
        }
        let (state, _) = update(
            state,
            Msg::Push(PushEvent::TerminalOutput {
                text: "reading monday.md".to_string(),
            }),
        );
        let mut memory = RenderMemory::default();
        let first = render(&state.view(), &mut memory, "t");
        assert!(first.contains(&"  | reading monday.md".to_string()));

        let (state, _) = update(
            state,
            Msg::Push(PushEvent::TerminalOutput {
                text: "merging".to_string(),
            }),
        );
        let second = render(&state.view(), &mut memory, "t");
        assert!(second.contains(&"  | merging".to_string()));
        assert!(!second.contains(&"  | reading monday.md".to_string()));
    }

    #[test]
    fn swapped_file_is_reprinted_even_when_the_count_is_unchanged() {
        let mut memory = RenderMemory::default();
        render(&staged_state().view(), &mut memory, "t");

        let (state, _) = update(staged_state(), Msg::FileRemoved(0));
        let (state, _) = update(
            state,
            Msg::FilesAdded(vec![CandidateFile::new("tuesday.md", &b"# Tuesday"[..])]),
        );
        let lines = render(&state.view(), &mut memory, "t");
        assert!(lines.iter().any(|line| line.contains("tuesday.md")));
        assert!(!lines.iter().any(|line| line.contains("monday.md")));
    }

    #[test]
    fn progress_bar_fills_with_percent() {
        assert_eq!(
            progress_line(50, "Halfway"),
            format!("[{}{}]  50%  Halfway", "#".repeat(15), ".".repeat(15))
        );
        assert!(progress_line(100, "").starts_with(&format!("[{}]", "#".repeat(30))));
    }
}
