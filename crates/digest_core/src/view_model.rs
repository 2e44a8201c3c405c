use std::path::PathBuf;

use crate::{Country, IntakeStats, Notice, PhaseLabel, StageIcon, StageStatus};

/// Render-ready snapshot of [`crate::AppState`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: PhaseLabel,
    pub is_processing: bool,
    pub can_submit: bool,
    pub country: Country,
    pub session_id: Option<String>,
    pub files: Vec<FileRowView>,
    pub last_intake: Option<IntakeStats>,
    /// Startup modal text, `None` when hidden.
    pub modal_text: Option<String>,
    /// Progress, step indicators and output log share this visibility.
    pub progress_visible: bool,
    pub percent: u8,
    pub status_text: String,
    pub stages: Vec<StageView>,
    pub output_lines: Vec<String>,
    pub download_visible: bool,
    pub download_url: Option<String>,
    pub saved_download: Option<PathBuf>,
    pub notices: Vec<Notice>,
    pub channel_connected: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRowView {
    pub index: usize,
    pub name: String,
    pub size_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageView {
    pub index: u32,
    pub label: &'static str,
    pub status: StageStatus,
    pub icon: StageIcon,
}

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
