//! Step and percentage bookkeeping for the external processing pipeline.

/// Number of pipeline stages. Progress values run from 0 to this inclusive.
pub const TOTAL_STAGES: u32 = 6;

/// Labels of the stage indicators, indexed by progress value.
pub const STAGE_LABELS: [&str; TOTAL_STAGES as usize + 1] = [
    "Starting",
    "Extracting news",
    "Chaining related stories",
    "Merging stories",
    "Generating summaries",
    "Creating monthly digest",
    "Converting to Word document",
];

const PRISTINE_ICONS: [StageIcon; TOTAL_STAGES as usize + 1] = [
    StageIcon::Spinner,
    StageIcon::Document,
    StageIcon::Link,
    StageIcon::Compress,
    StageIcon::Brain,
    StageIcon::Layers,
    StageIcon::WordDocument,
];

pub(crate) const READY_STATUS: &str = "Ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageIcon {
    Spinner,
    Document,
    Link,
    Compress,
    Brain,
    Layers,
    WordDocument,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageIndicator {
    pub index: u32,
    pub status: StageStatus,
    pub icon: StageIcon,
}

impl StageIndicator {
    fn pristine(index: u32) -> Self {
        Self {
            index,
            status: StageStatus::Pending,
            icon: PRISTINE_ICONS[index as usize],
        }
    }

    pub fn is_pristine(&self) -> bool {
        *self == Self::pristine(self.index)
    }
}

/// `round(value / TOTAL_STAGES * 100)`, with `value` clamped to the stage range.
pub fn percent_for(value: u32) -> u8 {
    let value = value.min(TOTAL_STAGES);
    // value * 100 is always even, so there is never a .5 tie to break.
    ((value * 100 + TOTAL_STAGES / 2) / TOTAL_STAGES) as u8
}

fn classify(index: u32, value: u32) -> StageStatus {
    if index < value {
        StageStatus::Completed
    } else if index == value {
        StageStatus::Active
    } else {
        StageStatus::Pending
    }
}

/// Current step, status line and raw output log of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    value: u32,
    status_line: String,
    output: Vec<String>,
    stages: Vec<StageIndicator>,
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        Self {
            value: 0,
            status_line: READY_STATUS.to_string(),
            output: Vec::new(),
            stages: (0..=TOTAL_STAGES).map(StageIndicator::pristine).collect(),
        }
    }
}

impl ProgressSnapshot {
    /// Applies a progress value. Applying the same value twice is a no-op the
    /// second time.
    pub fn apply_value(&mut self, value: u32) {
        let value = value.min(TOTAL_STAGES);
        self.value = value;
        for stage in &mut self.stages {
            stage.status = classify(stage.index, value);
            if stage.status == StageStatus::Completed {
                // The check icon sticks until the next reset.
                stage.icon = StageIcon::Check;
            }
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_line = message.into();
    }

    pub fn append_output(&mut self, text: &str) {
        self.output.push(text.trim().to_string());
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn percent(&self) -> u8 {
        percent_for(self.value)
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn stages(&self) -> &[StageIndicator] {
        &self.stages
    }
}
