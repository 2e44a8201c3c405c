//! Digest client core: pure state machine and view-model helpers.
//!
//! Everything in this crate is synchronous and free of IO. Inputs arrive as
//! [`Msg`] values, [`update`] folds them into [`AppState`], and any IO the
//! client needs (HTTP calls, the push channel, timers) is requested through
//! the returned [`Effect`] list.
mod country;
mod effect;
mod error;
mod intake;
mod msg;
mod notice;
mod progress;
mod state;
mod update;
mod view_model;

pub use country::{Country, UnknownCountry};
pub use effect::{Effect, ScrollTarget, Timer};
pub use error::ClientError;
pub use intake::{has_accepted_extension, CandidateFile, IntakeStats, ACCEPTED_EXTENSION};
pub use msg::{Completion, Msg, PushEvent};
pub use notice::{Notice, NoticeId, Severity};
pub use progress::{
    percent_for, ProgressSnapshot, StageIcon, StageIndicator, StageStatus, STAGE_LABELS,
    TOTAL_STAGES,
};
pub use state::{AppState, Pacing, PhaseLabel, RunId, RunPhase};
pub use update::update;
pub use view_model::{format_file_size, AppViewModel, FileRowView, StageView};
