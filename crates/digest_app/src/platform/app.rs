use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use digest_core::{update, AppState, CandidateFile, Effect, Msg, RunPhase};
use digest_engine::{EngineConfig, EngineHandle};
use digest_logging::{digest_debug, digest_error, digest_info, digest_warn};

use super::cli::Cli;
use super::config::{load_config, ClientConfig};
use super::effects::EffectRunner;
use super::logging;
use super::ui::render::{self, RenderMemory};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub fn run_app() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let loaded = load_config(&cli.config);
    let (destination, level) = match &loaded {
        Ok(config) => (cli.log.unwrap_or(config.log_destination), config.level_filter()),
        Err(_) => (cli.log.unwrap_or_default(), log::LevelFilter::Info),
    };
    logging::initialize(destination, level);

    let mut config = loaded.unwrap_or_else(|err| {
        digest_warn!("{}; using defaults", err);
        ClientConfig::default()
    });
    config.apply_cli(&cli);
    digest_info!(
        "digest_app starting server={} output={:?}",
        config.server_url,
        config.output_dir
    );

    let engine = EngineHandle::new(EngineConfig {
        server: config.server_settings(),
        output_dir: config.output_dir.clone(),
    })
    .context("failed to start the network engine")?;

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let mut session = Session {
        state: AppState::with_pacing(config.pacing()),
        runner: EffectRunner::new(engine, msg_tx.clone()),
        memory: RenderMemory::default(),
        msg_tx: msg_tx.clone(),
        auto_download: config.auto_download,
        submitted: false,
        download_requested: false,
        download_settled: false,
        channel_lost: false,
    };

    println!("{}", render::heading(digest_core::ScrollTarget::Top));
    for msg in [
        Msg::Started,
        Msg::CountrySelected(cli.country),
        Msg::FilesAdded(read_candidates(&cli.files)),
        Msg::ProcessClicked,
    ] {
        let _ = msg_tx.send(msg);
    }

    loop {
        session.runner.pump_engine_events();
        match msg_rx.recv_timeout(POLL_INTERVAL) {
            Ok(msg) => session.dispatch(msg),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                digest_error!("message channel closed unexpectedly");
                return Ok(ExitCode::FAILURE);
            }
        }
        if let Some(code) = session.outcome() {
            digest_info!("digest_app finished in phase {:?}", session.state.phase().label());
            return Ok(code);
        }
    }
}

/// Reads each path from disk. Unreadable paths are reported and skipped;
/// the extension check happens in the core.
fn read_candidates(paths: &[PathBuf]) -> Vec<CandidateFile> {
    paths
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            match fs::read(path) {
                Ok(bytes) => Some(CandidateFile::new(name, bytes)),
                Err(err) => {
                    digest_warn!("cannot read {:?}: {}", path, err);
                    eprintln!("Skipping {}: {}", path.display(), err);
                    None
                }
            }
        })
        .collect()
}

struct Session {
    state: AppState,
    runner: EffectRunner,
    memory: RenderMemory,
    msg_tx: mpsc::Sender<Msg>,
    auto_download: bool,
    submitted: bool,
    download_requested: bool,
    download_settled: bool,
    channel_lost: bool,
}

impl Session {
    fn dispatch(&mut self, msg: Msg) {
        let submitting = matches!(msg, Msg::ProcessClicked);
        let channel_closed = matches!(msg, Msg::ChannelClosed { .. });
        let download_finished = matches!(msg, Msg::DownloadFinished { .. });

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);

        self.submitted |= submitting;
        self.download_settled |= download_finished;
        if channel_closed
            && matches!(
                state.phase(),
                RunPhase::Triggering { .. } | RunPhase::Tracking { .. }
            )
        {
            self.channel_lost = true;
        }

        for effect in &effects {
            match effect {
                Effect::ScrollTo(target) => println!("{}", render::heading(*target)),
                Effect::ClearFilePicker => digest_debug!("file selection cleared"),
                _ => {}
            }
        }
        self.runner.enqueue(effects);

        if state.consume_dirty() {
            let stamp = chrono::Local::now().format("%H:%M:%S").to_string();
            for line in render::render(&state.view(), &mut self.memory, &stamp) {
                println!("{line}");
            }
        }

        if let RunPhase::Completed {
            download_url: Some(_),
            ..
        } = state.phase()
        {
            if self.auto_download && !self.download_requested {
                self.download_requested = true;
                let _ = self.msg_tx.send(Msg::DownloadClicked);
            }
        }
        self.state = state;
    }

    /// Exit code once nothing more can happen for this invocation.
    fn outcome(&self) -> Option<ExitCode> {
        if self.channel_lost {
            return Some(ExitCode::FAILURE);
        }
        match self.state.phase() {
            RunPhase::Failed { .. } => Some(ExitCode::FAILURE),
            RunPhase::Idle if self.submitted => Some(ExitCode::FAILURE),
            RunPhase::Completed { download_url, .. } => {
                if download_url.is_none() || !self.auto_download {
                    Some(ExitCode::SUCCESS)
                } else if self.download_settled {
                    Some(if self.state.view().saved_download.is_some() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::FAILURE
                    })
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
