use std::sync::mpsc;
use std::thread;

use digest_core::{CandidateFile, Completion, Effect, Msg, PushEvent};
use digest_engine::{EngineEvent, EngineHandle, ServerEvent, UploadFile};
use digest_logging::{digest_debug, digest_info, digest_warn};

/// Turns core effects into engine commands and engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    msg_tx: mpsc::Sender<Msg>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, msg_tx: mpsc::Sender<Msg>) -> Self {
        Self { engine, msg_tx }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenChannel => self.engine.connect(),
                Effect::Upload {
                    run,
                    country,
                    files,
                } => {
                    digest_info!("Upload run={} files={} country={}", run, files.len(), country);
                    self.engine
                        .upload(run, files.into_iter().map(to_upload).collect(), country.as_str());
                }
                Effect::JoinSession { session_id } => self.engine.join_session(session_id),
                Effect::TriggerProcessing { run, session_id } => {
                    self.engine.trigger(run, session_id);
                }
                Effect::Schedule { after, timer } => {
                    let msg_tx = self.msg_tx.clone();
                    thread::spawn(move || {
                        thread::sleep(after);
                        let _ = msg_tx.send(Msg::TimerFired(timer));
                    });
                }
                Effect::Download { url } => {
                    digest_info!("Download {}", url);
                    self.engine.download(url);
                }
                // Presentation-only; the renderer handles these.
                Effect::ScrollTo(_) | Effect::ClearFilePicker => {}
            }
        }
    }

    /// Forwards everything the engine has produced so far. Returns how many
    /// messages were sent.
    pub fn pump_engine_events(&self) -> usize {
        let mut forwarded = 0;
        while let Some(event) = self.engine.try_recv() {
            if self.msg_tx.send(map_engine_event(event)).is_ok() {
                forwarded += 1;
            }
        }
        forwarded
    }
}

fn to_upload(file: CandidateFile) -> UploadFile {
    UploadFile {
        name: file.name,
        content: file.content,
    }
}

pub(crate) fn map_engine_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::ChannelOpened => Msg::ChannelOpened,
        EngineEvent::ChannelClosed { reason } => Msg::ChannelClosed { reason },
        EngineEvent::Push(event) => Msg::Push(map_push(event)),
        EngineEvent::UploadCompleted { run, result } => Msg::UploadFinished {
            run,
            result: result.map_err(|err| {
                digest_warn!("Upload run={} failed ({}): {}", run, err.kind, err.message);
                err.message
            }),
        },
        EngineEvent::TriggerCompleted { run, result } => Msg::TriggerFinished {
            run,
            result: result.map_err(|err| {
                digest_warn!("Trigger run={} failed ({}): {}", run, err.kind, err.message);
                err.message
            }),
        },
        EngineEvent::DownloadCompleted { result } => Msg::DownloadFinished {
            result: result.map_err(|err| {
                digest_warn!("Download failed ({}): {}", err.kind, err.message);
                err.message
            }),
        },
    }
}

fn map_push(event: ServerEvent) -> PushEvent {
    match event {
        ServerEvent::Connected { session_id } => PushEvent::Connected { session_id },
        ServerEvent::JoinedSession { session_id } => PushEvent::SessionJoined { session_id },
        ServerEvent::StatusUpdate { message } => PushEvent::StatusUpdate { message },
        ServerEvent::ProgressUpdate { value } => {
            let clamped = value.clamp(0, i64::from(u32::MAX)) as u32;
            if i64::from(clamped) != value {
                digest_debug!("progress value {} clamped to {}", value, clamped);
            }
            PushEvent::ProgressUpdate { value: clamped }
        }
        ServerEvent::TerminalOutput { text } => PushEvent::TerminalOutput { text },
        ServerEvent::ProcessingComplete {
            success,
            country,
            download_url,
            error,
        } => PushEvent::ProcessingComplete(Completion {
            success,
            country,
            download_url,
            error,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn negative_progress_maps_to_zero() {
        let msg = map_engine_event(EngineEvent::Push(ServerEvent::ProgressUpdate { value: -3 }));
        assert_eq!(msg, Msg::Push(PushEvent::ProgressUpdate { value: 0 }));
    }

    #[test]
    fn oversized_progress_saturates() {
        let msg = map_engine_event(EngineEvent::Push(ServerEvent::ProgressUpdate {
            value: i64::MAX,
        }));
        assert_eq!(msg, Msg::Push(PushEvent::ProgressUpdate { value: u32::MAX }));
    }

    #[test]
    fn joined_session_becomes_session_joined() {
        let msg = map_engine_event(EngineEvent::Push(ServerEvent::JoinedSession {
            session_id: "abc".to_string(),
        }));
        assert_eq!(
            msg,
            Msg::Push(PushEvent::SessionJoined {
                session_id: "abc".to_string()
            })
        );
    }

    #[test]
    fn download_success_keeps_the_saved_path() {
        let msg = map_engine_event(EngineEvent::DownloadCompleted {
            result: Ok(PathBuf::from("downloads/digest.zip")),
        });
        assert_eq!(
            msg,
            Msg::DownloadFinished {
                result: Ok(PathBuf::from("downloads/digest.zip"))
            }
        );
    }
}
