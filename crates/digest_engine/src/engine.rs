use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;

use digest_logging::{digest_info, digest_warn};
use tokio_util::sync::CancellationToken;

use crate::channel::{ChannelEventSink, EventSink, PushChannel};
use crate::{
    AtomicFileWriter, DownloadedFile, EngineEvent, FailureKind, ProcessingApi,
    ReqwestProcessingApi, RunId, ServerSettings, TransportError, UploadFile,
};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub server: ServerSettings,
    /// Where downloaded digests are written.
    pub output_dir: PathBuf,
}

impl EngineConfig {
    pub fn default_with_output(output_dir: PathBuf) -> Self {
        Self {
            server: ServerSettings::default(),
            output_dir,
        }
    }
}

enum EngineCommand {
    Connect,
    Join { session_id: String },
    Request(Request),
    Shutdown,
}

enum Request {
    Upload {
        run: RunId,
        files: Vec<UploadFile>,
        country: String,
    },
    Trigger {
        run: RunId,
        session_id: String,
    },
    Download {
        url: String,
    },
}

/// Front door to the background IO thread. Commands are fire-and-forget;
/// outcomes come back as [`EngineEvent`]s.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, TransportError> {
        let api: Arc<dyn ProcessingApi> = Arc::new(ReqwestProcessingApi::new(config.server.clone())?);
        Ok(Self::with_api(config, api))
    }

    /// Builds an engine around any [`ProcessingApi`]; the push channel still
    /// connects to `config.server`.
    pub fn with_api(config: EngineConfig, api: Arc<dyn ProcessingApi>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let mut worker = Worker {
                config,
                sink,
                channel: None,
                cancel: CancellationToken::new(),
            };
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Connect => {
                        runtime.block_on(worker.ensure_channel());
                    }
                    EngineCommand::Join { session_id } => {
                        runtime.block_on(worker.join(&session_id));
                    }
                    EngineCommand::Request(request) => {
                        let api = api.clone();
                        let sink = worker.sink.clone();
                        let output_dir = worker.config.output_dir.clone();
                        runtime.spawn(async move {
                            handle_request(api.as_ref(), request, sink.as_ref(), &output_dir).await;
                        });
                    }
                    EngineCommand::Shutdown => break,
                }
            }
            worker.cancel.cancel();
            runtime.shutdown_timeout(std::time::Duration::from_secs(1));
        });

        Self { cmd_tx, event_rx }
    }

    pub fn connect(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Connect);
    }

    pub fn join_session(&self, session_id: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Join {
            session_id: session_id.into(),
        });
    }

    pub fn upload(&self, run: RunId, files: Vec<UploadFile>, country: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Request(Request::Upload {
            run,
            files,
            country: country.into(),
        }));
    }

    pub fn trigger(&self, run: RunId, session_id: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Request(Request::Trigger {
            run,
            session_id: session_id.into(),
        }));
    }

    pub fn download(&self, url: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Request(Request::Download { url: url.into() }));
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Shutdown);
    }
}

struct Worker {
    config: EngineConfig,
    sink: Arc<dyn EventSink>,
    channel: Option<PushChannel>,
    cancel: CancellationToken,
}

impl Worker {
    async fn ensure_channel(&mut self) -> Option<&PushChannel> {
        if self.channel.as_ref().is_some_and(|channel| !channel.is_closed()) {
            return self.channel.as_ref();
        }
        let url = match self.config.server.channel_url() {
            Ok(url) => url,
            Err(err) => {
                self.report_unavailable(err);
                return None;
            }
        };
        match PushChannel::connect(
            &url,
            self.config.server.connect_timeout,
            self.sink.clone(),
            self.cancel.child_token(),
        )
        .await
        {
            Ok(channel) => {
                self.channel = Some(channel);
                self.channel.as_ref()
            }
            Err(err) => {
                self.report_unavailable(err);
                None
            }
        }
    }

    /// Joins the session room, reconnecting first if the channel dropped.
    async fn join(&mut self, session_id: &str) {
        let Some(channel) = self.ensure_channel().await else {
            return;
        };
        match channel.join(session_id) {
            Ok(()) => digest_info!("join_session {} sent", session_id),
            Err(err) => {
                self.channel = None;
                self.report_unavailable(err);
            }
        }
    }

    fn report_unavailable(&self, err: TransportError) {
        digest_warn!("push channel unavailable: {}", err);
        self.sink.emit(EngineEvent::ChannelClosed {
            reason: err.message,
        });
    }
}

async fn handle_request(
    api: &dyn ProcessingApi,
    request: Request,
    sink: &dyn EventSink,
    output_dir: &Path,
) {
    match request {
        Request::Upload {
            run,
            files,
            country,
        } => {
            let result = api.upload(&files, &country).await;
            sink.emit(EngineEvent::UploadCompleted { run, result });
        }
        Request::Trigger { run, session_id } => {
            let result = api.trigger(&session_id).await;
            sink.emit(EngineEvent::TriggerCompleted { run, result });
        }
        Request::Download { url } => {
            let result = match api.download(&url).await {
                Ok(file) => save_download(output_dir.to_path_buf(), file).await,
                Err(err) => Err(err),
            };
            sink.emit(EngineEvent::DownloadCompleted { result });
        }
    }
}

async fn save_download(output_dir: PathBuf, file: DownloadedFile) -> Result<PathBuf, TransportError> {
    tokio::task::spawn_blocking(move || {
        AtomicFileWriter::new(output_dir)
            .write(&file.file_name, &file.bytes)
            .map_err(|err| TransportError::new(FailureKind::Io, err.to_string()))
    })
    .await
    .map_err(|err| TransportError::new(FailureKind::Io, err.to_string()))?
}
