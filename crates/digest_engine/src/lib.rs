//! Digest engine: HTTP calls, the push channel and effect execution.
mod api;
mod channel;
mod engine;
mod filename;
mod persist;
mod types;
mod wire;

pub use api::{ProcessingApi, ReqwestProcessingApi, ServerSettings};
pub use channel::{ChannelEventSink, EventSink, PushChannel};
pub use engine::{EngineConfig, EngineHandle};
pub use filename::download_file_name;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{DownloadedFile, EngineEvent, FailureKind, RunId, TransportError, UploadFile};
pub use wire::{
    decode_server_frame, encode_client_frame, ClientEvent, ServerEvent, TriggerResponse,
    UploadResponse,
};
