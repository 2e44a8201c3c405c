//! JSON shapes exchanged with the server.
//!
//! Push-channel frames are WebSocket text messages of the form
//! `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

/// Body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    pub session_id: Option<String>,
    pub error: Option<String>,
}

/// Body of `POST /process/{session_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Connected {
        session_id: String,
    },
    JoinedSession {
        session_id: String,
    },
    StatusUpdate {
        message: String,
    },
    ProgressUpdate {
        value: i64,
    },
    TerminalOutput {
        text: String,
    },
    ProcessingComplete {
        success: bool,
        country: Option<String>,
        download_url: Option<String>,
        error: Option<String>,
    },
}

const SERVER_EVENTS: &[&str] = &[
    "connected",
    "joined_session",
    "status_update",
    "progress_update",
    "terminal_output",
    "processing_complete",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinSession { session_id: String },
}

#[derive(Deserialize)]
struct FrameHeader {
    event: String,
}

/// Decodes one text frame. Events this client does not know are `Ok(None)`.
pub fn decode_server_frame(text: &str) -> Result<Option<ServerEvent>, serde_json::Error> {
    let header: FrameHeader = serde_json::from_str(text)?;
    if !SERVER_EVENTS.contains(&header.event.as_str()) {
        return Ok(None);
    }
    serde_json::from_str(text).map(Some)
}

pub fn encode_client_frame(event: &ClientEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
