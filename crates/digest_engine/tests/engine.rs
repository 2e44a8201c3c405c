use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use pretty_assertions::assert_eq;
use digest_engine::{
    DownloadedFile, EngineConfig, EngineEvent, EngineHandle, FailureKind, ProcessingApi,
    ServerSettings, TransportError, UploadFile,
};

#[derive(Default)]
struct FakeApi {
    uploads: Mutex<Vec<(Vec<String>, String)>>,
}

#[async_trait::async_trait]
impl ProcessingApi for FakeApi {
    async fn upload(&self, files: &[UploadFile], country: &str) -> Result<String, TransportError> {
        self.uploads.lock().unwrap().push((
            files.iter().map(|file| file.name.clone()).collect(),
            country.to_string(),
        ));
        Ok("session-7".to_string())
    }

    async fn trigger(&self, session_id: &str) -> Result<(), TransportError> {
        assert_eq!(session_id, "session-7");
        Ok(())
    }

    async fn download(&self, url: &str) -> Result<DownloadedFile, TransportError> {
        assert_eq!(url, "/download/session-7/digest.zip");
        Ok(DownloadedFile {
            file_name: "digest.zip".to_string(),
            bytes: Bytes::from_static(b"PK\x03\x04"),
        })
    }
}

fn unreachable_config(output_dir: std::path::PathBuf) -> EngineConfig {
    let mut config = EngineConfig::default_with_output(output_dir);
    config.server = ServerSettings {
        base_url: "http://127.0.0.1:1".to_string(),
        connect_timeout: Duration::from_millis(500),
        ..ServerSettings::default()
    };
    config
}

fn next_event(engine: &EngineHandle, matches: impl Fn(&EngineEvent) -> bool) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(event) = engine.recv_timeout(Duration::from_millis(50)) {
            if matches(&event) {
                return event;
            }
        }
    }
    panic!("no matching engine event before the deadline");
}

#[test]
fn requests_report_back_with_their_run() {
    let dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeApi::default());
    let engine = EngineHandle::with_api(unreachable_config(dir.path().to_path_buf()), api.clone());

    engine.upload(
        3,
        vec![UploadFile {
            name: "week1.md".to_string(),
            content: Bytes::from_static(b"# week 1"),
        }],
        "Poland",
    );
    let uploaded = next_event(&engine, |event| matches!(event, EngineEvent::UploadCompleted { .. }));
    assert_eq!(
        uploaded,
        EngineEvent::UploadCompleted {
            run: 3,
            result: Ok("session-7".to_string())
        }
    );
    assert_eq!(
        api.uploads.lock().unwrap().as_slice(),
        &[(vec!["week1.md".to_string()], "Poland".to_string())]
    );

    engine.trigger(3, "session-7");
    let triggered = next_event(&engine, |event| matches!(event, EngineEvent::TriggerCompleted { .. }));
    assert_eq!(triggered, EngineEvent::TriggerCompleted { run: 3, result: Ok(()) });
}

#[test]
fn download_is_saved_into_the_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("downloads");
    let engine = EngineHandle::with_api(unreachable_config(output.clone()), Arc::new(FakeApi::default()));

    engine.download("/download/session-7/digest.zip");
    let event = next_event(&engine, |event| matches!(event, EngineEvent::DownloadCompleted { .. }));
    let path = match event {
        EngineEvent::DownloadCompleted { result: Ok(path) } => path,
        other => panic!("download failed: {other:?}"),
    };
    assert_eq!(path, output.join("digest.zip"));
    assert_eq!(std::fs::read(&path).unwrap(), b"PK\x03\x04");
}

#[test]
fn join_without_a_reachable_channel_reports_closed() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineHandle::with_api(
        unreachable_config(dir.path().to_path_buf()),
        Arc::new(FakeApi::default()),
    );

    engine.join_session("session-7");
    let event = next_event(&engine, |event| matches!(event, EngineEvent::ChannelClosed { .. }));
    assert!(matches!(event, EngineEvent::ChannelClosed { reason } if !reason.is_empty()));
}

#[test]
fn transport_errors_display_their_message() {
    let api_error = TransportError {
        kind: FailureKind::Rejected,
        message: "Upload failed".to_string(),
    };
    assert_eq!(api_error.to_string(), "Upload failed");
}
