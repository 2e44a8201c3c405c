use std::time::Duration;

use bytes::Bytes;
use digest_logging::{digest_debug, digest_info};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    download_file_name, DownloadedFile, FailureKind, TransportError, TriggerResponse, UploadFile,
    UploadResponse,
};

const MARKDOWN_MIME: &str = "text/markdown";
const UPLOAD_FALLBACK: &str = "Upload failed";
const TRIGGER_FALLBACK: &str = "Processing failed to start";

#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Root of the digest server, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// WebSocket path of the push channel, relative to `base_url`.
    pub channel_path: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            channel_path: "/ws".to_string(),
        }
    }
}

impl ServerSettings {
    fn base(&self) -> Result<Url, TransportError> {
        let mut base = Url::parse(&self.base_url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    /// Resolves `reference` (relative or absolute) against the base url.
    pub fn resolve(&self, reference: &str) -> Result<Url, TransportError> {
        self.base()?
            .join(reference)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|()| TransportError::new(FailureKind::InvalidUrl, "base url cannot have paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// WebSocket url of the push channel.
    pub fn channel_url(&self) -> Result<Url, TransportError> {
        let mut url = self.resolve(self.channel_path.trim_start_matches('/'))?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme)
            .map_err(|()| TransportError::new(FailureKind::InvalidUrl, "cannot derive websocket url"))?;
        Ok(url)
    }
}

/// The two-phase submission protocol plus result download.
#[async_trait::async_trait]
pub trait ProcessingApi: Send + Sync {
    /// Uploads every file under the shared `files` field. Returns the session id.
    async fn upload(&self, files: &[UploadFile], country: &str) -> Result<String, TransportError>;

    async fn trigger(&self, session_id: &str) -> Result<(), TransportError>;

    async fn download(&self, url: &str) -> Result<DownloadedFile, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestProcessingApi {
    settings: ServerSettings,
    client: reqwest::Client,
}

impl ReqwestProcessingApi {
    pub fn new(settings: ServerSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TransportError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }
}

#[async_trait::async_trait]
impl ProcessingApi for ReqwestProcessingApi {
    async fn upload(&self, files: &[UploadFile], country: &str) -> Result<String, TransportError> {
        let url = self.settings.endpoint(&["upload"])?;
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.content.to_vec())
                .file_name(file.name.clone())
                .mime_str(MARKDOWN_MIME)
                .map_err(map_reqwest_error)?;
            form = form.part("files", part);
        }
        form = form.text("country", country.to_string());

        digest_info!("POST {} with {} file(s) for {}", url, files.len(), country);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: UploadResponse = read_envelope(response).await?;

        if !body.success {
            let message = body.error.unwrap_or_else(|| UPLOAD_FALLBACK.to_string());
            return Err(TransportError::new(FailureKind::Rejected, message));
        }
        body.session_id
            .filter(|session_id| !session_id.is_empty())
            .ok_or_else(|| {
                TransportError::new(
                    FailureKind::MissingSession,
                    "upload response did not include a session id",
                )
            })
    }

    async fn trigger(&self, session_id: &str) -> Result<(), TransportError> {
        let url = self.settings.endpoint(&["process", session_id])?;
        digest_info!("POST {}", url);
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: TriggerResponse = read_envelope(response).await?;

        if body.success {
            digest_debug!("trigger accepted: {:?}", body.message);
            Ok(())
        } else {
            let message = body.error.unwrap_or_else(|| TRIGGER_FALLBACK.to_string());
            Err(TransportError::new(FailureKind::Rejected, message))
        }
    }

    async fn download(&self, url: &str) -> Result<DownloadedFile, TransportError> {
        let url = self.settings.resolve(url)?;
        digest_info!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::new(
                FailureKind::HttpStatus(status.as_u16()),
                format!("http status {}", status.as_u16()),
            ));
        }
        let bytes: Bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(DownloadedFile {
            file_name: download_file_name(&url),
            bytes,
        })
    }
}

/// Decodes a JSON envelope. Error statuses still carry an envelope with the
/// server's message; only when the body is not an envelope does the status win.
async fn read_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    match serde_json::from_slice::<T>(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => Err(TransportError::new(
            FailureKind::HttpStatus(status.as_u16()),
            format!("http status {}", status.as_u16()),
        )),
        Err(err) => Err(TransportError::new(
            FailureKind::MalformedResponse,
            format!("unexpected response from server: {err}"),
        )),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return TransportError::new(FailureKind::InvalidUrl, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}
