//! HTTP client for the accident-analysis webhook.

use reqwest::multipart::{Form, Part};
use thiserror::Error;
use tracing::{debug, info};

use crate::Upload;

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error! Status: {status}")]
    Server { status: u16, body: String },
}

/// Posts spreadsheets to the webhook and returns its raw response text.
pub struct WebhookClient {
    client: reqwest::Client,
    url: String,
}

impl WebhookClient {
    /// `url` is the full webhook endpoint; trailing slashes are dropped.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send `upload` as the `file` field of a multipart form.
    ///
    /// The body is returned verbatim; interpreting it is the caller's job.
    pub async fn send_file(&self, upload: &Upload) -> Result<String, WebhookError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime)?;
        let form = Form::new().part("file", part);

        info!(url = %self.url, file = %upload.file_name, bytes = upload.bytes.len(), "sending file to webhook");
        let resp = self.client.post(&self.url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WebhookError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        info!(bytes = text.len(), "webhook responded");
        debug!(body = %text, "raw webhook response");
        Ok(text)
    }
}
