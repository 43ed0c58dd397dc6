use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::error::{MockviewError, Result};

use super::messages::{ScoringEnvelope, ScoringRequest};

/// Scoring backend trait
///
/// The production implementation uploads to the external scoring endpoint;
/// tests substitute a scripted implementation.
#[async_trait::async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Upload one sample and return the parsed envelope
    async fn score(&self, request: ScoringRequest) -> Result<ScoringEnvelope>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Multipart HTTP client for the scoring endpoint
pub struct HttpScoringClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpScoringClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait::async_trait]
impl ScoringBackend for HttpScoringClient {
    async fn score(&self, request: ScoringRequest) -> Result<ScoringEnvelope> {
        let frame_part = Part::bytes(request.frame_jpeg)
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| MockviewError::Scoring {
                message: e.to_string(),
            })?;

        let mut form = Form::new()
            .text("sessionId", request.session_id.clone())
            .part("frame", frame_part);

        if let Some(wav) = request.audio_wav {
            let audio_part = Part::bytes(wav)
                .file_name("audio.wav")
                .mime_str("audio/wav")
                .map_err(|e| MockviewError::Scoring {
                    message: e.to_string(),
                })?;
            form = form.part("audio", audio_part);
        }

        if !request.transcript_tail.is_empty() {
            form = form.text("transcript", request.transcript_tail);
        }

        debug!("Uploading sample for session {}", request.session_id);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MockviewError::Scoring {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MockviewError::Scoring {
                message: format!("scoring endpoint returned {}", status),
            });
        }

        response
            .json::<ScoringEnvelope>()
            .await
            .map_err(|e| MockviewError::ScoringParse {
                message: e.to_string(),
            })
    }

    fn name(&self) -> &str {
        "http"
    }
}
