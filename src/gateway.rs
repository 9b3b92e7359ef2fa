use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("translation timed out after {0:?}")]
    Timeout(Duration),

    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation service answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("translation service unavailable")]
    Closed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(alias = "output")]
    pub text: String,
    #[serde(default)]
    pub audio: Vec<f32>,
}

/// The speech/text translation engine.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn translate_text(&self, text: &str, src_lang: &str, tgt_lang: &str) -> Result<Translation, GatewayError>;

    /// The engine works out the source language from the audio itself.
    async fn translate_audio(&self, audio: &[u8], tgt_lang: &str) -> Result<Translation, GatewayError>;
}

pub async fn with_timeout<F>(limit: Duration, call: F) -> Result<Translation, GatewayError>
where
    F: Future<Output = Result<Translation, GatewayError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| GatewayError::Timeout(limit))?
}

pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    permits: Arc<Semaphore>,
}

#[derive(Serialize)]
struct AudioRequest<'a> {
    audio: String,
    tgt_lang: &'a str,
}

impl HttpGateway {
    pub fn new(base_url: &str, concurrency: usize) -> reqwest::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base_url: base_url.trim_end_matches('/').to_owned(),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Translation, GatewayError> {
        let _permit = self.permits.acquire().await.map_err(|_| GatewayError::Closed)?;

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected { status: status.as_u16(), body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn translate_text(&self, text: &str, src_lang: &str, tgt_lang: &str) -> Result<Translation, GatewayError> {
        let request = self
            .client
            .get(format!("{}/translate-text", self.base_url))
            .query(&[("text", text), ("src_lang", src_lang), ("tgt_lang", tgt_lang)]);
        self.send(request).await
    }

    async fn translate_audio(&self, audio: &[u8], tgt_lang: &str) -> Result<Translation, GatewayError> {
        let request = self
            .client
            .post(format!("{}/translate-audio", self.base_url))
            .json(&AudioRequest { audio: STANDARD.encode(audio), tgt_lang });
        self.send(request).await
    }
}
