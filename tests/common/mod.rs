#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use crosstalk::{
    app,
    gateway::{Gateway, GatewayError, Translation},
    AppState, Config,
};

/// Tags text with its target language. `fail`, `slow` and `panic` trigger the error paths.
pub struct FakeGateway;

#[async_trait]
impl Gateway for FakeGateway {
    async fn translate_text(&self, text: &str, src_lang: &str, tgt_lang: &str) -> Result<Translation, GatewayError> {
        match text {
            "fail" => Err(GatewayError::Rejected { status: 500, body: "model exploded".to_owned() }),
            "panic" => panic!("gateway blew up"),
            "slow" => {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Err(GatewayError::Closed)
            }
            _ => Ok(Translation {
                text: format!("[{src_lang}->{tgt_lang}] {text}"),
                audio: vec![0.0, 0.25, -0.25],
            }),
        }
    }

    async fn translate_audio(&self, audio: &[u8], tgt_lang: &str) -> Result<Translation, GatewayError> {
        Ok(Translation {
            text: format!("[audio->{tgt_lang}] {} bytes", audio.len()),
            audio: audio.iter().map(|&b| b as f32 / 255.0).collect(),
        })
    }
}

pub fn test_config() -> Config {
    Config {
        gateway_timeout: Duration::from_millis(300),
        bind_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

pub fn test_state(config: Config) -> AppState {
    AppState::new(config, Arc::new(FakeGateway))
}

pub async fn serve(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    addr
}

/// Polls `check` until it holds or two seconds pass.
pub async fn eventually(check: impl FnMut() -> bool) -> bool {
    eventually_within(Duration::from_secs(2), check).await
}

pub async fn eventually_within(limit: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
