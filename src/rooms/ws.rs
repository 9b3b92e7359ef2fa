use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    debug_handler,
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::{sync::Mutex, task::JoinError};
use tokio_util::sync::CancellationToken;

use crate::{
    error::{RelayError, RelayResult},
    lang,
    rooms::msg::{self, BindFrame, Binding},
    AppState,
};

/// Number of `/chat` connections whose tasks haven't finished yet.
#[derive(Clone, Default)]
pub struct LiveSessions(Arc<AtomicUsize>);

impl LiveSessions {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> LiveGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        LiveGuard(self.0.clone())
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Why a loop stopped.
#[derive(Debug)]
enum Outcome {
    Disconnected,
    /// The token fired. When nothing else stopped the session, a newer
    /// connection bound as the same user.
    Cancelled,
    Protocol(RelayError),
    Transport(axum::Error),
    Crashed(JoinError),
}

impl Outcome {
    fn close_frame(&self) -> Option<CloseFrame> {
        let (code, reason) = match self {
            Outcome::Disconnected => (close_code::NORMAL, String::new()),
            Outcome::Cancelled => (close_code::NORMAL, "replaced by a newer connection".to_owned()),
            Outcome::Protocol(err) => (close_code::POLICY, err.to_string()),
            Outcome::Crashed(_) => (close_code::ERROR, "internal error".to_owned()),
            Outcome::Transport(_) => return None,
        };
        Some(CloseFrame { code, reason: truncate(reason, MAX_CLOSE_REASON).into() })
    }
}

// Close frame payloads are capped at 125 bytes, two of which are the code.
const MAX_CLOSE_REASON: usize = 123;

const CLOSE_GRACE: Duration = Duration::from_secs(1);

fn truncate(mut reason: String, max: usize) -> String {
    if reason.len() > max {
        let mut end = max;
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        reason.truncate(end);
    }
    reason
}

// Shared with the deliver task so the close frame can still go out if that task dies.
type Sink = Arc<Mutex<SplitSink<WebSocket, Message>>>;
type Stream = SplitStream<WebSocket>;

#[debug_handler]
pub(crate) async fn chat_ws(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run(state, socket))
}

async fn run(state: AppState, socket: WebSocket) {
    let _live = state.live.enter();
    let (sink, mut stream) = socket.split();
    let sink: Sink = Arc::new(Mutex::new(sink));
    let token = CancellationToken::new();

    let (binding, session) = match bind(&state, &mut stream, &token).await {
        Ok(bound) => bound,
        Err(err) => {
            tracing::warn!(error = %err, "rejected chat connection");
            close(&sink, Outcome::Protocol(err)).await;
            return;
        }
    };
    tracing::info!(user = %binding.user_id, room = %binding.room_id, lang = %binding.lang, session, "session bound");

    let mut deliver = tokio::spawn(deliver_loop(state.clone(), binding.clone(), sink.clone(), token.clone()));
    let mut receive = tokio::spawn(receive_loop(state.clone(), binding.clone(), stream, token.clone()));

    // Whichever loop stops first decides how the connection closes.
    let outcome = tokio::select! {
        finished = &mut deliver => {
            token.cancel();
            let _ = receive.await;
            finished.unwrap_or_else(Outcome::Crashed)
        }
        finished = &mut receive => {
            token.cancel();
            let outcome = finished.unwrap_or_else(Outcome::Crashed);
            match deliver.await {
                Ok(_) => outcome,
                Err(err) => Outcome::Crashed(err),
            }
        }
    };

    match &outcome {
        Outcome::Transport(err) => tracing::debug!(user = %binding.user_id, error = %err, "socket failed"),
        Outcome::Crashed(err) => tracing::error!(user = %binding.user_id, error = %err, "session task crashed"),
        _ => {}
    }

    match state.bindings.release(binding.user_id, binding.room_id, session, &state.rooms, &state.mailboxes) {
        Ok(release) => tracing::info!(
            user = %binding.user_id,
            room = %binding.room_id,
            release = ?release,
            outcome = ?outcome,
            "session closed"
        ),
        Err(err) => tracing::warn!(
            user = %binding.user_id,
            room = %binding.room_id,
            error = %err,
            "session closed without leaving its room"
        ),
    }

    close(&sink, outcome).await;
}

async fn close(sink: &Sink, outcome: Outcome) {
    let Some(frame) = outcome.close_frame() else {
        return;
    };
    let mut sink = sink.lock().await;
    // A peer that stopped reading gets no close frame.
    let _ = tokio::time::timeout(CLOSE_GRACE, sink.send(Message::Close(Some(frame)))).await;
}

async fn bind(state: &AppState, stream: &mut Stream, token: &CancellationToken) -> RelayResult<(Binding, u64)> {
    let text = tokio::time::timeout(state.config.bind_timeout, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(text),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(_)) => return Err(RelayError::invalid("bind frame must be text")),
                Some(Err(err)) => return Err(RelayError::Transport(err)),
                None => return Err(RelayError::invalid("connection closed before bind")),
            }
        }
    })
    .await
    .map_err(|_| RelayError::invalid("no bind frame before timeout"))??;

    let BindFrame { user_id, room_id, lang } = serde_json::from_str(text.as_str())
        .map_err(|err| RelayError::invalid(format!("bind frame: {err}")))?;
    lang::validate(&lang)?;

    let user = state.users.get(user_id)?;

    // Claim first: an older connection's release then can't undo this join.
    let session = state.bindings.claim(user_id, room_id, token.clone());
    if let Err(err) = state.rooms.join(user_id, room_id) {
        state.bindings.forget(user_id, session);
        return Err(err);
    }

    Ok((Binding { user_id, user_name: user.name, room_id, lang }, session))
}

async fn deliver_loop(state: AppState, binding: Binding, sink: Sink, token: CancellationToken) -> Outcome {
    loop {
        let envelope = tokio::select! {
            biased;
            _ = token.cancelled() => return Outcome::Cancelled,
            envelope = state.mailboxes.dequeue(binding.user_id) => envelope,
        };

        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => return Outcome::Cancelled,
            frame = msg::deliver(&state, &envelope, &binding.lang) => frame,
        };

        let mut writer = sink.lock().await;
        let sent = tokio::select! {
            biased;
            _ = token.cancelled() => return Outcome::Cancelled,
            sent = writer.send(frame) => sent,
        };
        if let Err(err) = sent {
            return Outcome::Transport(err);
        }
    }
}

async fn receive_loop(state: AppState, binding: Binding, mut stream: Stream, token: CancellationToken) -> Outcome {
    loop {
        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => return Outcome::Cancelled,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                if let Err(err) = msg::send_msg(&state, &binding, text.as_str()) {
                    return Outcome::Protocol(err);
                }
            }
            Some(Ok(Message::Binary(_))) => {
                return Outcome::Protocol(RelayError::invalid("binary frames are not supported"));
            }
            Some(Ok(Message::Close(_))) | None => return Outcome::Disconnected,
            Some(Ok(_)) => {}
            Some(Err(err)) => return Outcome::Transport(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_codes_follow_the_outcome() {
        let frame = Outcome::Disconnected.close_frame().unwrap();
        assert_eq!(frame.code, close_code::NORMAL);

        let frame = Outcome::Protocol(RelayError::not_found("room", "x")).close_frame().unwrap();
        assert_eq!(frame.code, close_code::POLICY);
        assert_eq!(frame.reason.as_str(), "room x not found");

        let frame = Outcome::Cancelled.close_frame().unwrap();
        assert_eq!(frame.code, close_code::NORMAL);
        assert!(!frame.reason.as_str().is_empty());

        assert!(Outcome::Transport(axum::Error::new("gone")).close_frame().is_none());
    }

    #[test]
    fn long_reasons_are_cut_on_a_char_boundary() {
        let reason = "é".repeat(100);
        let cut = truncate(reason, MAX_CLOSE_REASON);
        assert!(cut.len() <= MAX_CLOSE_REASON);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn live_guard_counts_down_on_drop() {
        let live = LiveSessions::default();
        let guard = live.enter();
        assert_eq!(live.count(), 1);
        drop(guard);
        assert_eq!(live.count(), 0);
    }
}
