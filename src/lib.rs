pub mod appresult;
pub mod config;
pub mod content;
pub mod error;
pub mod gateway;
pub mod ids;
pub mod lang;
pub mod mailbox;
pub mod rooms;
pub mod users;

use std::sync::Arc;

use axum::{debug_handler, extract::FromRef, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use appresult::{AppError, AppResult};
pub use config::Config;
pub use error::{RelayError, RelayResult};

use content::Contents;
use gateway::Gateway;
use mailbox::Mailboxes;
use rooms::{Bindings, LiveSessions, Rooms};
use users::Users;

/// Everything lives in memory and starts out empty.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub users: Users,
    pub rooms: Rooms,
    pub mailboxes: Mailboxes,
    pub contents: Contents,
    pub gateway: Arc<dyn Gateway>,
    pub config: Arc<Config>,
    pub bindings: Bindings,
    pub live: LiveSessions,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            users: Users::default(),
            rooms: Rooms::default(),
            mailboxes: Mailboxes::default(),
            contents: Contents::default(),
            gateway,
            config: Arc::new(config),
            bindings: Bindings::default(),
            live: LiveSessions::default(),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origins.as_deref());

    Router::new()
        .route("/health", get(health))
        .route("/languages", get(lang::languages))
        .merge(rooms::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some(list) => {
            let parsed: Vec<_> = list
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            CorsLayer::new().allow_origin(AllowOrigin::list(parsed))
        }
        None => CorsLayer::permissive(),
    }
}

#[debug_handler]
async fn health() -> &'static str {
    "OK"
}
