mod bindings;
mod join;
mod msg;
mod new;
mod registry;
mod room;
mod ws;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use bindings::{Bindings, Release};
pub use registry::{Room, RoomInfo, Rooms};
pub use ws::LiveSessions;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-room", post(new::new_room))
        .route("/join-room", post(join::join_room))
        .route("/rooms", get(room::rooms))
        .route("/room-info", get(room::room_info))
        .route("/chat", get(ws::chat_ws))
}
