use axum::{debug_handler, extract::State, Json};
use serde::Serialize;

use crate::{ids::RoomId, rooms::Rooms};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NewRoomResponse {
    room_id: RoomId,
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_room(State(rooms): State<Rooms>) -> Json<NewRoomResponse> {
    let room_id = rooms.create();
    tracing::info!(room = %room_id, "room created");

    Json(NewRoomResponse { room_id })
}
