use std::collections::BTreeMap;

use axum::{debug_handler, extract::{Query, State}, Json};
use serde::Deserialize;

use crate::{ids::RoomId, rooms::{Room, RoomInfo}, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub(crate) struct RoomInfoQuery {
    room_id: String,
}

#[debug_handler]
pub(crate) async fn rooms(State(state): State<AppState>) -> Json<BTreeMap<RoomId, Room>> {
    Json(state.rooms.list())
}

#[debug_handler]
pub(crate) async fn room_info(
    State(state): State<AppState>,
    Query(RoomInfoQuery { room_id }): Query<RoomInfoQuery>,
) -> AppResult<Json<RoomInfo>> {
    let room_id = RoomId::parse(&room_id)?;

    Ok(Json(state.rooms.info(room_id, &state.users)?))
}
