use axum::{debug_handler, extract::State, Form, Json};
use serde::{Deserialize, Serialize};

use crate::{error::RelayError, ids::{RoomId, UserId}, lang, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub(crate) struct JoinRoomQuery {
    #[serde(rename = "userName", alias = "user_name")]
    user_name: String,
    lang: String,
    #[serde(rename = "roomId", alias = "room_id")]
    room_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct JoinRoomResponse {
    user_id: UserId,
}

#[debug_handler]
pub(crate) async fn join_room(
    State(state): State<AppState>,

    Form(JoinRoomQuery { user_name, lang, room_id }): Form<JoinRoomQuery>,
) -> AppResult<Json<JoinRoomResponse>> {
    let room_id = RoomId::parse(&room_id)?;
    let user_name = user_name.trim();
    if user_name.is_empty() {
        return Err(RelayError::invalid("empty user name").into());
    }
    lang::validate(&lang)?;

    // Don't mint a user for a room that's already gone.
    if !state.rooms.contains(room_id) {
        return Err(RelayError::not_found("room", room_id).into());
    }

    let user_id = state.users.create(user_name, lang);
    state.rooms.join(user_id, room_id)?;
    tracing::info!(user = %user_id, room = %room_id, "user joined");

    Ok(Json(JoinRoomResponse { user_id }))
}
