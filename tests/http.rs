mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use crosstalk::app;
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use common::{test_config, test_state};

fn router() -> Router {
    app(test_state(test_config()))
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

async fn create_room(router: &Router) -> String {
    let (status, json) = send(router, post("/create-room")).await;
    assert_eq!(status, StatusCode::OK);
    json["roomId"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn create_room_returns_an_id() {
    let router = router();
    let room_id = create_room(&router).await;
    assert!(!room_id.is_empty());
}

#[tokio::test]
async fn join_then_room_info() {
    let router = router();
    let room_id = create_room(&router).await;

    let (status, json) = send(&router, form("/join-room", format!("userName=A&lang=eng&roomId={room_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let user_id = json["userId"].as_str().unwrap().to_owned();

    let (status, info) = send(&router, get(&format!("/room-info?room_id={room_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(info["name"].as_str().is_some_and(|name| !name.is_empty()));
    assert_eq!(info["members"], serde_json::json!({ user_id: { "name": "A", "lang": "eng" } }));
}

#[tokio::test]
async fn join_accepts_snake_case_fields() {
    let router = router();
    let room_id = create_room(&router).await;

    let (status, json) = send(&router, form("/join-room", format!("user_name=TestUser&lang=fra&room_id={room_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["userId"].is_string());
}

#[tokio::test]
async fn rejoining_mints_a_new_user() {
    let router = router();
    let room_id = create_room(&router).await;
    let body = format!("userName=A&lang=eng&roomId={room_id}");

    let (_, first) = send(&router, form("/join-room", body.clone())).await;
    let (_, second) = send(&router, form("/join-room", body)).await;
    assert_ne!(first["userId"], second["userId"]);

    let (_, info) = send(&router, get(&format!("/room-info?room_id={room_id}"))).await;
    assert_eq!(info["members"].as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_rooms_are_404() {
    let router = router();
    let missing = crosstalk::ids::RoomId::new();

    let (status, json) = send(&router, form("/join-room", format!("userName=A&lang=eng&roomId={missing}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());

    let (status, _) = send(&router, get(&format!("/room-info?room_id={missing}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&router, get("/room-info?room_id=not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_join_input_is_400() {
    let router = router();
    let room_id = create_room(&router).await;

    let (status, _) = send(&router, form("/join-room", format!("userName=A&lang=klingon&roomId={room_id}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&router, form("/join-room", format!("userName=%20%20&lang=eng&roomId={room_id}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rooms_lists_names_and_members() {
    let router = router();
    let empty = create_room(&router).await;
    let busy = create_room(&router).await;
    let (_, joined) = send(&router, form("/join-room", format!("userName=B&lang=fra&roomId={busy}"))).await;

    let (status, rooms) = send(&router, get("/rooms")).await;
    assert_eq!(status, StatusCode::OK);
    let rooms = rooms.as_object().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[&empty]["members"], serde_json::json!([]));
    assert_eq!(rooms[&busy]["members"], serde_json::json!([joined["userId"]]));
    assert!(rooms[&busy]["name"].is_string());
}

#[tokio::test]
async fn languages_and_health() {
    let router = router();

    let (status, languages) = send(&router, get("/languages")).await;
    assert_eq!(status, StatusCode::OK);
    let languages = languages.as_array().unwrap();
    assert_eq!(languages.len(), 31);
    assert!(languages.iter().any(|lang| lang["code"] == "eng" && lang["name"] == "english"));

    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
