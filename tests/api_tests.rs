use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pokendex::database::{self, init_schema};
use pokendex::web::create_router;
use rusqlite::Connection;
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> (Router, Arc<Mutex<Connection>>) {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();
    let db = Arc::new(Mutex::new(conn));
    (create_router(db.clone()), db)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn set_body(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Set {}", id),
        "series": "Base",
        "release_date": "1999/01/09"
    })
}

fn card_body(id: &str, set_id: &str) -> Value {
    json!({
        "id": id,
        "name": "Alakazam",
        "number": "1",
        "rarity": "Rare Holo",
        "type": "Pokémon",
        "subtype": "Stage 2",
        "hp": 80,
        "set_id": set_id
    })
}

#[tokio::test]
async fn root_returns_welcome_message() {
    let (app, _) = test_app();

    let (status, body) = send(&app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the PokéndeX Pro API");
}

#[tokio::test]
async fn create_and_fetch_set() {
    let (app, _) = test_app();

    let (status, created) = send(&app, Method::POST, "/sets", Some(set_body("base1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], "base1");
    assert_eq!(created["total_cards"], Value::Null);

    let (status, fetched) = send(&app, Method::GET, "/sets/base1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Set base1");
    assert_eq!(fetched["series"], "Base");
}

#[tokio::test]
async fn duplicate_set_is_conflict() {
    let (app, _) = test_app();
    send(&app, Method::POST, "/sets", Some(set_body("base1"))).await;

    let (status, body) = send(&app, Method::POST, "/sets", Some(set_body("base1"))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Set with id 'base1' already exists");
}

#[tokio::test]
async fn unknown_set_is_not_found() {
    let (app, _) = test_app();

    let (status, body) = send(&app, Method::GET, "/sets/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Set with id 'nope' not found");
}

#[tokio::test]
async fn list_sets_paginates() {
    let (app, _) = test_app();
    for id in ["a", "b", "c"] {
        send(&app, Method::POST, "/sets", Some(set_body(id))).await;
    }

    let (status, body) = send(&app, Method::GET, "/sets?skip=1&limit=1", None).await;

    assert_eq!(status, StatusCode::OK);
    let sets = body.as_array().unwrap();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0]["id"], "b");

    let (_, all) = send(&app, Method::GET, "/sets", None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn card_for_missing_set_is_not_found() {
    let (app, db) = test_app();

    let (status, body) = send(&app, Method::POST, "/cards", Some(card_body("x-1", "x"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Set with id 'x' not found. Cannot create card.");
    assert_eq!(database::get_card_count(&db.lock().unwrap()).unwrap(), 0);
}

#[tokio::test]
async fn create_and_fetch_card() {
    let (app, _) = test_app();
    send(&app, Method::POST, "/sets", Some(set_body("base1"))).await;

    let (status, created) =
        send(&app, Method::POST, "/cards", Some(card_body("base1-1", "base1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], "Pokémon");

    let (status, fetched) = send(&app, Method::GET, "/cards/base1-1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["hp"], 80);
    assert_eq!(fetched["set_id"], "base1");

    let (status, _) =
        send(&app, Method::POST, "/cards", Some(card_body("base1-1", "base1"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_card_is_not_found() {
    let (app, _) = test_app();

    let (status, body) = send(&app, Method::GET, "/cards/nope", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Card with id 'nope' not found");
}

#[tokio::test]
async fn list_cards_filters_by_set() {
    let (app, _) = test_app();
    for set_id in ["a", "b"] {
        send(&app, Method::POST, "/sets", Some(set_body(set_id))).await;
    }
    send(&app, Method::POST, "/cards", Some(card_body("a-1", "a"))).await;
    send(&app, Method::POST, "/cards", Some(card_body("a-2", "a"))).await;
    send(&app, Method::POST, "/cards", Some(card_body("b-1", "b"))).await;

    let (_, filtered) = send(&app, Method::GET, "/cards?set_id=a", None).await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 2);
    assert!(filtered.iter().all(|c| c["set_id"] == "a"));

    let (_, all) = send(&app, Method::GET, "/cards", None).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let (_, limited) = send(&app, Method::GET, "/cards?limit=1", None).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cors_allows_frontend_origin() {
    let (app, _) = test_app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/sets")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn cors_ignores_unknown_origin() {
    let (app, _) = test_app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/sets")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}
