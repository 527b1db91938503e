//! In-process stand-in for the image API, bound to an ephemeral port.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use giastylez_web::api::HttpApi;
use giastylez_web::config::{ApiConfig, Config};
use giastylez_web::routes;
use giastylez_web::state::AppState;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const MEMBER_TOKEN: &str = "member-token";

#[derive(Default)]
pub struct StubState {
    calls: Mutex<HashMap<String, usize>>,
    banned: Mutex<HashSet<String>>,
    last_upload: Mutex<Option<Value>>,
}

impl StubState {
    fn record(&self, name: &str) {
        *self.calls.lock().unwrap().entry(name.to_string()).or_default() += 1;
    }
}

pub struct Backend {
    pub base_url: String,
    pub state: Arc<StubState>,
}

impl Backend {
    pub fn calls(&self, name: &str) -> usize {
        self.state.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn last_upload(&self) -> Option<Value> {
        self.state.last_upload.lock().unwrap().clone()
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
        }
    }

    pub fn client(&self) -> HttpApi {
        HttpApi::new(&self.api_config()).unwrap()
    }

    /// The web front end wired to this backend.
    pub fn app(&self) -> Router {
        let mut config = Config::default();
        config.api = self.api_config();
        routes::router(AppState {
            api: Arc::new(self.client()),
            config,
        })
    }
}

pub async fn spawn_backend() -> Backend {
    let state = Arc::new(StubState::default());
    let app = Router::new()
        .route("/api/", get(health))
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/me", get(me))
        .route(
            "/api/images",
            get(list_images)
                .post(upload_image)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/api/images/{id}", delete(delete_image))
        .route("/api/images/{id}/vote", post(vote))
        .route("/api/images/{id}/like", post(like))
        .route("/api/images/{id}/comments", get(list_comments).post(post_comment))
        .route("/api/comments/{id}", delete(delete_comment))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/users", get(admin_users))
        .route("/api/admin/users/{id}/ban", post(ban))
        .route("/api/admin/users/{id}/unban", post(unban))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend {
        base_url: format!("http://{addr}/api"),
        state,
    }
}

fn admin_user() -> Value {
    json!({
        "id": "u-admin",
        "email": "admin@example.com",
        "created_at": "2024-01-01T09:00:00",
        "is_admin": true,
        "is_banned": false
    })
}

fn member_user(banned: bool) -> Value {
    json!({
        "id": "u-member",
        "email": "member@example.com",
        "created_at": "2024-02-01T09:00:00.123456",
        "is_admin": false,
        "is_banned": banned
    })
}

fn error(status: StatusCode, detail: Value) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the caller, or the 401 the backend answers with.
fn caller(state: &StubState, headers: &HeaderMap) -> Result<Value, Response> {
    match bearer(headers) {
        Some(ADMIN_TOKEN) => Ok(admin_user()),
        Some(MEMBER_TOKEN) => {
            let banned = state.banned.lock().unwrap().contains("u-member");
            Ok(member_user(banned))
        }
        _ => Err(error(
            StatusCode::UNAUTHORIZED,
            json!("Could not validate credentials"),
        )),
    }
}

async fn health(State(state): State<Arc<StubState>>) -> Json<Value> {
    state.record("health");
    Json(json!({ "status": "ok" }))
}

async fn login(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    state.record("login");
    let (token, user) = match (body["email"].as_str(), body["password"].as_str()) {
        (Some("admin@example.com"), Some("secret1")) => (ADMIN_TOKEN, admin_user()),
        (Some("member@example.com"), Some("hunter22")) => {
            if state.banned.lock().unwrap().contains("u-member") {
                return error(StatusCode::FORBIDDEN, json!("User is banned"));
            }
            (MEMBER_TOKEN, member_user(false))
        }
        _ => {
            return error(
                StatusCode::UNAUTHORIZED,
                json!("Incorrect email or password"),
            )
        }
    };
    Json(json!({ "access_token": token, "token_type": "bearer", "user": user })).into_response()
}

async fn register(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    state.record("register");
    match body["email"].as_str() {
        Some("admin@example.com") | Some("member@example.com") => {
            error(StatusCode::BAD_REQUEST, json!("Email already registered"))
        }
        Some("not-an-email") => error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!([{ "loc": ["body", "email"], "msg": "value is not a valid email address" }]),
        ),
        Some(email) => Json(json!({
            "id": "u-new",
            "email": email,
            "created_at": "2024-03-01T10:00:00Z"
        }))
        .into_response(),
        None => error(StatusCode::UNPROCESSABLE_ENTITY, json!("email is required")),
    }
}

async fn me(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("me");
    match caller(&state, &headers) {
        Ok(user) => Json(user).into_response(),
        Err(response) => response,
    }
}

async fn list_images(State(state): State<Arc<StubState>>) -> Json<Value> {
    state.record("list_images");
    let posted = chrono::Utc::now().naive_utc() - chrono::Duration::hours(2);
    Json(json!([
        {
            "id": "img-1",
            "title": "Sunset braids",
            "image_data": "aGVsbG8=",
            "user_id": "u-member",
            "created_at": posted.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
            "expose_me": true,
            "votes": 4,
            "likes": 2,
            "user_email": "member@example.com"
        },
        {
            "id": "img-2",
            "title": "Silver bob",
            "image_data": "data:image/png;base64,aGVsbG8=",
            "user_id": "u-admin",
            "created_at": "2024-01-02T12:00:00+00:00",
            "votes": 0,
            "likes": 0
        }
    ]))
}

async fn upload_image(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("upload_image");
    let user = match caller(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    if body["title"].as_str().unwrap_or_default().is_empty() {
        return error(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!([{ "loc": ["body", "title"], "msg": "title must not be empty" }]),
        );
    }
    *state.last_upload.lock().unwrap() = Some(body.clone());
    Json(json!({
        "id": "img-new",
        "title": body["title"],
        "image_data": body["image_data"],
        "user_id": user["id"],
        "created_at": "2024-03-01T10:00:00",
        "expose_me": body["expose_me"]
    }))
    .into_response()
}

async fn delete_image(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record("delete_image");
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    if id == "missing" {
        return error(StatusCode::NOT_FOUND, json!("Image not found"));
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn vote(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.record("vote");
    if let Err(response) = caller(&state, &headers) {
        return response;
    }
    match (id.as_str(), body["vote_type"].as_str()) {
        ("missing", _) => error(StatusCode::NOT_FOUND, json!("Image not found")),
        ("broken", _) => error(StatusCode::INTERNAL_SERVER_ERROR, json!("database is locked")),
        (_, Some("up" | "down")) => Json(json!({ "message": "Vote recorded" })).into_response(),
        _ => error(StatusCode::UNPROCESSABLE_ENTITY, json!("vote_type must be up or down")),
    }
}

async fn like(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> Response {
    state.record("like");
    match caller(&state, &headers) {
        Ok(_) => Json(json!({ "message": "Like recorded" })).into_response(),
        Err(response) => response,
    }
}

async fn list_comments(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Json<Value> {
    state.record("list_comments");
    if id == "garbled" {
        return Json(json!({ "comments": "not a list" }));
    }
    if id != "img-1" {
        return Json(json!([]));
    }
    Json(json!([{
        "id": "c-1",
        "image_id": "img-1",
        "user_id": "u-admin",
        "content": "Love the colours",
        "created_at": "2024-01-03T08:30:00",
        "user_email": "admin@example.com"
    }]))
}

async fn post_comment(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.record("post_comment");
    let user = match caller(&state, &headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    Json(json!({
        "id": "c-new",
        "image_id": id,
        "user_id": user["id"],
        "content": body["content"],
        "created_at": "2024-03-01T10:00:00"
    }))
    .into_response()
}

async fn delete_comment(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(_id): Path<String>,
) -> Response {
    state.record("delete_comment");
    match caller(&state, &headers) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(response) => response,
    }
}

/// Admin routes answer 403 for signed-in members.
fn require_admin(state: &StubState, headers: &HeaderMap) -> Result<(), Response> {
    let user = caller(state, headers)?;
    if user["is_admin"].as_bool() == Some(true) {
        Ok(())
    } else {
        Err(error(StatusCode::FORBIDDEN, json!("Admin access required")))
    }
}

async fn admin_stats(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("admin_stats");
    match require_admin(&state, &headers) {
        Ok(()) => Json(json!({
            "users": 2,
            "images": 2,
            "comments": 1,
            "votes": 4,
            "likes": 2
        }))
        .into_response(),
        Err(response) => response,
    }
}

async fn admin_users(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.record("admin_users");
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    let banned = state.banned.lock().unwrap().contains("u-member");
    Json(json!([admin_user(), member_user(banned)])).into_response()
}

async fn ban(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record("ban_user");
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    state.banned.lock().unwrap().insert(id);
    Json(json!({ "message": "User banned" })).into_response()
}

async fn unban(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.record("unban_user");
    if let Err(response) = require_admin(&state, &headers) {
        return response;
    }
    state.banned.lock().unwrap().remove(&id);
    Json(json!({ "message": "User unbanned" })).into_response()
}
