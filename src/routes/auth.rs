use askama::Template;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::extractors::CurrentSession;
use crate::routes::home::{Html, Nav};
use crate::session::{CookieTokenStore, SessionProvider};
use crate::state::AppState;
use crate::views::{LoginForm, RegisterForm};

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct LoginQuery {
    registered: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", post(logout))
}

fn token_store(state: &AppState, headers: &HeaderMap) -> CookieTokenStore {
    CookieTokenStore::from_headers(headers, &state.config.session)
}

/// Redirect that also carries the session cookie write, if any.
fn redirect_with(store: &CookieTokenStore, to: &str) -> Response {
    let mut response = Redirect::to(to).into_response();
    store.apply(response.headers_mut());
    response
}

async fn login_page(
    CurrentSession(session): CurrentSession,
    Query(query): Query<LoginQuery>,
) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    Html(LoginTemplate {
        nav: Nav::from(&session),
        email: String::new(),
        error: None,
        notice: query
            .registered
            .map(|_| "Account created. Please log in.".to_string()),
    })
    .into_response()
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    CurrentSession(session): CurrentSession,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut sessions = SessionProvider::new(state.api.clone(), token_store(&state, &headers));
    let result = form.submit(&mut sessions).await;
    match result {
        Ok(_) => redirect_with(sessions.store(), "/"),
        Err(message) => Html(LoginTemplate {
            nav: Nav::from(&session),
            email: form.email,
            error: Some(message),
            notice: None,
        })
        .into_response(),
    }
}

async fn register_page(CurrentSession(session): CurrentSession) -> Response {
    if session.is_authenticated() {
        return Redirect::to("/").into_response();
    }
    Html(RegisterTemplate {
        nav: Nav::from(&session),
        email: String::new(),
        error: None,
    })
    .into_response()
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    CurrentSession(session): CurrentSession,
    Form(form): Form<RegisterForm>,
) -> Response {
    let mut sessions = SessionProvider::new(state.api.clone(), token_store(&state, &headers));
    let result = form.submit(&mut sessions).await;
    match result {
        Ok(_) => Redirect::to("/login?registered=1").into_response(),
        Err(message) => Html(RegisterTemplate {
            nav: Nav::from(&session),
            email: form.email,
            error: Some(message),
        })
        .into_response(),
    }
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut sessions = SessionProvider::new(state.api.clone(), token_store(&state, &headers));
    sessions.logout();
    redirect_with(sessions.store(), "/")
}
