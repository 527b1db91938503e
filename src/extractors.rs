use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::error::AppError;
use crate::guard::{GuardOutcome, Requirement, RouteGuard};
use crate::routes::home::{Html, LoadingTemplate};
use crate::session::{CookieTokenStore, Session, SessionProvider};
use crate::state::AppState;

/// Resolves the visitor's session once per request and stores it in the
/// request extensions. A token the API rejects is cleared on the response.
pub async fn resolve_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let store = CookieTokenStore::from_headers(request.headers(), &state.config.session);
    let mut sessions = SessionProvider::new(state.api.clone(), store);
    sessions.init().await;
    let (session, store) = sessions.into_parts();

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;
    store.apply(response.headers_mut());
    response
}

/// The resolved session, signed in or not.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        session_from(parts).map(CurrentSession)
    }
}

/// Session of a signed-in user. Anonymous visitors are redirected to login.
#[derive(Debug, Clone)]
pub struct SignedIn(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for SignedIn {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guarded(parts, Requirement::SignedIn).map(SignedIn)
    }
}

/// Session of an admin. Other users are sent back to the feed.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        guarded(parts, Requirement::Admin).map(AdminSession)
    }
}

fn session_from(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("Session layer not installed".into()))
}

fn guarded(parts: &Parts, requirement: Requirement) -> Result<Session, Response> {
    let session = session_from(parts).map_err(IntoResponse::into_response)?;
    match RouteGuard::new(requirement).decide(&session) {
        GuardOutcome::Render(_) => Ok(session),
        GuardOutcome::Redirect(path) => Err(Redirect::to(path).into_response()),
        GuardOutcome::Loading => Err(Html(LoadingTemplate::new(&session)).into_response()),
    }
}
