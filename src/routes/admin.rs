use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::extractors::AdminSession;
use crate::models::AdminStats;
use crate::routes::home::{format_time, Html, Nav};
use crate::session::Session;
use crate::state::AppState;
use crate::views::{AdminView, Moderation};

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub joined: String,
    pub is_admin: bool,
    pub is_banned: bool,
}

#[derive(Template)]
#[template(path = "pages/admin.html")]
pub struct AdminTemplate {
    pub nav: Nav,
    pub stats: Option<AdminStats>,
    pub users: Vec<UserRow>,
}

impl AdminTemplate {
    fn build(session: &Session, view: &AdminView) -> Self {
        Self {
            nav: Nav::from(session),
            stats: view.stats().copied(),
            users: view
                .users()
                .iter()
                .map(|u| UserRow {
                    id: u.id.clone(),
                    email: u.email.clone(),
                    joined: format_time(&u.created_at),
                    is_admin: u.is_admin,
                    is_banned: u.is_banned,
                })
                .collect(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard))
        .route("/admin/users/{id}/ban", post(ban))
        .route("/admin/users/{id}/unban", post(unban))
}

async fn dashboard(State(state): State<AppState>, AdminSession(session): AdminSession) -> Response {
    let view = AdminView::mount(state.api.clone(), &session).await;
    Html(AdminTemplate::build(&session, &view)).into_response()
}

async fn ban(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(user_id): Path<String>,
) -> Response {
    moderate(state, session, &user_id, Moderation::Ban).await
}

async fn unban(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Path(user_id): Path<String>,
) -> Response {
    moderate(state, session, &user_id, Moderation::Unban).await
}

async fn moderate(state: AppState, session: Session, user_id: &str, action: Moderation) -> Response {
    let mut view = AdminView::new(state.api.clone());
    view.moderate(&session, user_id, action).await;
    view.refresh_stats(&session).await;
    Html(AdminTemplate::build(&session, &view)).into_response()
}
