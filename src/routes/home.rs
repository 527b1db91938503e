use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::extractors::CurrentSession;
use crate::models::{Comment, Image, VoteDirection};
use crate::retention;
use crate::session::Session;
use crate::state::AppState;
use crate::views::FeedView;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// Navigation state shared by every page.
pub struct Nav {
    pub email: Option<String>,
    pub is_admin: bool,
}

impl From<&Session> for Nav {
    fn from(session: &Session) -> Self {
        Self {
            email: session.user().map(|u| u.email.clone()),
            is_admin: session.is_admin(),
        }
    }
}

pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}

#[derive(Template)]
#[template(path = "pages/loading.html")]
pub struct LoadingTemplate {
    pub nav: Nav,
}

impl LoadingTemplate {
    pub fn new(session: &Session) -> Self {
        Self {
            nav: Nav::from(session),
        }
    }
}

/// Image ids whose comment panels are expanded, carried in `open=a,b`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenPanels(Vec<String>);

impl OpenPanels {
    pub fn parse(raw: &str) -> Self {
        let mut ids: Vec<String> = Vec::new();
        for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            if !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        Self(ids)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|known| known == id)
    }

    pub fn with(&self, id: &str) -> Self {
        let mut next = self.clone();
        if !next.contains(id) {
            next.0.push(id.to_string());
        }
        next
    }

    pub fn without(&self, id: &str) -> Self {
        Self(self.0.iter().filter(|known| *known != id).cloned().collect())
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn to_param(&self) -> String {
        self.0.join(",")
    }

    /// Feed link that flips one panel and scrolls back to its image.
    pub fn toggle_href(&self, id: &str) -> String {
        let next = if self.contains(id) {
            self.without(id)
        } else {
            self.with(id)
        };
        let encoded: String = url::form_urlencoded::byte_serialize(next.to_param().as_bytes()).collect();
        if next.0.is_empty() {
            format!("/#image-{id}")
        } else {
            format!("/?open={encoded}#image-{id}")
        }
    }
}

pub struct CommentRow {
    pub id: String,
    pub author: String,
    pub content: String,
    pub posted: String,
    pub can_delete: bool,
}

pub struct ImageCard {
    pub id: String,
    pub title: String,
    pub src: String,
    pub uploader: String,
    pub posted: String,
    pub votes: i64,
    pub likes: i64,
    pub featured: bool,
    pub deletion: String,
    pub can_delete: bool,
    pub comments_open: bool,
    pub comments_loaded: bool,
    pub comments: Vec<CommentRow>,
    pub draft: String,
    pub comment_error: Option<String>,
    pub toggle_href: String,
}

#[derive(Template)]
#[template(path = "pages/feed.html")]
pub struct FeedTemplate {
    pub nav: Nav,
    pub signed_in: bool,
    pub open: String,
    pub cards: Vec<ImageCard>,
}

impl FeedTemplate {
    pub fn build(
        session: &Session,
        view: &FeedView,
        open: &OpenPanels,
        retention_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let cards = view
            .images()
            .iter()
            .map(|image| card(session, view, open, image, retention_days, now))
            .collect();
        Self {
            nav: Nav::from(session),
            signed_in: session.is_authenticated(),
            open: open.to_param(),
            cards,
        }
    }
}

fn card(
    session: &Session,
    view: &FeedView,
    open: &OpenPanels,
    image: &Image,
    retention_days: i64,
    now: DateTime<Utc>,
) -> ImageCard {
    let comments = view.comments(&image.id);
    let days = retention::days_until_deletion(image.created_at, now, retention_days);
    ImageCard {
        id: image.id.clone(),
        title: image.title.clone(),
        src: image.data_url(),
        uploader: image
            .user_email
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        posted: format_time(&image.created_at),
        votes: image.votes,
        likes: image.likes,
        featured: image.expose_me,
        deletion: retention::deletion_label(days),
        can_delete: session.can_modify(&image.user_id),
        comments_open: open.contains(&image.id),
        comments_loaded: comments.is_some(),
        comments: comments
            .unwrap_or_default()
            .iter()
            .map(|c| comment_row(session, c))
            .collect(),
        draft: view.draft(&image.id).to_string(),
        comment_error: view.comment_error(&image.id).map(str::to_string),
        toggle_href: open.toggle_href(&image.id),
    }
}

fn comment_row(session: &Session, comment: &Comment) -> CommentRow {
    CommentRow {
        id: comment.id.clone(),
        author: comment
            .user_email
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        content: comment.content.clone(),
        posted: format_time(&comment.created_at),
        can_delete: session.can_modify(&comment.user_id),
    }
}

#[derive(Deserialize, Default)]
pub struct FeedQuery {
    #[serde(default)]
    open: String,
}

#[derive(Deserialize)]
struct VoteForm {
    vote_type: VoteDirection,
    #[serde(default)]
    open: String,
}

#[derive(Deserialize)]
struct OpenForm {
    #[serde(default)]
    open: String,
}

#[derive(Deserialize)]
struct CommentForm {
    #[serde(default)]
    content: String,
    #[serde(default)]
    open: String,
}

#[derive(Deserialize)]
struct DeleteCommentForm {
    image_id: String,
    #[serde(default)]
    open: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/images/{id}/vote", post(vote))
        .route("/images/{id}/like", post(like))
        .route("/images/{id}/comments", post(comment))
        .route("/images/{id}/delete", post(delete_image))
        .route("/comments/{id}/delete", post(delete_comment))
}

/// Loads whatever the page still needs and renders the feed.
async fn render_feed(
    state: &AppState,
    session: &Session,
    mut view: FeedView,
    open: &OpenPanels,
) -> Response {
    view.ensure_loaded().await;
    for id in open.ids() {
        view.load_comments(id).await;
    }
    Html(FeedTemplate::build(
        session,
        &view,
        open,
        state.config.feed.retention_days,
        Utc::now(),
    ))
    .into_response()
}

pub async fn index(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<FeedQuery>,
) -> Response {
    let view = FeedView::mount(state.api.clone()).await;
    render_feed(&state, &session, view, &OpenPanels::parse(&query.open)).await
}

async fn vote(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(image_id): Path<String>,
    Form(form): Form<VoteForm>,
) -> Response {
    let mut view = FeedView::new(state.api.clone());
    view.vote(&session, &image_id, form.vote_type).await;
    render_feed(&state, &session, view, &OpenPanels::parse(&form.open)).await
}

async fn like(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(image_id): Path<String>,
    Form(form): Form<OpenForm>,
) -> Response {
    let mut view = FeedView::new(state.api.clone());
    view.like(&session, &image_id).await;
    render_feed(&state, &session, view, &OpenPanels::parse(&form.open)).await
}

async fn comment(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(image_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    let mut view = FeedView::new(state.api.clone());
    view.set_draft(&image_id, &form.content);
    if let Err(e) = view.post_comment(&session, &image_id, &form.content).await {
        tracing::debug!(image = %image_id, "Comment not posted: {}", e);
    }
    let open = OpenPanels::parse(&form.open).with(&image_id);
    render_feed(&state, &session, view, &open).await
}

async fn delete_image(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(image_id): Path<String>,
    Form(form): Form<OpenForm>,
) -> Response {
    let mut view = FeedView::new(state.api.clone());
    view.delete_image(&session, &image_id).await;
    let open = OpenPanels::parse(&form.open).without(&image_id);
    render_feed(&state, &session, view, &open).await
}

async fn delete_comment(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(comment_id): Path<String>,
    Form(form): Form<DeleteCommentForm>,
) -> Response {
    let mut view = FeedView::new(state.api.clone());
    view.delete_comment(&session, &form.image_id, &comment_id).await;
    let open = OpenPanels::parse(&form.open).with(&form.image_id);
    render_feed(&state, &session, view, &open).await
}
