use askama::Template;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::config::UploadConfig;
use crate::error::AppResult;
use crate::extractors::SignedIn;
use crate::routes::home::{Html, Nav};
use crate::session::Session;
use crate::state::AppState;
use crate::views::{SelectedFile, UploadForm};

#[derive(Template)]
#[template(path = "pages/upload.html")]
pub struct UploadTemplate {
    pub nav: Nav,
    pub title: String,
    pub expose_me: bool,
    pub error: Option<String>,
    pub success: bool,
    pub redirect_delay_secs: u64,
}

impl UploadTemplate {
    fn blank(session: &Session, config: &UploadConfig) -> Self {
        Self {
            nav: Nav::from(session),
            title: String::new(),
            expose_me: false,
            error: None,
            success: false,
            redirect_delay_secs: config.redirect_delay_secs,
        }
    }
}

/// Upload size is the backend's call, so the body limit is lifted here.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/upload",
        get(upload_page)
            .post(upload)
            .layer(DefaultBodyLimit::disable()),
    )
}

async fn upload_page(State(state): State<AppState>, SignedIn(session): SignedIn) -> Response {
    Html(UploadTemplate::blank(&session, &state.config.upload)).into_response()
}

async fn upload(
    State(state): State<AppState>,
    SignedIn(session): SignedIn,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_form(multipart).await?;
    let result = form.submit(state.api.as_ref(), &session).await;
    let page = match result {
        // The page resets the form and returns to the feed after a short delay.
        Ok(_) => UploadTemplate {
            success: true,
            ..UploadTemplate::blank(&session, &state.config.upload)
        },
        Err(message) => UploadTemplate {
            title: form.title,
            expose_me: form.expose_me,
            error: Some(message),
            ..UploadTemplate::blank(&session, &state.config.upload)
        },
    };
    Ok(Html(page).into_response())
}

async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field.text().await?,
            "expose_me" => form.expose_me = true,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.file = Some(SelectedFile {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(form)
}
