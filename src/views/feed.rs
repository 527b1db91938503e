use std::collections::HashMap;
use std::sync::Arc;

use crate::api::ImageApi;
use crate::cache::OnDemandCache;
use crate::error::{ClientError, ClientResult};
use crate::models::{Comment, Image, VoteDirection};
use crate::session::Session;

/// Image feed with per-image vote, like and comment state.
///
/// Mutations never patch the local snapshot: a successful vote, like or
/// delete refetches the whole list, and a successful comment post refetches
/// that image's comments. Failed fetches keep the last good snapshot.
pub struct FeedView {
    api: Arc<dyn ImageApi>,
    images: Vec<Image>,
    loaded: bool,
    comments: OnDemandCache<String, Vec<Comment>>,
    drafts: HashMap<String, String>,
    comment_errors: HashMap<String, String>,
}

impl FeedView {
    pub fn new(api: Arc<dyn ImageApi>) -> Self {
        Self {
            api,
            images: Vec::new(),
            loaded: false,
            comments: OnDemandCache::new(),
            drafts: HashMap::new(),
            comment_errors: HashMap::new(),
        }
    }

    pub async fn mount(api: Arc<dyn ImageApi>) -> Self {
        let mut view = Self::new(api);
        view.refresh().await;
        view
    }

    /// Newest snapshot of the image list, in backend order.
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub async fn refresh(&mut self) {
        match self.api.list_images().await {
            Ok(images) => {
                self.images = images;
                self.loaded = true;
            }
            Err(e) => tracing::warn!("Failed to fetch images: {}", e),
        }
    }

    /// Fetches the list unless a fetch already succeeded.
    pub async fn ensure_loaded(&mut self) {
        if !self.loaded {
            self.refresh().await;
        }
    }

    pub async fn vote(&mut self, session: &Session, image_id: &str, direction: VoteDirection) {
        let Some(token) = session.token() else {
            return;
        };
        match self.api.vote(token, image_id, direction).await {
            Ok(()) => self.refresh().await,
            Err(e) => tracing::warn!(image = image_id, "Vote failed: {}", e),
        }
    }

    pub async fn like(&mut self, session: &Session, image_id: &str) {
        let Some(token) = session.token() else {
            return;
        };
        match self.api.like(token, image_id).await {
            Ok(()) => self.refresh().await,
            Err(e) => tracing::warn!(image = image_id, "Like failed: {}", e),
        }
    }

    /// Loads comments for one image unless they are already cached.
    pub async fn load_comments(&mut self, image_id: &str) {
        let api = Arc::clone(&self.api);
        let result = self
            .comments
            .get_or_fetch(image_id.to_string(), || async move {
                api.list_comments(image_id).await
            })
            .await;
        if let Err(e) = result {
            tracing::warn!(image = image_id, "Failed to fetch comments: {}", e);
        }
    }

    pub fn comments(&self, image_id: &str) -> Option<&[Comment]> {
        self.comments
            .get(&image_id.to_string())
            .map(Vec::as_slice)
    }

    pub fn set_draft(&mut self, image_id: &str, content: &str) {
        self.drafts.insert(image_id.to_string(), content.to_string());
    }

    pub fn draft(&self, image_id: &str) -> &str {
        self.drafts.get(image_id).map(String::as_str).unwrap_or("")
    }

    pub fn comment_error(&self, image_id: &str) -> Option<&str> {
        self.comment_errors.get(image_id).map(String::as_str)
    }

    /// Posts a comment. Anonymous sessions are a no-op; blank content is
    /// rejected before any request. On success the draft is cleared and the
    /// image's comments are refetched.
    pub async fn post_comment(
        &mut self,
        session: &Session,
        image_id: &str,
        content: &str,
    ) -> ClientResult<()> {
        let Some(token) = session.token() else {
            return Ok(());
        };
        self.comment_errors.remove(image_id);

        let content = content.trim();
        if content.is_empty() {
            let err = ClientError::Validation("Comment cannot be empty".to_string());
            self.comment_errors
                .insert(image_id.to_string(), err.user_message(""));
            return Err(err);
        }

        match self.api.post_comment(token, image_id, content).await {
            Ok(_) => {
                self.drafts.remove(image_id);
                self.reload_comments(image_id).await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(image = image_id, "Comment failed: {}", e);
                self.set_draft(image_id, content);
                self.comment_errors.insert(
                    image_id.to_string(),
                    e.user_message("Could not post comment"),
                );
                Err(e)
            }
        }
    }

    pub async fn delete_image(&mut self, session: &Session, image_id: &str) {
        let Some(token) = session.token() else {
            return;
        };
        match self.api.delete_image(token, image_id).await {
            Ok(()) => {
                self.comments.invalidate(&image_id.to_string());
                self.refresh().await;
            }
            Err(e) => tracing::warn!(image = image_id, "Delete failed: {}", e),
        }
    }

    pub async fn delete_comment(&mut self, session: &Session, image_id: &str, comment_id: &str) {
        let Some(token) = session.token() else {
            return;
        };
        match self.api.delete_comment(token, comment_id).await {
            Ok(()) => self.reload_comments(image_id).await,
            Err(e) => tracing::warn!(comment = comment_id, "Delete failed: {}", e),
        }
    }

    async fn reload_comments(&mut self, image_id: &str) {
        self.comments.invalidate(&image_id.to_string());
        self.load_comments(image_id).await;
    }
}
