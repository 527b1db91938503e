use std::sync::Arc;

use crate::api::ImageApi;
use crate::models::{AdminStats, User};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moderation {
    Ban,
    Unban,
}

/// Aggregate stats plus the user table. Both are fetched independently and
/// either may be missing if its fetch failed.
pub struct AdminView {
    api: Arc<dyn ImageApi>,
    stats: Option<AdminStats>,
    users: Vec<User>,
}

impl AdminView {
    pub fn new(api: Arc<dyn ImageApi>) -> Self {
        Self {
            api,
            stats: None,
            users: Vec::new(),
        }
    }

    pub async fn mount(api: Arc<dyn ImageApi>, session: &Session) -> Self {
        let mut view = Self::new(api);
        view.refresh(session).await;
        view
    }

    pub fn stats(&self) -> Option<&AdminStats> {
        self.stats.as_ref()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub async fn refresh(&mut self, session: &Session) {
        let Some(token) = session.token() else {
            return;
        };
        let (stats, users) = tokio::join!(self.api.admin_stats(token), self.api.admin_users(token));
        match stats {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => tracing::warn!("Failed to fetch admin stats: {}", e),
        }
        match users {
            Ok(users) => self.users = users,
            Err(e) => tracing::warn!("Failed to fetch users: {}", e),
        }
    }

    pub async fn refresh_stats(&mut self, session: &Session) {
        let Some(token) = session.token() else {
            return;
        };
        match self.api.admin_stats(token).await {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => tracing::warn!("Failed to fetch admin stats: {}", e),
        }
    }

    pub async fn refresh_users(&mut self, session: &Session) {
        let Some(token) = session.token() else {
            return;
        };
        match self.api.admin_users(token).await {
            Ok(users) => self.users = users,
            Err(e) => tracing::warn!("Failed to fetch users: {}", e),
        }
    }

    pub async fn ban_user(&mut self, session: &Session, user_id: &str) {
        self.moderate(session, user_id, Moderation::Ban).await;
    }

    pub async fn unban_user(&mut self, session: &Session, user_id: &str) {
        self.moderate(session, user_id, Moderation::Unban).await;
    }

    /// Posts the action, then refetches the user list whether or not the
    /// action succeeded.
    pub async fn moderate(&mut self, session: &Session, user_id: &str, action: Moderation) {
        let Some(token) = session.token() else {
            return;
        };
        let result = match action {
            Moderation::Ban => self.api.ban_user(token, user_id).await,
            Moderation::Unban => self.api.unban_user(token, user_id).await,
        };
        match result {
            Ok(()) => tracing::info!(user = user_id, ?action, "Moderation applied"),
            Err(e) => tracing::warn!(user = user_id, ?action, "Moderation failed: {}", e),
        }
        self.refresh_users(session).await;
    }
}
