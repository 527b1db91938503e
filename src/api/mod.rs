//! Calls against the external image API.
//!
//! Authenticated calls take the bearer token as an argument; there is no
//! shared default authorization header.

mod http;

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::models::{
    AdminStats, Comment, Credentials, Image, LoginResponse, NewImage, User, VoteDirection,
};

pub use http::HttpApi;

#[async_trait]
pub trait ImageApi: Send + Sync {
    /// `GET /` on the API root.
    async fn health(&self) -> ClientResult<()>;

    async fn login(&self, credentials: &Credentials) -> ClientResult<LoginResponse>;
    async fn register(&self, credentials: &Credentials) -> ClientResult<User>;
    async fn me(&self, token: &str) -> ClientResult<User>;

    async fn list_images(&self) -> ClientResult<Vec<Image>>;
    async fn upload_image(&self, token: &str, image: &NewImage) -> ClientResult<Image>;
    async fn delete_image(&self, token: &str, image_id: &str) -> ClientResult<()>;
    async fn vote(&self, token: &str, image_id: &str, direction: VoteDirection) -> ClientResult<()>;
    async fn like(&self, token: &str, image_id: &str) -> ClientResult<()>;

    async fn list_comments(&self, image_id: &str) -> ClientResult<Vec<Comment>>;
    async fn post_comment(&self, token: &str, image_id: &str, content: &str) -> ClientResult<Comment>;
    async fn delete_comment(&self, token: &str, comment_id: &str) -> ClientResult<()>;

    async fn admin_stats(&self, token: &str) -> ClientResult<AdminStats>;
    async fn admin_users(&self, token: &str) -> ClientResult<Vec<User>>;
    async fn ban_user(&self, token: &str, user_id: &str) -> ClientResult<()>;
    async fn unban_user(&self, token: &str, user_id: &str) -> ClientResult<()>;
}
