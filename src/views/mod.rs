pub mod admin;
pub mod auth;
pub mod feed;
pub mod upload;

pub use admin::{AdminView, Moderation};
pub use auth::{LoginForm, RegisterForm};
pub use feed::FeedView;
pub use upload::{SelectedFile, UploadForm};
