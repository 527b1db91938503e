use std::sync::Arc;

use crate::api::ImageApi;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn ImageApi>,
    pub config: Config,
}
