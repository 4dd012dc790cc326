use std::sync::Arc;

use crate::{
    config::Config, repositories::Storage, services::email::LoginMailer, utils::jwt::TokenCodec,
};

/// Shared per-process state. Everything here is either immutable or
/// internally synchronized, so requests never coordinate through it.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub mailer: Arc<dyn LoginMailer>,
    pub tokens: Arc<TokenCodec>,
    pub config: Config,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, mailer: Arc<dyn LoginMailer>, config: Config) -> Self {
        let tokens = Arc::new(TokenCodec::new(&config.jwt_secret));
        Self {
            storage,
            mailer,
            tokens,
            config,
        }
    }
}
