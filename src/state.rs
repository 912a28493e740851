use crate::config::AppConfig;
use crate::users::{
    repo::{InMemoryUserStore, UserStore},
    services::UsersService,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UsersService>,
}

impl AppState {
    /// State backed by a fresh, empty in-memory store.
    pub fn new(config: &AppConfig) -> Self {
        Self::from_parts(config, Arc::new(InMemoryUserStore::new()))
    }

    pub fn from_parts(config: &AppConfig, store: Arc<dyn UserStore>) -> Self {
        let users = Arc::new(UsersService::new(store, config.max_page_size));
        Self { users }
    }
}
