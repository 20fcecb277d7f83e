use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn},
    notify::{LogNotifier, Notifier},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        Self::with_notifier(pool, config, Arc::new(LogNotifier))
    }

    pub fn with_notifier(pool: DbPool, config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        let orm = create_orm_conn(&pool);
        Self {
            pool,
            orm,
            config: Arc::new(config),
            notifier,
        }
    }
}
