pub mod api;
pub mod config;
pub mod db;
pub mod storage;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;

use crate::storage::DocumentStore;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub documents: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            db,
            documents,
        }
    }
}
