pub mod advice;
pub mod health;
pub mod metrics_handler;
pub mod selectors;

use std::sync::Arc;

use crate::config::Config;
use crate::table::TableCache;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tables: Arc<TableCache>,
}
