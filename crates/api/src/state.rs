use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool is reference-counted and the rest is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pool: bazaar_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Handlers publish here after their transaction commits.
    pub event_bus: Arc<bazaar_events::EventBus>,
}
