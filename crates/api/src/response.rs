//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Paginated listings
//! add the total match count so the client can render page controls.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "total": n }` for paginated listings.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub total: i64,
}
