//! Event type names published by the storefront.

pub const ORDER_PLACED: &str = "order.placed";
pub const ORDER_STATUS_CHANGED: &str = "order.status_changed";
pub const RETURN_REQUESTED: &str = "return.requested";
pub const RETURN_DECIDED: &str = "return.decided";
pub const PRODUCT_SUBMITTED: &str = "product.submitted";
pub const PRODUCT_REVIEWED: &str = "product.reviewed";

/// Every event type, in publication order of a typical order's life.
pub const ALL: &[&str] = &[
    PRODUCT_SUBMITTED,
    PRODUCT_REVIEWED,
    ORDER_PLACED,
    ORDER_STATUS_CHANGED,
    RETURN_REQUESTED,
    RETURN_DECIDED,
];

/// Source entity kinds attached to events.
pub const ENTITY_ORDER: &str = "order";
pub const ENTITY_PRODUCT: &str = "product";
pub const ENTITY_RETURN: &str = "return_request";
