//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` in the application state.
//! Handlers publish after their database work commits; subscribers (the
//! notification router) turn events into per-user rows.

use bazaar_core::types::{DbId, Money, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;

use crate::kinds;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred in the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, one of [`kinds::ALL`].
    pub event_type: String,

    /// Source entity kind (`"order"`, `"product"`, `"return_request"`).
    pub source_entity_type: Option<String>,

    pub source_entity_id: Option<DbId>,

    /// User that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Event-specific data, including the ids needed to pick recipients.
    pub payload: serde_json::Value,

    pub timestamp: Timestamp,
}

impl PlatformEvent {
    /// Create a bare event. Optional fields default to `None` / empty object.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// A buyer checked out.
    pub fn order_placed(order_id: DbId, order_number: &str, buyer_id: DbId, total: Money) -> Self {
        Self::new(kinds::ORDER_PLACED)
            .with_source(kinds::ENTITY_ORDER, order_id)
            .with_actor(buyer_id)
            .with_payload(json!({
                "order_number": order_number,
                "buyer_id": buyer_id,
                "total": total,
            }))
    }

    pub fn order_status_changed(
        order_id: DbId,
        order_number: &str,
        buyer_id: DbId,
        from: &str,
        to: &str,
        actor_id: DbId,
    ) -> Self {
        Self::new(kinds::ORDER_STATUS_CHANGED)
            .with_source(kinds::ENTITY_ORDER, order_id)
            .with_actor(actor_id)
            .with_payload(json!({
                "order_number": order_number,
                "buyer_id": buyer_id,
                "from": from,
                "to": to,
            }))
    }

    pub fn return_requested(
        return_id: DbId,
        order_number: &str,
        product_name: &str,
        buyer_id: DbId,
        seller_id: DbId,
    ) -> Self {
        Self::new(kinds::RETURN_REQUESTED)
            .with_source(kinds::ENTITY_RETURN, return_id)
            .with_actor(buyer_id)
            .with_payload(json!({
                "order_number": order_number,
                "product_name": product_name,
                "buyer_id": buyer_id,
                "seller_id": seller_id,
            }))
    }

    pub fn return_decided(
        return_id: DbId,
        product_name: &str,
        buyer_id: DbId,
        status: &str,
        actor_id: DbId,
    ) -> Self {
        Self::new(kinds::RETURN_DECIDED)
            .with_source(kinds::ENTITY_RETURN, return_id)
            .with_actor(actor_id)
            .with_payload(json!({
                "product_name": product_name,
                "buyer_id": buyer_id,
                "status": status,
            }))
    }

    pub fn product_submitted(product_id: DbId, product_name: &str, seller_id: DbId) -> Self {
        Self::new(kinds::PRODUCT_SUBMITTED)
            .with_source(kinds::ENTITY_PRODUCT, product_id)
            .with_actor(seller_id)
            .with_payload(json!({
                "product_name": product_name,
                "seller_id": seller_id,
            }))
    }

    pub fn product_reviewed(
        product_id: DbId,
        product_name: &str,
        seller_id: DbId,
        status: &str,
        note: Option<&str>,
        admin_id: DbId,
    ) -> Self {
        Self::new(kinds::PRODUCT_REVIEWED)
            .with_source(kinds::ENTITY_PRODUCT, product_id)
            .with_actor(admin_id)
            .with_payload(json!({
                "product_name": product_name,
                "seller_id": seller_id,
                "status": status,
                "note": note,
            }))
    }

    /// Read an id field from the payload.
    pub fn payload_id(&self, key: &str) -> Option<DbId> {
        self.payload.get(key).and_then(serde_json::Value::as_i64)
    }

    /// Read a string field from the payload, or `""`.
    pub fn payload_str(&self, key: &str) -> &str {
        self.payload
            .get(key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use bazaar_events::bus::{EventBus, PlatformEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::product_submitted(1, "Clay Mug", 2));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unconsumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: PlatformEvent) {
        tracing::debug!(
            event_type = %event.event_type,
            entity_id = ?event.source_entity_id,
            "Publishing event"
        );
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_receives_each_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::order_placed(10, "ORD-20261019-000010", 3, Money::from(598)));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.event_type, kinds::ORDER_PLACED);
        assert_eq!(e2.source_entity_id, Some(10));
        assert_eq!(e1.payload_id("buyer_id"), Some(3));
        assert_eq!(e1.payload_str("order_number"), "ORD-20261019-000010");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(PlatformEvent::new("orphan.event"));
    }

    #[test]
    fn constructors_carry_recipient_ids() {
        let e = PlatformEvent::return_requested(5, "ORD-1", "Rug", 7, 9);
        assert_eq!(e.source_entity_type.as_deref(), Some(kinds::ENTITY_RETURN));
        assert_eq!(e.actor_user_id, Some(7));
        assert_eq!(e.payload_id("seller_id"), Some(9));

        let e = PlatformEvent::product_reviewed(1, "Mug", 4, "rejected", Some("Blurry"), 2);
        assert_eq!(e.payload_id("seller_id"), Some(4));
        assert_eq!(e.payload_str("note"), "Blurry");
        assert_eq!(e.actor_user_id, Some(2));
    }

    #[test]
    fn missing_payload_fields_read_as_empty() {
        let e = PlatformEvent::new("bare.event");
        assert!(e.payload.is_object());
        assert_eq!(e.payload_id("buyer_id"), None);
        assert_eq!(e.payload_str("product_name"), "");
    }

    #[test]
    fn event_types_are_unique() {
        let mut seen = std::collections::HashSet::new();
        assert!(kinds::ALL.iter().all(|k| seen.insert(*k)));
    }
}
