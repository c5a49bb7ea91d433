//! Event-to-notification routing engine.
//!
//! [`NotificationRouter`] consumes [`PlatformEvent`]s, works out who should
//! hear about each one, and writes a `notifications` row per recipient.

use bazaar_core::types::DbId;
use bazaar_db::models::notification::CreateNotification;
use bazaar_db::repositories::{NotificationRepo, OrderRepo, UserRepo};
use bazaar_db::DbPool;
use bazaar_events::{kinds, PlatformEvent};
use tokio::sync::broadcast;

/// Who an event is addressed to, before database lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Users(Vec<DbId>),
    /// Every seller with items on the order.
    OrderSellers(DbId),
    /// The buyer plus every seller on the order.
    BuyerAndOrderSellers { buyer_id: DbId, order_id: DbId },
    /// All active admins.
    Admins,
}

/// A notification ready to be fanned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planned {
    pub audience: Audience,
    pub title: String,
    pub message: String,
}

/// Routes platform events to user notifications.
pub struct NotificationRouter {
    pool: DbPool,
}

impl NotificationRouter {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (the
    /// [`EventBus`](bazaar_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &PlatformEvent) -> Result<(), sqlx::Error> {
        let Some(planned) = plan(event) else {
            tracing::debug!(event_type = %event.event_type, "No notification for event");
            return Ok(());
        };

        let mut recipients = self.resolve(&planned.audience).await?;
        recipients.sort_unstable();
        recipients.dedup();
        recipients.retain(|id| Some(*id) != event.actor_user_id);

        for user_id in &recipients {
            NotificationRepo::create(
                &self.pool,
                &CreateNotification {
                    user_id: *user_id,
                    event_type: event.event_type.clone(),
                    title: planned.title.clone(),
                    message: planned.message.clone(),
                    entity_type: event.source_entity_type.clone(),
                    entity_id: event.source_entity_id,
                },
            )
            .await?;
        }

        tracing::debug!(
            event_type = %event.event_type,
            recipients = recipients.len(),
            "Event routed"
        );
        Ok(())
    }

    async fn resolve(&self, audience: &Audience) -> Result<Vec<DbId>, sqlx::Error> {
        match audience {
            Audience::Users(ids) => Ok(ids.clone()),
            Audience::OrderSellers(order_id) => OrderRepo::seller_ids(&self.pool, *order_id).await,
            Audience::BuyerAndOrderSellers { buyer_id, order_id } => {
                let mut ids = OrderRepo::seller_ids(&self.pool, *order_id).await?;
                ids.push(*buyer_id);
                Ok(ids)
            }
            Audience::Admins => UserRepo::list_active_admin_ids(&self.pool).await,
        }
    }
}

/// Decide the audience and wording for an event.
///
/// Returns `None` for events nobody is notified about, or when the payload
/// lacks the ids needed to address it.
pub fn plan(event: &PlatformEvent) -> Option<Planned> {
    let order_number = event.payload_str("order_number");
    let product_name = event.payload_str("product_name");

    let (audience, title, message) = match event.event_type.as_str() {
        kinds::ORDER_PLACED => (
            Audience::OrderSellers(event.source_entity_id?),
            "New order".to_string(),
            format!("Order {order_number} includes your products."),
        ),
        kinds::ORDER_STATUS_CHANGED => {
            let buyer_id = event.payload_id("buyer_id")?;
            let to = event.payload_str("to");
            let audience = if to == "cancelled" {
                Audience::BuyerAndOrderSellers {
                    buyer_id,
                    order_id: event.source_entity_id?,
                }
            } else {
                Audience::Users(vec![buyer_id])
            };
            (
                audience,
                format!("Order {}", title_case(to)),
                format!("Order {order_number} is now {to}."),
            )
        }
        kinds::RETURN_REQUESTED => (
            Audience::Users(vec![event.payload_id("seller_id")?]),
            "Return requested".to_string(),
            format!("A return was requested for {product_name} on order {order_number}."),
        ),
        kinds::RETURN_DECIDED => {
            let status = event.payload_str("status");
            (
                Audience::Users(vec![event.payload_id("buyer_id")?]),
                format!("Return {}", title_case(status)),
                format!("Your return for {product_name} was {status}."),
            )
        }
        kinds::PRODUCT_SUBMITTED => (
            Audience::Admins,
            "Product awaiting review".to_string(),
            format!("{product_name} was submitted for review."),
        ),
        kinds::PRODUCT_REVIEWED => {
            let status = event.payload_str("status");
            let message = match event.payload_str("note") {
                "" => format!("{product_name} was {status}."),
                note => format!("{product_name} was {status}: {note}"),
            };
            (
                Audience::Users(vec![event.payload_id("seller_id")?]),
                format!("Product {}", title_case(status)),
                message,
            )
        }
        _ => return None,
    };

    Some(Planned {
        audience,
        title,
        message,
    })
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
