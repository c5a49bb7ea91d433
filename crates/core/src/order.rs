//! Order lifecycle, payment methods, and shipping address rules.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};
use crate::validation::{validate_dto, Violations};

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::Validation(format!(
                "Unknown order status '{other}'"
            ))),
        }
    }

    /// No further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Check whether `actor` may move an order from `from` to `to`.
///
/// Returns `Conflict` for an edge that does not exist and `Forbidden` when
/// the edge exists but the role may not take it.
pub fn check_transition(from: OrderStatus, to: OrderStatus, actor: Role) -> Result<(), CoreError> {
    use OrderStatus::*;

    let allowed: &[Role] = match (from, to) {
        (Pending, Confirmed) | (Confirmed, Shipped) | (Shipped, Delivered) => {
            &[Role::Seller, Role::Admin]
        }
        (Pending, Cancelled) | (Confirmed, Cancelled) => &[Role::Buyer, Role::Seller, Role::Admin],
        (Shipped, Cancelled) => &[Role::Admin],
        _ => {
            return Err(CoreError::Conflict(format!(
                "Cannot move an order from '{}' to '{}'",
                from.as_str(),
                to.as_str()
            )))
        }
    };

    if allowed.contains(&actor) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "A {actor} cannot move an order from '{}' to '{}'",
            from.as_str(),
            to.as_str()
        )))
    }
}

/// How the buyer pays. Only recorded; no gateway is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Prepaid,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Prepaid => "prepaid",
        }
    }
}

static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 ]{4,10}$").expect("valid regex"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("valid regex"));

/// Delivery address captured at checkout and snapshotted onto the order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShippingAddress {
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub name: String,
    pub phone: String,
    #[validate(length(min = 3, max = 200, message = "must be between 3 and 200 characters"))]
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub city: String,
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "IN".to_string()
}

impl ShippingAddress {
    /// Validate lengths and the phone / postal code formats.
    pub fn validate_address(&self) -> Result<(), CoreError> {
        validate_dto(self)?;

        let mut v = Violations::new();
        let phone: String = self.phone.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
        v.check(
            !PHONE_RE.is_match(&phone),
            "phone",
            "must be 10 to 15 digits, optionally starting with +",
        );
        v.check(
            !POSTAL_CODE_RE.is_match(self.postal_code.trim()),
            "postal_code",
            "must be 4 to 10 letters or digits",
        );
        v.into_result()
    }
}

/// Customer-facing order reference, e.g. `ORD-20261019-000042`.
pub fn order_number(id: DbId, created_at: Timestamp) -> String {
    format!("ORD-{}-{id:06}", created_at.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn terminal_statuses_have_no_way_out() {
        for from in OrderStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in OrderStatus::ALL {
                assert_matches!(
                    check_transition(from, to, Role::Admin),
                    Err(CoreError::Conflict(_))
                );
            }
        }
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            name: "Asha Rao".into(),
            phone: "+91 98765-43210".into(),
            line1: "12 MG Road".into(),
            line2: None,
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
            country: "IN".into(),
        }
    }

    #[test]
    fn seller_happy_path() {
        use OrderStatus::*;
        assert!(check_transition(Pending, Confirmed, Role::Seller).is_ok());
        assert!(check_transition(Confirmed, Shipped, Role::Seller).is_ok());
        assert!(check_transition(Shipped, Delivered, Role::Admin).is_ok());
    }

    #[test]
    fn buyer_may_only_cancel_before_shipping() {
        use OrderStatus::*;
        assert!(check_transition(Pending, Cancelled, Role::Buyer).is_ok());
        assert!(check_transition(Confirmed, Cancelled, Role::Buyer).is_ok());
        assert_matches!(
            check_transition(Shipped, Cancelled, Role::Buyer),
            Err(CoreError::Forbidden(_))
        );
        assert_matches!(
            check_transition(Pending, Confirmed, Role::Buyer),
            Err(CoreError::Forbidden(_))
        );
    }

    #[test]
    fn terminal_states_have_no_exits() {
        use OrderStatus::*;
        for to in [Pending, Confirmed, Shipped, Delivered, Cancelled] {
            assert_matches!(
                check_transition(Delivered, to, Role::Admin),
                Err(CoreError::Conflict(_))
            );
            assert_matches!(
                check_transition(Cancelled, to, Role::Admin),
                Err(CoreError::Conflict(_))
            );
        }
    }

    #[test]
    fn skipping_steps_conflicts() {
        assert_matches!(
            check_transition(OrderStatus::Pending, OrderStatus::Delivered, Role::Admin),
            Err(CoreError::Conflict(_))
        );
    }

    #[test]
    fn valid_address_passes() {
        assert!(address().validate_address().is_ok());
    }

    #[test]
    fn bad_phone_and_postal_code_reported() {
        let mut a = address();
        a.phone = "12345".into();
        a.postal_code = "!!".into();
        let Err(CoreError::Validation(msg)) = a.validate_address() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("phone"));
        assert!(msg.contains("postal_code"));
    }

    #[test]
    fn short_city_rejected_by_derive() {
        let mut a = address();
        a.city = "X".into();
        assert_matches!(a.validate_address(), Err(CoreError::Validation(msg)) if msg.contains("city"));
    }

    #[test]
    fn order_number_format() {
        let at = chrono::Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        assert_eq!(order_number(42, at), "ORD-20261019-000042");
    }
}
