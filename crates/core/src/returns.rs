//! Return request eligibility and decisions.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::order::OrderStatus;
use crate::roles::Role;
use crate::types::Timestamp;

/// Minimum length of the buyer's stated reason.
pub const MIN_REASON_LEN: usize = 10;

/// Default number of days after delivery during which returns are accepted.
pub const DEFAULT_RETURN_WINDOW_DAYS: i64 = 7;

/// Longest return window a deployment may configure.
pub const MAX_RETURN_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnStatus {
    Requested,
    Approved,
    Rejected,
    Refunded,
}

impl ReturnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnStatus::Requested => "requested",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Rejected => "rejected",
            ReturnStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "requested" => Ok(ReturnStatus::Requested),
            "approved" => Ok(ReturnStatus::Approved),
            "rejected" => Ok(ReturnStatus::Rejected),
            "refunded" => Ok(ReturnStatus::Refunded),
            other => Err(CoreError::Validation(format!(
                "Unknown return status '{other}'"
            ))),
        }
    }
}

/// Everything needed to decide whether an item can be returned.
#[derive(Debug, Clone)]
pub struct ReturnCheck<'a> {
    pub order_status: OrderStatus,
    pub delivered_at: Option<Timestamp>,
    pub now: Timestamp,
    pub window_days: i64,
    pub ordered_quantity: i32,
    /// Units already covered by non-rejected return requests.
    pub already_requested: i32,
    pub requested_quantity: i32,
    pub reason: &'a str,
}

pub fn check_return_eligibility(check: &ReturnCheck<'_>) -> Result<(), CoreError> {
    if check.reason.trim().chars().count() < MIN_REASON_LEN {
        return Err(CoreError::Validation(format!(
            "reason: must be at least {MIN_REASON_LEN} characters"
        )));
    }

    let delivered_at = match (check.order_status, check.delivered_at) {
        (OrderStatus::Delivered, Some(at)) => at,
        _ => {
            return Err(CoreError::Conflict(
                "Only delivered orders can be returned".into(),
            ))
        }
    };

    let deadline = chrono::Duration::try_days(check.window_days)
        .and_then(|window| delivered_at.checked_add_signed(window))
        .ok_or_else(|| {
            CoreError::Internal(format!(
                "return window of {} days is out of range",
                check.window_days
            ))
        })?;
    if check.now > deadline {
        return Err(CoreError::Conflict(format!(
            "The {}-day return window has closed",
            check.window_days
        )));
    }

    let remaining = check.ordered_quantity - check.already_requested;
    if check.requested_quantity < 1 || check.requested_quantity > remaining {
        return Err(CoreError::Validation(format!(
            "quantity: must be between 1 and {}",
            remaining.max(0)
        )));
    }

    Ok(())
}

/// Check a decision on a return request.
///
/// Sellers (of the returned item) and admins approve or reject requested
/// returns; only admins mark approved returns as refunded.
pub fn check_return_decision(
    from: ReturnStatus,
    to: ReturnStatus,
    actor: Role,
) -> Result<(), CoreError> {
    use ReturnStatus::*;

    let allowed: &[Role] = match (from, to) {
        (Requested, Approved) | (Requested, Rejected) => &[Role::Seller, Role::Admin],
        (Approved, Refunded) => &[Role::Admin],
        _ => {
            return Err(CoreError::Conflict(format!(
                "Cannot move a return from '{}' to '{}'",
                from.as_str(),
                to.as_str()
            )))
        }
    };

    if allowed.contains(&actor) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "A {actor} cannot move a return to '{}'",
            to.as_str()
        )))
    }
}
