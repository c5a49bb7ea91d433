//! Product form rules and the moderation lifecycle.
//!
//! Sellers create products as drafts or submit them for review; admins
//! approve or reject. Only approved products are visible to shoppers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Money;
use crate::validation::Violations;

pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 150;
pub const MIN_DESCRIPTION_LEN: usize = 20;
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Moderation status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Draft => "draft",
            ProductStatus::Pending => "pending",
            ProductStatus::Approved => "approved",
            ProductStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(ProductStatus::Draft),
            "pending" => Ok(ProductStatus::Pending),
            "approved" => Ok(ProductStatus::Approved),
            "rejected" => Ok(ProductStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Unknown product status '{other}'"
            ))),
        }
    }

    /// Whether shoppers can see and buy the product.
    pub fn is_public(self) -> bool {
        self == ProductStatus::Approved
    }
}

/// The customer-facing fields checked on every create and update.
#[derive(Debug, Clone)]
pub struct ProductFields<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: Money,
    pub mrp: Option<Money>,
    pub stock: i32,
}

/// Validate product form fields, reporting every violation at once.
pub fn validate_product(fields: &ProductFields<'_>) -> Result<(), CoreError> {
    let mut v = Violations::new();

    let name_len = fields.name.trim().chars().count();
    v.check(
        !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len),
        "name",
        format!("must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters"),
    );

    let desc_len = fields.description.trim().chars().count();
    v.check(
        desc_len < MIN_DESCRIPTION_LEN,
        "description",
        format!("must be at least {MIN_DESCRIPTION_LEN} characters"),
    );
    v.check(
        desc_len > MAX_DESCRIPTION_LEN,
        "description",
        format!("must be at most {MAX_DESCRIPTION_LEN} characters"),
    );

    check_pricing(&mut v, fields.price, fields.mrp, fields.stock);

    v.into_result()
}

/// Price / MRP / stock rules shared by products and variants.
pub(crate) fn check_pricing(v: &mut Violations, price: Money, mrp: Option<Money>, stock: i32) {
    v.check(price <= Decimal::ZERO, "price", "must be greater than 0");
    if let Some(mrp) = mrp {
        v.check(mrp < price, "mrp", "must be greater than or equal to the price");
    }
    v.check(stock < 0, "stock", "must not be negative");
}

/// Whole-percent discount of `price` against `mrp`, rounded down.
///
/// Returns 0 when there is no MRP or it does not exceed the price.
pub fn discount_percent(price: Money, mrp: Option<Money>) -> i32 {
    match mrp {
        Some(mrp) if mrp > price && mrp > Decimal::ZERO => ((mrp - price) * Decimal::from(100)
            / mrp)
            .floor()
            .to_i32()
            .unwrap_or(0),
        _ => 0,
    }
}

/// Status a product takes when its owner (not an admin) edits it.
///
/// An approved product goes back to review if anything a shopper sees changed.
pub fn status_after_seller_edit(current: ProductStatus, visible_change: bool) -> ProductStatus {
    if current == ProductStatus::Approved && visible_change {
        ProductStatus::Pending
    } else {
        current
    }
}

/// Move a draft or rejected product into the review queue.
pub fn submit_for_review(current: ProductStatus) -> Result<ProductStatus, CoreError> {
    match current {
        ProductStatus::Draft | ProductStatus::Rejected => Ok(ProductStatus::Pending),
        ProductStatus::Pending => Err(CoreError::Conflict(
            "Product is already awaiting review".into(),
        )),
        ProductStatus::Approved => Err(CoreError::Conflict(
            "Product is already approved".into(),
        )),
    }
}

/// Apply an admin review decision to a pending product.
pub fn review(current: ProductStatus, approve: bool) -> Result<ProductStatus, CoreError> {
    if current != ProductStatus::Pending {
        return Err(CoreError::Conflict(format!(
            "Only pending products can be reviewed (status is '{}')",
            current.as_str()
        )));
    }
    Ok(if approve {
        ProductStatus::Approved
    } else {
        ProductStatus::Rejected
    })
}
