//! Variant list bookkeeping.
//!
//! The product edit form holds the full variant list and submits it as a
//! whole. Persisted variants keep their database id; rows added in the form
//! carry a negative placeholder id (or none). [`plan_variant_sync`] turns
//! that list into creates, updates, and deletes against what is stored.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::product::check_pricing;
use crate::types::{DbId, Money};
use crate::validation::Violations;

/// One variant row as submitted by the edit form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantInput {
    /// Positive for persisted rows; negative or absent for new rows.
    #[serde(default)]
    pub id: Option<DbId>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub mrp: Option<Money>,
    pub stock: i32,
    #[serde(default)]
    pub images: serde_json::Value,
}

impl VariantInput {
    /// Whether this row has not been persisted yet.
    pub fn is_new(&self) -> bool {
        !matches!(self.id, Some(id) if id > 0)
    }
}

/// Operations needed to bring stored variants in line with the submitted list.
///
/// Entries reference the submitted list by index.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct VariantSyncPlan {
    pub create: Vec<usize>,
    pub update: Vec<(DbId, usize)>,
    pub delete: Vec<DbId>,
}

/// Compute the sync plan for a product's variants.
///
/// Fails when a positive id does not belong to the product or appears twice.
pub fn plan_variant_sync(
    existing_ids: &[DbId],
    incoming: &[VariantInput],
) -> Result<VariantSyncPlan, CoreError> {
    let existing: HashSet<DbId> = existing_ids.iter().copied().collect();
    let mut seen: HashSet<DbId> = HashSet::new();
    let mut plan = VariantSyncPlan::default();

    for (idx, variant) in incoming.iter().enumerate() {
        match variant.id {
            Some(id) if id > 0 => {
                if !existing.contains(&id) {
                    return Err(CoreError::Validation(format!(
                        "variants[{idx}]: variant {id} does not belong to this product"
                    )));
                }
                if !seen.insert(id) {
                    return Err(CoreError::Validation(format!(
                        "variants[{idx}]: variant {id} is listed more than once"
                    )));
                }
                plan.update.push((id, idx));
            }
            _ => plan.create.push(idx),
        }
    }

    let mut delete: Vec<DbId> = existing.difference(&seen).copied().collect();
    delete.sort_unstable();
    plan.delete = delete;

    Ok(plan)
}

/// Validate every submitted variant and the list as a whole.
pub fn validate_variants(incoming: &[VariantInput]) -> Result<(), CoreError> {
    let mut v = Violations::new();
    let mut combos: HashSet<(String, String)> = HashSet::new();
    let mut skus: HashSet<String> = HashSet::new();

    for (idx, variant) in incoming.iter().enumerate() {
        let mut row = Violations::new();
        check_pricing(&mut row, variant.price, variant.mrp, variant.stock);

        let color = normalized_attr(variant.color.as_deref());
        let size = normalized_attr(variant.size.as_deref());
        row.check(
            color.is_empty() && size.is_empty(),
            "color",
            "a variant needs a color or a size",
        );
        if !(color.is_empty() && size.is_empty()) && !combos.insert((color, size)) {
            row.push("size", "duplicate color/size combination");
        }

        if let Some(sku) = variant.sku.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            if !skus.insert(sku.to_uppercase()) {
                row.push("sku", format!("duplicate SKU '{sku}'"));
            }
        }

        v.extend_prefixed(&format!("variants[{idx}]"), row);
    }

    v.into_result()
}

/// Human-readable label such as `"Red / M"`.
pub fn variant_label(color: Option<&str>, size: Option<&str>) -> String {
    [color, size]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" / ")
}

fn normalized_attr(value: Option<&str>) -> String {
    value.map(|s| s.trim().to_lowercase()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn variant(id: Option<DbId>, color: &str, size: &str) -> VariantInput {
        VariantInput {
            id,
            color: Some(color.to_string()),
            size: Some(size.to_string()),
            sku: None,
            price: "100".parse().unwrap(),
            mrp: Some("150".parse().unwrap()),
            stock: 3,
            images: serde_json::Value::Null,
        }
    }

    #[test]
    fn plan_splits_create_update_delete() {
        let incoming = vec![
            variant(Some(10), "Red", "M"),
            variant(Some(-1), "Blue", "M"),
            variant(None, "Green", "M"),
        ];
        let plan = plan_variant_sync(&[10, 11, 12], &incoming).unwrap();
        assert_eq!(plan.update, vec![(10, 0)]);
        assert_eq!(plan.create, vec![1, 2]);
        assert_eq!(plan.delete, vec![11, 12]);
    }

    #[test]
    fn zero_id_counts_as_new() {
        let plan = plan_variant_sync(&[], &[variant(Some(0), "Red", "S")]).unwrap();
        assert_eq!(plan.create, vec![0]);
    }

    #[test]
    fn empty_submission_deletes_everything() {
        let plan = plan_variant_sync(&[3, 1, 2], &[]).unwrap();
        assert_eq!(plan.delete, vec![1, 2, 3]);
        assert!(plan.create.is_empty() && plan.update.is_empty());
    }

    #[test]
    fn foreign_id_rejected() {
        assert_matches!(
            plan_variant_sync(&[1], &[variant(Some(99), "Red", "M")]),
            Err(CoreError::Validation(msg)) if msg.contains("does not belong")
        );
    }

    #[test]
    fn duplicate_id_rejected() {
        let incoming = vec![variant(Some(1), "Red", "M"), variant(Some(1), "Red", "L")];
        assert_matches!(
            plan_variant_sync(&[1], &incoming),
            Err(CoreError::Validation(msg)) if msg.contains("more than once")
        );
    }

    #[test]
    fn duplicate_combination_is_case_insensitive() {
        let incoming = vec![variant(None, "Red", "M"), variant(None, " red ", "m")];
        assert_matches!(
            validate_variants(&incoming),
            Err(CoreError::Validation(msg)) if msg.contains("variants[1].size")
        );
    }

    #[test]
    fn duplicate_sku_rejected() {
        let mut a = variant(None, "Red", "M");
        a.sku = Some("KUR-RED-M".into());
        let mut b = variant(None, "Red", "L");
        b.sku = Some("kur-red-m".into());
        assert_matches!(
            validate_variants(&[a, b]),
            Err(CoreError::Validation(msg)) if msg.contains("duplicate SKU")
        );
    }

    #[test]
    fn variant_needs_an_attribute() {
        let mut a = variant(None, "", "");
        a.color = None;
        assert_matches!(
            validate_variants(&[a]),
            Err(CoreError::Validation(msg)) if msg.contains("color or a size")
        );
    }

    #[test]
    fn variant_pricing_rules_apply() {
        let mut a = variant(None, "Red", "M");
        a.mrp = Some("50".parse().unwrap());
        assert_matches!(
            validate_variants(&[a]),
            Err(CoreError::Validation(msg)) if msg.contains("variants[0].mrp")
        );
    }

    #[test]
    fn labels() {
        assert_eq!(variant_label(Some("Red"), Some("M")), "Red / M");
        assert_eq!(variant_label(None, Some("XL")), "XL");
        assert_eq!(variant_label(Some(" "), None), "");
    }
}
