//! Cart reconciliation rules.
//!
//! The bulk sync endpoint accepts whatever the client kept in local storage,
//! so entries are read leniently: anything unusable is dropped instead of
//! failing the whole batch.

use serde_json::Value;

use terracotta_core::{ProductId, SyncQuantity};

use crate::db::cart::SyncEntry;

/// Normalize a raw sync payload, keeping batch order.
///
/// An entry is skipped when `productId` is missing or not a positive integer
/// id, or when `quantity` is missing or non-numeric. Quantities are truncated
/// toward zero, `<= 0` means remove, and anything above the sync cap is
/// clamped.
#[must_use]
pub fn parse_sync_entries(raw: &[Value]) -> Vec<SyncEntry> {
    raw.iter().filter_map(parse_sync_entry).collect()
}

fn parse_sync_entry(entry: &Value) -> Option<SyncEntry> {
    let product_id = parse_product_id(entry.get("productId")?)?;
    let quantity = parse_number(entry.get("quantity")?)?;
    Some(SyncEntry {
        product_id,
        quantity: SyncQuantity::normalize(quantity),
    })
}

/// Accept a JSON integer or a string of digits.
pub(crate) fn parse_product_id(value: &Value) -> Option<ProductId> {
    let id = match value {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse::<i32>().ok()?,
        _ => return None,
    };
    (id > 0).then(|| ProductId::new(id))
}

fn parse_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
