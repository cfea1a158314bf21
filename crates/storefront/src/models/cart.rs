//! Server-side cart models.

use serde::Serialize;

use super::Product;

/// One product in a cart with its current catalog data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: i32,
}

/// The authoritative cart returned after every cart operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
}
