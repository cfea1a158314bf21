//! Cart quantity normalization for client-side cart synchronization.

/// Largest quantity a single cart row may hold after a sync.
pub const MAX_SYNC_QUANTITY: i32 = 99;

/// What a sync should do with one incoming `(product, quantity)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncQuantity {
    /// Delete the row if present.
    Remove,
    /// Store exactly this quantity (1..=[`MAX_SYNC_QUANTITY`]).
    Set(i32),
}

impl SyncQuantity {
    /// Normalize a client-supplied quantity.
    ///
    /// Fractions are truncated toward zero, anything at or below zero (or
    /// not a number) removes the row, and large values are clamped.
    ///
    /// ```
    /// use terracotta_core::SyncQuantity;
    ///
    /// assert_eq!(SyncQuantity::normalize(2.7), SyncQuantity::Set(2));
    /// assert_eq!(SyncQuantity::normalize(0.4), SyncQuantity::Remove);
    /// assert_eq!(SyncQuantity::normalize(500.0), SyncQuantity::Set(99));
    /// ```
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn normalize(raw: f64) -> Self {
        let whole = raw.trunc();
        if whole.is_nan() || whole < 1.0 {
            return Self::Remove;
        }
        if whole >= f64::from(MAX_SYNC_QUANTITY) {
            return Self::Set(MAX_SYNC_QUANTITY);
        }
        // 1.0 <= whole < 99.0 here
        Self::Set(whole as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_fractions() {
        assert_eq!(SyncQuantity::normalize(2.0), SyncQuantity::Set(2));
        assert_eq!(SyncQuantity::normalize(2.99), SyncQuantity::Set(2));
        assert_eq!(SyncQuantity::normalize(1.0), SyncQuantity::Set(1));
    }

    #[test]
    fn test_non_positive_removes() {
        assert_eq!(SyncQuantity::normalize(0.0), SyncQuantity::Remove);
        assert_eq!(SyncQuantity::normalize(0.9), SyncQuantity::Remove);
        assert_eq!(SyncQuantity::normalize(-3.0), SyncQuantity::Remove);
        assert_eq!(SyncQuantity::normalize(f64::NAN), SyncQuantity::Remove);
        assert_eq!(SyncQuantity::normalize(f64::NEG_INFINITY), SyncQuantity::Remove);
    }

    #[test]
    fn test_clamps_to_max() {
        assert_eq!(SyncQuantity::normalize(99.0), SyncQuantity::Set(99));
        assert_eq!(SyncQuantity::normalize(1e12), SyncQuantity::Set(99));
        assert_eq!(SyncQuantity::normalize(f64::INFINITY), SyncQuantity::Set(99));
    }
}
