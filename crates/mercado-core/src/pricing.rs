//! # Unit Conversion & Pricing Calculator
//!
//! Pure functions shared by the ledger (pricing a new order) and the state
//! machine (re-deriving the quantity to take out of stock at approval).
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request: 2 tn          product: S/ 10.00 / kg, bulk ≥ 100 → S/ 8.00    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  unit_price(product, 2) ──► 2 < 100, regular S/ 10.00                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  convert("tn", "kg", 2) ──► 2000 kg      subtotal ──► S/ 20000.00       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  IGV 18% ──► S/ 3600.00      total ──► S/ 23600.00                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bulk tier is chosen from the quantity as requested. The conversion
//! factor only scales the quantity that is billed and taken out of stock.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{canonical_unit_name, PricedProduct, TaxRate};
use crate::KILOGRAMS_PER_TONNE;

/// Fully priced order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Requested quantity expressed in the product's unit.
    pub converted_quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

/// Converts a requested quantity into the product's native unit.
///
/// Supported pairs are identity and `tn → kg` (×1000). Every other pair is
/// rejected even when an inverse factor exists, so un-vetted units never get
/// a silently wrong factor.
///
/// ## Example
/// ```rust
/// use mercado_core::pricing::convert;
///
/// assert_eq!(convert("tn", "kg", 2).unwrap(), 2000);
/// assert_eq!(convert("KG", "kg", 5).unwrap(), 5);
/// assert!(convert("kg", "tn", 2000).is_err());
/// ```
pub fn convert(requested_unit: &str, product_unit: &str, quantity: i64) -> CoreResult<i64> {
    let from = canonical_unit_name(requested_unit);
    let to = canonical_unit_name(product_unit);

    let factor = match (from.as_str(), to.as_str()) {
        (a, b) if a == b => 1,
        ("tn", "kg") => KILOGRAMS_PER_TONNE,
        _ => return Err(CoreError::UnsupportedUnitConversion { from, to }),
    };

    quantity
        .checked_mul(factor)
        .ok_or_else(|| overflow("quantity"))
}

/// Selects the unit price for a quantity as the customer requested it.
///
/// Bulk pricing applies once `requested_quantity >= bulk_threshold`, provided
/// the product has both a threshold and a bulk price.
pub fn unit_price(product: &PricedProduct, requested_quantity: i64) -> Money {
    match product.bulk_tier() {
        Some((threshold, bulk_price)) if requested_quantity >= threshold => bulk_price,
        _ => product.price(),
    }
}

/// Selects the unit price from the requested quantity and bills it against
/// the converted quantity.
pub fn price(
    product: &PricedProduct,
    requested_quantity: i64,
    converted_quantity: i64,
) -> CoreResult<(Money, Money)> {
    let unit_price = unit_price(product, requested_quantity);

    let subtotal = unit_price
        .checked_multiply_quantity(converted_quantity)
        .ok_or_else(|| overflow("subtotal"))?;

    Ok((unit_price, subtotal))
}

/// Converts, prices and taxes an order in one step.
pub fn quote(product: &PricedProduct, requested_unit: &str, quantity: i64) -> CoreResult<Quote> {
    let converted_quantity = convert(requested_unit, &product.unit, quantity)?;
    let (unit_price, subtotal) = price(product, quantity, converted_quantity)?;
    let tax = subtotal.calculate_tax(TaxRate::igv());
    let total = subtotal.checked_add(tax).ok_or_else(|| overflow("total"))?;

    Ok(Quote {
        converted_quantity,
        unit_price,
        subtotal,
        tax,
        total,
    })
}

fn overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 1,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tiered(unit: &str) -> PricedProduct {
        PricedProduct {
            id: 1,
            unit: unit.to_string(),
            price_cents: 1000,
            bulk_threshold: Some(100),
            bulk_price_cents: Some(800),
        }
    }

    #[test]
    fn test_regular_price_below_threshold() {
        let q = quote(&tiered("kg"), "kg", 50).unwrap();
        assert_eq!(q.unit_price.cents(), 1000);
        assert_eq!(q.subtotal.cents(), 50_000);
        assert_eq!(q.tax.cents(), 9_000);
        assert_eq!(q.total.cents(), 59_000);
    }

    #[test]
    fn test_bulk_price_at_or_above_threshold() {
        let q = quote(&tiered("kg"), "kg", 150).unwrap();
        assert_eq!(q.unit_price.cents(), 800);
        assert_eq!(q.subtotal.cents(), 120_000);
        assert_eq!(q.tax.cents(), 21_600);
        assert_eq!(q.total.cents(), 141_600);

        let edge = quote(&tiered("kg"), "kg", 100).unwrap();
        assert_eq!(edge.unit_price.cents(), 800);
    }

    #[test]
    fn test_no_bulk_tier_configured() {
        let product = PricedProduct {
            bulk_threshold: None,
            bulk_price_cents: None,
            ..tiered("kg")
        };
        let q = quote(&product, "kg", 10_000).unwrap();
        assert_eq!(q.unit_price.cents(), 1000);
    }

    #[test]
    fn test_tonnes_against_kilogram_product() {
        let q = quote(&tiered("kg"), "tn", 2).unwrap();
        assert_eq!(q.converted_quantity, 2000);
        // 2 is below the threshold even though 2000 kg is billed
        assert_eq!(q.unit_price.cents(), 1000);
        assert_eq!(q.subtotal.cents(), 2_000_000);
        assert_eq!(q.total.cents(), 2_360_000);
    }

    #[test]
    fn test_bulk_tier_uses_requested_quantity() {
        let product = PricedProduct {
            bulk_threshold: Some(5),
            ..tiered("kg")
        };
        let q = quote(&product, "tn", 5).unwrap();
        assert_eq!(q.unit_price.cents(), 800);
        assert_eq!(q.subtotal.cents(), 4_000_000);

        let q = quote(&tiered("kg"), "tn", 1).unwrap();
        assert_eq!(q.unit_price.cents(), 1000);
    }

    #[test]
    fn test_reverse_direction_rejected() {
        let err = quote(&tiered("tn"), "kg", 2000).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedUnitConversion { ref from, ref to } if from == "kg" && to == "tn"
        ));
    }

    #[test]
    fn test_unknown_pair_rejected() {
        assert!(convert("lb", "kg", 1).is_err());
        assert!(convert("g", "kg", 1000).is_err());
    }

    #[test]
    fn test_unit_names_are_canonicalized() {
        assert_eq!(convert(" Tn ", "KG", 3).unwrap(), 3000);
    }

    #[test]
    fn test_overflow_is_validation_error() {
        let err = convert("tn", "kg", i64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = price(&tiered("kg"), 1, i64::MAX / 10).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_total_overflow_is_validation_error() {
        // Subtotal fits in i64, subtotal plus IGV does not
        let product = PricedProduct {
            price_cents: 650,
            bulk_threshold: None,
            bulk_price_cents: None,
            ..tiered("kg")
        };
        let err = quote(&product, "kg", 14_000_000_000_000_000).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "total"
        ));
    }

    proptest! {
        #[test]
        fn prop_total_is_subtotal_plus_igv(qty in 1i64..1_000_000, price_cents in 1i64..100_000) {
            let product = PricedProduct {
                id: 1,
                unit: "kg".to_string(),
                price_cents,
                bulk_threshold: None,
                bulk_price_cents: None,
            };
            let q = quote(&product, "kg", qty).unwrap();
            prop_assert_eq!(q.total, q.subtotal + q.tax);
            // Exact to the rounded cent
            let exact = q.subtotal.cents() as i128 * 18;
            prop_assert!((q.tax.cents() as i128 * 100 - exact).abs() <= 50);
        }

        #[test]
        fn prop_tonnes_scale_quantity_not_price(qty in 1i64..10_000) {
            let product = PricedProduct { bulk_threshold: None, bulk_price_cents: None, ..tiered("kg") };
            let in_tonnes = quote(&product, "tn", qty).unwrap();
            prop_assert_eq!(in_tonnes.converted_quantity, qty * 1000);
            let in_kilos = quote(&product, "kg", qty * 1000).unwrap();
            prop_assert_eq!(in_tonnes.unit_price, product.price());
            prop_assert_eq!(in_tonnes, in_kilos);
        }
    }
}
