//! # Read Models
//!
//! Denormalized, read-only shapes returned to callers. The projection
//! assembles [`SaleView`] trees; the state machine returns
//! [`SaleDetailView`]; the ledger returns [`SaleCreated`].
//!
//! ```text
//! SaleView
//! ├── sale / detail columns (prices in cents, tax also as "90.00")
//! ├── unit      ─ UnitOfMeasure the customer ordered in
//! ├── product   ─ ProductView
//! │   ├── images: [path]
//! │   └── producer ─ ProducerView
//! ├── customer  ─ CustomerView
//! └── vouchers  ─ VoucherPaths { receipt: [path], paymentProof: [path] }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{SaleDetail, SaleStatus, UnitOfMeasure, Voucher, VoucherType};

// =============================================================================
// Sale View
// =============================================================================

/// A sale joined with everything a list or detail screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    pub sale_id: i64,
    pub customer_id: i64,
    /// Requested quantity, in `unit`.
    pub quantity: i64,
    pub status: SaleStatus,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// IGV formatted with two decimals, e.g. `"90.00"`.
    pub tax: String,
    pub total_price_cents: i64,
    pub unit: UnitOfMeasure,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub product: ProductView,
    pub customer: CustomerView,
    pub vouchers: VoucherPaths,
}

/// Product as it currently stands (price and stock are live values,
/// not the sale's snapshot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub price_cents: i64,
    pub stock: i64,
    /// Native unit name of the product.
    pub unit: String,
    pub images: Vec<String>,
    pub producer: ProducerView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProducerView {
    pub id: i64,
    pub name: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
}

/// Voucher storage paths of one sale, split by type and ordered by upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VoucherPaths {
    pub receipt: Vec<String>,
    pub payment_proof: Vec<String>,
}

impl VoucherPaths {
    /// Appends a path to the list matching its voucher type.
    pub fn push(&mut self, voucher_type: VoucherType, path: String) {
        match voucher_type {
            VoucherType::Receipt => self.receipt.push(path),
            VoucherType::PaymentProof => self.payment_proof.push(path),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.receipt.is_empty() && self.payment_proof.is_empty()
    }
}

/// Formats an amount the way the tax column is displayed.
pub fn display_amount(cents: i64) -> String {
    Money::from_cents(cents).to_decimal_string()
}

// =============================================================================
// Sale Detail View
// =============================================================================

/// Refreshed detail returned by a producer update, merged with the active
/// receipt voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetailView {
    pub sale_id: i64,
    pub product_id: i64,
    pub status: SaleStatus,
    pub unit_id: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub voucher_id: Option<i64>,
    pub voucher_path: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SaleDetailView {
    pub fn new(detail: SaleDetail, receipt: Option<Voucher>) -> Self {
        let (voucher_id, voucher_path) = match receipt {
            Some(v) => (Some(v.id), Some(v.path)),
            None => (detail.voucher_id, None),
        };

        SaleDetailView {
            sale_id: detail.sale_id,
            product_id: detail.product_id,
            status: detail.status,
            unit_id: detail.unit_id,
            unit_price_cents: detail.unit_price_cents,
            subtotal_cents: detail.subtotal_cents,
            tax_cents: detail.tax_cents,
            voucher_id,
            voucher_path,
            updated_at: detail.updated_at,
        }
    }
}

/// Payload of a successful creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreated {
    pub sale_id: i64,
}

/// Payload of a successful payment-proof upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VoucherAttached {
    pub sale_id: i64,
    pub voucher_id: i64,
    pub path: String,
}
