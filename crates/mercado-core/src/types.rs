//! # Domain Types
//!
//! Core domain types of the sale ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1:1 ┌─────────────────┐ 1:N ┌─────────────────┐   │
//! │  │      Sale       │────►│   SaleDetail    │     │    Voucher      │   │
//! │  │  ─────────────  │     │  ─────────────  │     │  ─────────────  │   │
//! │  │  customer_id    │     │  product_id     │     │  sale_id (FK)   │   │
//! │  │  quantity       │     │  unit_price     │     │  path           │   │
//! │  │  total_price    │     │  tax / subtotal │     │  voucher_type   │   │
//! │  └─────────────────┘     │  unit_id        │     └─────────────────┘   │
//! │          │               │  status ★       │             ▲             │
//! │          └───────────────┴─────────────────┴─────────────┘             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   SaleStatus    │   │      Role       │   │  VoucherType    │       │
//! │  │  Requested      │   │  Customer       │   │  Receipt        │       │
//! │  │  Active         │   │  Producer       │   │  PaymentProof   │       │
//! │  │  Approved       │   └─────────────────┘   └─────────────────┘       │
//! │  │  Completed      │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::IGV_BPS;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so IGV (18%) is 1800 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// The fixed IGV rate applied to every sale.
    #[inline]
    pub const fn igv() -> Self {
        TaxRate(IGV_BPS)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Principal
// =============================================================================

/// Role carried by an already-authenticated principal.
///
/// Closed on purpose: adding a role is a compile-time decision point at
/// every `match` that authorizes a sale operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    Producer,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Producer => "PRODUCER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses the role string issued by the authentication collaborator.
///
/// Unknown roles (e.g. `ADMIN`) fail with [`CoreError::UnknownRole`], which
/// the engine surfaces as `Unauthorized`.
impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Role::Customer),
            "PRODUCER" => Ok(Role::Producer),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// Verified identity handed over by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Stable external user id; customers and producers link to it 1:1.
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    pub const fn customer(user_id: i64) -> Self {
        Principal {
            user_id,
            role: Role::Customer,
        }
    }

    pub const fn producer(user_id: i64) -> Self {
        Principal {
            user_id,
            role: Role::Producer,
        }
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Workflow state of a sale, stored on its detail row.
///
/// ## Transition Graph
/// ```text
///                 ┌──────────────────────────────┐
///                 │                              ▼
///   requested ──► active ──► approved ──► completed
///       │                       ▲            ▲
///       └───────────────────────┘            │
///                 active ────────────────────┘
///
///   Entering `approved` is the single point where stock is decremented.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Customer placed the order; nothing committed yet.
    Requested,
    /// Producer acknowledged the order.
    Active,
    /// Producer confirmed; inventory committed.
    Approved,
    /// Terminal.
    Completed,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 4] = [
        SaleStatus::Requested,
        SaleStatus::Active,
        SaleStatus::Approved,
        SaleStatus::Completed,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Requested => "requested",
            SaleStatus::Active => "active",
            SaleStatus::Approved => "approved",
            SaleStatus::Completed => "completed",
        }
    }

    /// States reachable in one step.
    pub const fn allowed_next(&self) -> &'static [SaleStatus] {
        match self {
            SaleStatus::Requested => &[SaleStatus::Active, SaleStatus::Approved],
            SaleStatus::Active => &[SaleStatus::Approved, SaleStatus::Completed],
            SaleStatus::Approved => &[SaleStatus::Completed],
            SaleStatus::Completed => &[],
        }
    }

    pub fn can_transition_to(&self, next: SaleStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Validates a status change against the graph.
    ///
    /// Staying in the same state is not a transition and is accepted.
    pub fn transition_to(&self, next: SaleStatus) -> Result<SaleStatus, CoreError> {
        if *self == next || self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// True once the sale sits at or past approval.
    pub const fn is_approved_or_later(&self) -> bool {
        matches!(self, SaleStatus::Approved | SaleStatus::Completed)
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Requested
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SaleStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SaleStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Voucher Type
// =============================================================================

/// Kind of uploaded proof document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherType {
    /// Seller-issued receipt. At most one active path per sale (upserted).
    Receipt,
    /// Buyer-issued payment proof. Append-only.
    PaymentProof,
}

impl VoucherType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            VoucherType::Receipt => "RECEIPT",
            VoucherType::PaymentProof => "PAYMENT_PROOF",
        }
    }
}

// =============================================================================
// Unit of Measure
// =============================================================================

/// Unit-of-measure entity shared by products and sale requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UnitOfMeasure {
    pub id: i64,
    /// Canonical (trimmed, lowercase) name, e.g. `kg`, `tn`.
    pub name: String,
}

/// Canonical form used for every unit comparison.
pub fn canonical_unit_name(name: &str) -> String {
    name.trim().to_lowercase()
}

// =============================================================================
// Product
// =============================================================================

/// The slice of a product the calculator needs, joined with its unit name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PricedProduct {
    pub id: i64,
    /// Native unit name of the product.
    pub unit: String,
    /// Regular unit price in cents.
    pub price_cents: i64,
    /// Minimum quantity (in the product's unit) that unlocks bulk pricing.
    pub bulk_threshold: Option<i64>,
    /// Bulk unit price in cents.
    pub bulk_price_cents: Option<i64>,
}

impl PricedProduct {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Bulk tier as `(threshold, price)`, only when both halves are configured.
    pub fn bulk_tier(&self) -> Option<(i64, Money)> {
        match (self.bulk_threshold, self.bulk_price_cents) {
            (Some(threshold), Some(cents)) => Some((threshold, Money::from_cents(cents))),
            _ => None,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One customer order for one product at one recorded price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub customer_id: i64,
    /// Requested quantity, in the requested unit.
    pub quantity: i64,
    /// subtotal + IGV, frozen at creation.
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// The priced, stateful record attached to a sale.
///
/// Uses the snapshot pattern: unit price, tax and subtotal are frozen at
/// creation and never recomputed after approval.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub unit_price_cents: i64,
    pub tax_cents: i64,
    /// Unit the customer ordered in.
    pub unit_id: i64,
    pub subtotal_cents: i64,
    /// Active receipt voucher, if one was attached.
    pub voucher_id: Option<i64>,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl SaleDetail {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }
}

/// An uploaded proof document.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: i64,
    pub sale_id: i64,
    /// Remote storage path of the object.
    pub path: String,
    pub voucher_type: VoucherType,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

/// Sale creation request as it arrives from the transport layer.
///
/// Fields are optional so that schema validation, not deserialization,
/// reports which one is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
    pub unit: Option<String>,
}

impl CreateSaleRequest {
    pub fn new(product_id: i64, quantity: i64, unit: impl Into<String>) -> Self {
        CreateSaleRequest {
            product_id: Some(product_id),
            quantity: Some(quantity),
            unit: Some(unit.into()),
        }
    }
}

/// A creation request that passed schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSaleRequest {
    pub product_id: i64,
    pub quantity: i64,
    /// Canonical unit name.
    pub unit: String,
}

/// Binary upload with the client's original file name.
#[derive(Clone, PartialEq, Eq)]
pub struct VoucherFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl VoucherFile {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        VoucherFile {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for VoucherFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoucherFile")
            .field("original_name", &self.original_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Producer-side sale update: a status change, a receipt upload, or both.
#[derive(Debug, Clone, Default)]
pub struct UpdateSaleRequest {
    pub status: Option<SaleStatus>,
    pub voucher_file: Option<VoucherFile>,
}

impl UpdateSaleRequest {
    pub fn status(status: SaleStatus) -> Self {
        UpdateSaleRequest {
            status: Some(status),
            voucher_file: None,
        }
    }

    pub fn receipt(file: VoucherFile) -> Self {
        UpdateSaleRequest {
            status: None,
            voucher_file: Some(file),
        }
    }

    pub fn with_receipt(mut self, file: VoucherFile) -> Self {
        self.voucher_file = Some(file);
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
