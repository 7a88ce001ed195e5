//! # mercado-core: Pure Business Logic for the Sale Ledger Engine
//!
//! Everything in this crate is a pure function or a plain data type.
//! The database and storage layers build on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mercado Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP transport / auth (outside workspace)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Principal { user_id, role }            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 mercado-sales (SaleEngine)                      │   │
//! │  │     Ledger ──► State Machine ──► Projection                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mercado-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │   Sale    │  │   Money   │  │  convert  │  │  requests │  │   │
//! │  │   │  Detail   │  │  TaxRate  │  │   quote   │  │  uploads  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 mercado-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Sale, SaleDetail, Voucher, Product, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Unit conversion, bulk pricing and IGV
//! - [`validation`] - Request validation
//! - [`view`] - Denormalized read models returned by the projection
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use mercado_core::pricing::quote;
//! use mercado_core::types::PricedProduct;
//!
//! let product = PricedProduct {
//!     id: 1,
//!     unit: "kg".to_string(),
//!     price_cents: 1000,
//!     bulk_threshold: Some(100),
//!     bulk_price_cents: Some(800),
//! };
//!
//! let q = quote(&product, "kg", 150).unwrap();
//! assert_eq!(q.unit_price.cents(), 800);
//! assert_eq!(q.total.cents(), 141_600);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;
pub mod view;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{convert, price, quote, Quote};
pub use types::*;
pub use view::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// IGV rate in basis points (18%).
///
/// Applied uniformly to every sale subtotal at creation time and
/// never recomputed afterwards.
pub const IGV_BPS: u32 = 1800;

/// Kilograms per tonne.
///
/// The only cross-unit conversion the engine accepts.
pub const KILOGRAMS_PER_TONNE: i64 = 1000;

/// Maximum length of a unit-of-measure name in a request.
pub const MAX_UNIT_NAME_LEN: usize = 20;
