//! # Repository Module
//!
//! Database repository implementations for the sale ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SaleEngine operation                                                  │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  SaleRepository::claim_detail(&mut *tx, sale_id)               │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── claim_detail(conn, sale_id)     ← inside the caller's tx         │
//! │  ├── set_status(conn, sale_id, ..)   ← inside the caller's tx         │
//! │  └── get_detail_by_sale(&self, id)   ← standalone, on the pool        │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PartyRepository`](party::PartyRepository) - Customer/producer lookup by principal
//! - [`ProductRepository`](product::ProductRepository) - Priced products, units, stock
//! - [`SaleRepository`](sale::SaleRepository) - Sale + detail rows, ownership checks
//! - [`VoucherRepository`](voucher::VoucherRepository) - Receipt / payment-proof rows
//! - [`ProjectionRepository`](projection::ProjectionRepository) - Denormalized read path

pub mod party;
pub mod product;
pub mod projection;
pub mod sale;
pub mod voucher;

#[cfg(test)]
pub(crate) mod fixtures;
