//! # mercado-sales: Sale Ledger Engine
//!
//! Records customer orders against producer inventory, moves them through
//! their lifecycle, and serves role-scoped views of them.
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SaleEngine (facade)                            │
//! │             admission gate • deadline • outcome logging                 │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────────────┐    │
//! │  │    ledger    │   │  state_machine   │   │      projection      │    │
//! │  │ create_sale  │   │ update_sale      │   │ list_sales           │    │
//! │  │ delete_sale  │   │ add_payment_proof│   │ get_sale             │    │
//! │  └──────┬───────┘   └────────┬─────────┘   └──────────┬───────────┘    │
//! │         │                    │                        │                 │
//! │         ▼                    ▼                        ▼                 │
//! │   mercado-core (pricing, validation)        mercado-db (SQLite)         │
//! │                              │                                          │
//! │                              ▼                                          │
//! │                  storage::VoucherStore (objects)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use mercado_core::{CreateSaleRequest, Principal};
//! use mercado_db::{Database, DbConfig};
//! use mercado_sales::{EngineOptions, MemoryStore, SaleEngine};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DbConfig::in_memory()).await?;
//! let engine = SaleEngine::new(db, Arc::new(MemoryStore::new()), EngineOptions::default());
//!
//! let created = engine
//!     .create_sale(Principal::customer(100), &CreateSaleRequest::new(1, 50, "kg"))
//!     .await?;
//! println!("sale {}", created.sale_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod storage;
pub mod telemetry;

mod ledger;
mod projection;
mod state_machine;

pub use config::{ConfigError, DeletionPolicy, SalesConfig};
pub use engine::{principal_from_claims, EngineOptions, SaleEngine};
pub use envelope::{respond, ErrorEnvelope, SuccessEnvelope};
pub use error::{SaleError, SaleResult};
pub use storage::{LocalDirStore, MemoryStore, StorageError, VoucherStore};
