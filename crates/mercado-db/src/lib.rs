//! # mercado-db: Database Layer for the Sale Ledger
//!
//! SQLite persistence for sales, sale details, vouchers and the catalog
//! rows the ledger reads.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mercado Data Flow                                │
//! │                                                                         │
//! │  SaleEngine (mercado-sales)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     mercado-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ PartyRepo     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │ SaleRepo      │    │              │  │   │
//! │  │   │               │    │ VoucherRepo   │    │              │  │   │
//! │  │   │               │    │ ProjectionRepo│    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Kinds of Repository Calls
//!
//! - Methods on `&self` run on the pool (standalone reads, seeding).
//! - Associated functions taking `&mut SqliteConnection` run inside the
//!   caller's transaction; pass `&mut *tx`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mercado_db::{Database, DbConfig, SaleRepository};
//!
//! let db = Database::new(DbConfig::new("./data/mercado.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! let detail = SaleRepository::get_detail(&mut *tx, sale_id).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::party::{NewCustomer, NewProducer, PartyRepository};
pub use repository::product::{NewProduct, ProductRepository};
pub use repository::projection::{ProjectionRepository, SaleScope};
pub use repository::sale::{NewSaleDetail, SaleRepository};
pub use repository::voucher::VoucherRepository;
