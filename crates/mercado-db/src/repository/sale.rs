//! # Sale Repository
//!
//! Database operations for sales and their detail rows.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     └── insert_sale()   → Sale                                         │
//! │     └── insert_detail() → SaleDetail { status: requested }             │
//! │                                                                         │
//! │  2. UPDATE (one transaction)                                           │
//! │     └── claim_detail()  → takes the write lock, loads the detail       │
//! │     └── set_status() / link_voucher()                                  │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── delete()        → cascades to detail + vouchers                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::{Money, Sale, SaleDetail, SaleStatus};

const SALE_COLUMNS: &str = "id, customer_id, quantity, total_price_cents, created_at";

const DETAIL_COLUMNS: &str = "id, sale_id, product_id, unit_price_cents, tax_cents, unit_id, \
     subtotal_cents, voucher_id, status, updated_at";

/// Detail row to insert alongside a new sale.
///
/// Uses the snapshot pattern: prices are copied at creation time so the
/// sale keeps its history even if the product price changes later.
#[derive(Debug, Clone)]
pub struct NewSaleDetail {
    pub sale_id: i64,
    pub product_id: i64,
    pub unit_price: Money,
    pub tax: Money,
    pub unit_id: i64,
    pub subtotal: Money,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Transaction-scoped
    // =========================================================================

    /// Inserts a sale header.
    pub async fn insert_sale(
        conn: &mut SqliteConnection,
        customer_id: i64,
        quantity: i64,
        total_price: Money,
    ) -> DbResult<Sale> {
        debug!(customer_id, quantity, total = %total_price, "Inserting sale");

        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            INSERT INTO sales (customer_id, quantity, total_price_cents, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(customer_id)
        .bind(quantity)
        .bind(total_price.cents())
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(sale)
    }

    /// Inserts the detail row of a sale with status `requested`.
    pub async fn insert_detail(
        conn: &mut SqliteConnection,
        detail: &NewSaleDetail,
    ) -> DbResult<SaleDetail> {
        debug!(sale_id = detail.sale_id, product_id = detail.product_id, "Inserting sale detail");

        let row = sqlx::query_as::<_, SaleDetail>(&format!(
            r#"
            INSERT INTO sale_details (
                sale_id, product_id, unit_price_cents, tax_cents,
                unit_id, subtotal_cents, voucher_id, status, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8)
            RETURNING {DETAIL_COLUMNS}
            "#
        ))
        .bind(detail.sale_id)
        .bind(detail.product_id)
        .bind(detail.unit_price.cents())
        .bind(detail.tax.cents())
        .bind(detail.unit_id)
        .bind(detail.subtotal.cents())
        .bind(SaleStatus::Requested)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(row)
    }

    /// Claims a sale's detail row for the rest of the transaction and
    /// returns it.
    ///
    /// ## Locking
    /// Run this as the first statement of the transaction. Being a write,
    /// it takes SQLite's database-wide write lock, so every later read in
    /// the same transaction (stock included) sees data no concurrent
    /// writer can change until commit or rollback. Competing claims wait
    /// up to the busy timeout.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - No detail for this sale
    pub async fn claim_detail(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<SaleDetail> {
        debug!(sale_id, "Claiming sale detail");

        sqlx::query_as::<_, SaleDetail>(&format!(
            r#"
            UPDATE sale_details SET updated_at = ?2
            WHERE sale_id = ?1
            RETURNING {DETAIL_COLUMNS}
            "#
        ))
        .bind(sale_id)
        .bind(Utc::now())
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", sale_id))
    }

    /// Loads a sale's detail row.
    pub async fn detail(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Option<SaleDetail>> {
        let row = sqlx::query_as::<_, SaleDetail>(&format!(
            "SELECT {DETAIL_COLUMNS} FROM sale_details WHERE sale_id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    /// Loads a sale header.
    pub async fn sale(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(sale)
    }

    /// Writes a new status on a sale's detail.
    pub async fn set_status(
        conn: &mut SqliteConnection,
        sale_id: i64,
        status: SaleStatus,
    ) -> DbResult<()> {
        debug!(sale_id, status = %status, "Updating sale status");

        let result = sqlx::query(
            "UPDATE sale_details SET status = ?2, updated_at = ?3 WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .bind(status)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    /// Points a sale's detail at its active receipt voucher.
    pub async fn link_voucher(
        conn: &mut SqliteConnection,
        sale_id: i64,
        voucher_id: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE sale_details SET voucher_id = ?2, updated_at = ?3 WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .bind(voucher_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        Ok(())
    }

    /// True when the sale was placed by this customer.
    pub async fn is_owned_by_customer(
        conn: &mut SqliteConnection,
        sale_id: i64,
        customer_id: i64,
    ) -> DbResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM sales WHERE id = ?1 AND customer_id = ?2")
                .bind(sale_id)
                .bind(customer_id)
                .fetch_optional(conn)
                .await?;

        Ok(found.is_some())
    }

    /// True when the sale's product belongs to this producer.
    pub async fn is_owned_by_producer(
        conn: &mut SqliteConnection,
        sale_id: i64,
        producer_id: i64,
    ) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT d.sale_id
            FROM sale_details d
            JOIN products p ON p.id = d.product_id
            WHERE d.sale_id = ?1 AND p.producer_id = ?2
            "#,
        )
        .bind(sale_id)
        .bind(producer_id)
        .fetch_optional(conn)
        .await?;

        Ok(found.is_some())
    }

    /// Deletes a sale; its detail and vouchers go with it (ON DELETE CASCADE).
    ///
    /// ## Returns
    /// * `Ok(true)` - Sale deleted
    /// * `Ok(false)` - No such sale
    pub async fn delete(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<bool> {
        debug!(sale_id, "Deleting sale");

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(sale_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Pool-level
    // =========================================================================

    /// Gets a sale header by ID.
    pub async fn get_sale(&self, id: i64) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        Self::sale(&mut conn, id).await
    }

    /// Gets the detail row of a sale.
    pub async fn get_detail_by_sale(&self, sale_id: i64) -> DbResult<Option<SaleDetail>> {
        let mut conn = self.pool.acquire().await?;
        Self::detail(&mut conn, sale_id).await
    }

    /// Counts sales (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
