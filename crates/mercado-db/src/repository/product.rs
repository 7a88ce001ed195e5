//! # Product Repository
//!
//! Products as the ledger sees them: a price, a bulk tier, a native unit
//! and a stock level. Also owns the unit-of-measure table.
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Why a Conditional UPDATE?                              │
//! │                                                                         │
//! │  ❌ Read, check, write back:                                            │
//! │     SELECT stock → 1500                                                │
//! │     (another approval commits: stock → 300)                            │
//! │     UPDATE products SET stock = 1500 - 1000   ← overdraws              │
//! │                                                                         │
//! │  ✅ Check and write in one statement:                                   │
//! │     UPDATE products SET stock = stock - ?1                             │
//! │     WHERE id = ?2 AND stock >= ?1                                      │
//! │                                                                         │
//! │  rows_affected == 0 → not enough stock, nothing written.               │
//! │  CHECK (stock >= 0) in the schema backs it up.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::{canonical_unit_name, PricedProduct, UnitOfMeasure};

/// Product row to insert.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub producer_id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    pub unit_id: i64,
    pub bulk_threshold: Option<i64>,
    pub bulk_price_cents: Option<i64>,
}

/// Repository for product and unit database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Transaction-scoped
    // =========================================================================

    /// Loads the pricing slice of a product, joined with its unit name.
    pub async fn priced(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<PricedProduct>> {
        let product = sqlx::query_as::<_, PricedProduct>(
            r#"
            SELECT
                p.id,
                u.name AS unit,
                p.price_cents,
                p.bulk_threshold,
                p.bulk_price_cents
            FROM products p
            JOIN units u ON u.id = p.unit_id
            WHERE p.id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Current stock of a product.
    pub async fn stock(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<i64>> {
        let stock: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(stock)
    }

    /// Takes `quantity` out of stock if, and only if, enough is left.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Not enough stock (or no such product); nothing written
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        id: i64,
        quantity: i64,
    ) -> DbResult<bool> {
        debug!(product_id = id, quantity, "Decrementing stock");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                stock = stock - ?1,
                updated_at = ?3
            WHERE id = ?2 AND stock >= ?1
            "#,
        )
        .bind(quantity)
        .bind(id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Looks a unit up by name (canonicalized first).
    pub async fn find_unit(
        conn: &mut SqliteConnection,
        name: &str,
    ) -> DbResult<Option<UnitOfMeasure>> {
        let unit = sqlx::query_as::<_, UnitOfMeasure>("SELECT id, name FROM units WHERE name = ?1")
            .bind(canonical_unit_name(name))
            .fetch_optional(conn)
            .await?;

        Ok(unit)
    }

    /// Looks a unit up by id.
    pub async fn unit(conn: &mut SqliteConnection, id: i64) -> DbResult<UnitOfMeasure> {
        sqlx::query_as::<_, UnitOfMeasure>("SELECT id, name FROM units WHERE id = ?1")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DbError::not_found("Unit", id))
    }

    // =========================================================================
    // Pool-level
    // =========================================================================

    /// Pool-level variant of [`Self::priced`].
    pub async fn get_priced(&self, id: i64) -> DbResult<Option<PricedProduct>> {
        let mut conn = self.pool.acquire().await?;
        Self::priced(&mut conn, id).await
    }

    /// Pool-level variant of [`Self::stock`].
    pub async fn get_stock(&self, id: i64) -> DbResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        Self::stock(&mut conn, id).await
    }

    /// Inserts a unit if missing and returns its id.
    pub async fn ensure_unit(&self, name: &str) -> DbResult<i64> {
        let name = canonical_unit_name(name);

        sqlx::query("INSERT OR IGNORE INTO units (name) VALUES (?1)")
            .bind(&name)
            .execute(&self.pool)
            .await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM units WHERE name = ?1")
            .bind(&name)
            .fetch_one(&self.pool)
            .await?;

        Ok(id)
    }

    /// Inserts a product and returns its id.
    pub async fn insert(&self, product: &NewProduct) -> DbResult<i64> {
        debug!(name = %product.name, producer_id = product.producer_id, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                producer_id, category_id, name, description,
                price_cents, stock, unit_id,
                bulk_threshold, bulk_price_cents,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7,
                ?8, ?9,
                ?10, ?11
            )
            "#,
        )
        .bind(product.producer_id)
        .bind(product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.unit_id)
        .bind(product.bulk_threshold)
        .bind(product.bulk_price_cents)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Attaches an image path to a product.
    pub async fn add_image(&self, product_id: i64, path: &str) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO product_images (product_id, path, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(product_id)
        .bind(path)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Counts products (for diagnostics and the seed tool).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
