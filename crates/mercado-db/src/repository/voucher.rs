//! # Voucher Repository
//!
//! Receipt and payment-proof rows. A sale has at most one active receipt
//! (linked from its detail and replaced in place) and any number of
//! payment proofs.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::{Voucher, VoucherType};

const VOUCHER_COLUMNS: &str = "id, sale_id, path, voucher_type, created_at";

/// Repository for voucher database operations.
#[derive(Debug, Clone)]
pub struct VoucherRepository {
    pool: SqlitePool,
}

impl VoucherRepository {
    /// Creates a new VoucherRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VoucherRepository { pool }
    }

    /// Inserts a voucher row.
    ///
    /// The path may be a placeholder when the final name depends on the
    /// generated id; follow up with [`Self::update_path`].
    pub async fn insert(
        conn: &mut SqliteConnection,
        sale_id: i64,
        voucher_type: VoucherType,
        path: &str,
    ) -> DbResult<Voucher> {
        debug!(sale_id, voucher_type = voucher_type.as_str(), "Inserting voucher");

        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            r#"
            INSERT INTO vouchers (sale_id, path, voucher_type, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {VOUCHER_COLUMNS}
            "#
        ))
        .bind(sale_id)
        .bind(path)
        .bind(voucher_type)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;

        Ok(voucher)
    }

    /// Replaces a voucher's storage path.
    pub async fn update_path(conn: &mut SqliteConnection, id: i64, path: &str) -> DbResult<()> {
        debug!(voucher_id = id, path, "Updating voucher path");

        let result = sqlx::query("UPDATE vouchers SET path = ?2 WHERE id = ?1")
            .bind(id)
            .bind(path)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Voucher", id));
        }

        Ok(())
    }

    /// Loads a voucher by id.
    pub async fn find(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Voucher>> {
        let voucher = sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(voucher)
    }

    /// All vouchers of a sale, oldest first.
    pub async fn for_sale(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Vec<Voucher>> {
        let vouchers = sqlx::query_as::<_, Voucher>(&format!(
            "SELECT {VOUCHER_COLUMNS} FROM vouchers WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(vouchers)
    }

    /// Pool-level variant of [`Self::for_sale`].
    pub async fn list_for_sale(&self, sale_id: i64) -> DbResult<Vec<Voucher>> {
        let mut conn = self.pool.acquire().await?;
        Self::for_sale(&mut conn, sale_id).await
    }
}
