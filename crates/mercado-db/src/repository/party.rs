//! # Party Repository
//!
//! Customers and producers, each linked 1:1 to an authentication principal
//! through `user_id`. The ledger only ever resolves them; catalog CRUD lives
//! elsewhere, so inserts here serve seeding and tests.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Customer row to insert.
#[derive(Debug, Clone, Default)]
pub struct NewCustomer {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
}

/// Producer row to insert.
#[derive(Debug, Clone, Default)]
pub struct NewProducer {
    pub user_id: i64,
    pub name: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
}

/// Repository for customer/producer lookups.
#[derive(Debug, Clone)]
pub struct PartyRepository {
    pool: SqlitePool,
}

impl PartyRepository {
    /// Creates a new PartyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PartyRepository { pool }
    }

    /// Customer id linked to a principal's user id.
    pub async fn customer_id_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> DbResult<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM customers WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(conn)
            .await?;

        Ok(id)
    }

    /// Producer id linked to a principal's user id.
    pub async fn producer_id_for_user(
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> DbResult<Option<i64>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM producers WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(conn)
            .await?;

        Ok(id)
    }

    /// Pool-level variant of [`Self::customer_id_for_user`].
    pub async fn find_customer_id(&self, user_id: i64) -> DbResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        Self::customer_id_for_user(&mut conn, user_id).await
    }

    /// Pool-level variant of [`Self::producer_id_for_user`].
    pub async fn find_producer_id(&self, user_id: i64) -> DbResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        Self::producer_id_for_user(&mut conn, user_id).await
    }

    /// Inserts a customer and returns its id.
    pub async fn insert_customer(&self, customer: &NewCustomer) -> DbResult<i64> {
        debug!(user_id = customer.user_id, "Inserting customer");

        let result = sqlx::query(
            r#"
            INSERT INTO customers (
                user_id, first_name, last_name, business_name, phone, document, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(customer.user_id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(&customer.business_name)
        .bind(&customer.phone)
        .bind(&customer.document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Inserts a producer and returns its id.
    pub async fn insert_producer(&self, producer: &NewProducer) -> DbResult<i64> {
        debug!(user_id = producer.user_id, "Inserting producer");

        let result = sqlx::query(
            r#"
            INSERT INTO producers (
                user_id, name, business_name, phone, document, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(producer.user_id)
        .bind(&producer.name)
        .bind(&producer.business_name)
        .bind(&producer.phone)
        .bind(&producer.document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
