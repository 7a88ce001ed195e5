//! # Projection Repository
//!
//! Read path: assembles denormalized [`SaleView`] trees for one principal.
//!
//! ## Query Plan
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. sales ⋈ sale_details ⋈ products ⋈ producers ⋈ customers ⋈ units    │
//! │     WHERE <scope>  [AND s.id = ?]   ORDER BY s.id DESC                  │
//! │                                                                         │
//! │  2. vouchers       WHERE sale_id    IN (…sale id batch…)    ORDER BY id │
//! │  3. product_images WHERE product_id IN (…product id batch…) ORDER BY id │
//! │                                                                         │
//! │  Ids are bound in batches of MAX_BINDS_PER_QUERY, one query per batch.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Never writes.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::error::DbResult;

/// Bind variables per `IN (…)` query, under SQLite's host parameter limit.
const MAX_BINDS_PER_QUERY: usize = 900;
use mercado_core::{
    display_amount, CustomerView, ProducerView, ProductView, SaleStatus, SaleView, UnitOfMeasure,
    VoucherPaths, VoucherType,
};

/// Which sales a principal may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleScope {
    /// Sales placed by this customer id.
    Customer(i64),
    /// Sales of products owned by this producer id.
    Producer(i64),
}

const SALE_VIEW_SELECT: &str = r#"
    SELECT
        s.id                AS sale_id,
        s.customer_id       AS customer_id,
        s.quantity          AS quantity,
        s.total_price_cents AS total_price_cents,
        s.created_at        AS created_at,
        d.product_id        AS product_id,
        d.unit_price_cents  AS unit_price_cents,
        d.tax_cents         AS tax_cents,
        d.subtotal_cents    AS subtotal_cents,
        d.status            AS status,
        d.updated_at        AS updated_at,
        e.id                AS unit_id,
        e.name              AS unit_name,
        p.name              AS product_name,
        p.description       AS product_description,
        p.category_id       AS category_id,
        p.price_cents       AS product_price_cents,
        p.stock             AS product_stock,
        pu.name             AS product_unit,
        pr.id               AS producer_id,
        pr.name             AS producer_name,
        pr.business_name    AS producer_business_name,
        pr.phone            AS producer_phone,
        pr.document         AS producer_document,
        c.first_name        AS customer_first_name,
        c.last_name         AS customer_last_name,
        c.business_name     AS customer_business_name,
        c.phone             AS customer_phone,
        c.document          AS customer_document
    FROM sales s
    JOIN sale_details d ON d.sale_id = s.id
    JOIN products p     ON p.id = d.product_id
    JOIN units pu       ON pu.id = p.unit_id
    JOIN producers pr   ON pr.id = p.producer_id
    JOIN customers c    ON c.id = s.customer_id
    JOIN units e        ON e.id = d.unit_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    sale_id: i64,
    customer_id: i64,
    quantity: i64,
    total_price_cents: i64,
    created_at: DateTime<Utc>,
    product_id: i64,
    unit_price_cents: i64,
    tax_cents: i64,
    subtotal_cents: i64,
    status: SaleStatus,
    updated_at: DateTime<Utc>,
    unit_id: i64,
    unit_name: String,
    product_name: String,
    product_description: Option<String>,
    category_id: Option<i64>,
    product_price_cents: i64,
    product_stock: i64,
    product_unit: String,
    producer_id: i64,
    producer_name: String,
    producer_business_name: Option<String>,
    producer_phone: Option<String>,
    producer_document: Option<String>,
    customer_first_name: String,
    customer_last_name: String,
    customer_business_name: Option<String>,
    customer_phone: Option<String>,
    customer_document: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct VoucherPathRow {
    sale_id: i64,
    voucher_type: VoucherType,
    path: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    product_id: i64,
    path: String,
}

/// Repository for the denormalized sale read path.
#[derive(Debug, Clone)]
pub struct ProjectionRepository {
    pool: SqlitePool,
}

impl ProjectionRepository {
    /// Creates a new ProjectionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProjectionRepository { pool }
    }

    /// All sales visible in `scope`, newest first.
    pub async fn list(&self, scope: SaleScope) -> DbResult<Vec<SaleView>> {
        self.load(scope, None).await
    }

    /// One sale, if it exists and is visible in `scope`.
    pub async fn get(&self, scope: SaleScope, sale_id: i64) -> DbResult<Option<SaleView>> {
        Ok(self.load(scope, Some(sale_id)).await?.into_iter().next())
    }

    async fn load(&self, scope: SaleScope, sale_id: Option<i64>) -> DbResult<Vec<SaleView>> {
        let mut query = QueryBuilder::<Sqlite>::new(SALE_VIEW_SELECT);
        match scope {
            SaleScope::Customer(customer_id) => {
                query.push(" WHERE s.customer_id = ").push_bind(customer_id);
            }
            SaleScope::Producer(producer_id) => {
                query.push(" WHERE p.producer_id = ").push_bind(producer_id);
            }
        }
        if let Some(sale_id) = sale_id {
            query.push(" AND s.id = ").push_bind(sale_id);
        }
        query.push(" ORDER BY s.id DESC");

        let rows: Vec<SaleRow> = query.build_query_as().fetch_all(&self.pool).await?;

        debug!(?scope, ?sale_id, rows = rows.len(), "Loaded sale rows");

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let sale_ids: BTreeSet<i64> = rows.iter().map(|r| r.sale_id).collect();
        let product_ids: BTreeSet<i64> = rows.iter().map(|r| r.product_id).collect();

        let mut vouchers = self.vouchers_by_sale(&sale_ids).await?;
        let images = self.images_by_product(&product_ids).await?;

        let views = rows
            .into_iter()
            .map(|row| {
                let paths = vouchers.remove(&row.sale_id).unwrap_or_default();
                let product_images = images.get(&row.product_id).cloned().unwrap_or_default();
                assemble(row, paths, product_images)
            })
            .collect();

        Ok(views)
    }

    async fn vouchers_by_sale(&self, sale_ids: &BTreeSet<i64>) -> DbResult<HashMap<i64, VoucherPaths>> {
        let sale_ids: Vec<i64> = sale_ids.iter().copied().collect();
        let mut by_sale: HashMap<i64, VoucherPaths> = HashMap::new();

        for batch in sale_ids.chunks(MAX_BINDS_PER_QUERY) {
            let mut query = QueryBuilder::<Sqlite>::new(
                "SELECT sale_id, voucher_type, path FROM vouchers WHERE sale_id IN (",
            );
            let mut ids = query.separated(", ");
            for id in batch {
                ids.push_bind(*id);
            }
            ids.push_unseparated(") ORDER BY id");

            let rows: Vec<VoucherPathRow> = query.build_query_as().fetch_all(&self.pool).await?;

            for row in rows {
                by_sale
                    .entry(row.sale_id)
                    .or_default()
                    .push(row.voucher_type, row.path);
            }
        }

        Ok(by_sale)
    }

    async fn images_by_product(
        &self,
        product_ids: &BTreeSet<i64>,
    ) -> DbResult<HashMap<i64, Vec<String>>> {
        let product_ids: Vec<i64> = product_ids.iter().copied().collect();
        let mut by_product: HashMap<i64, Vec<String>> = HashMap::new();

        for batch in product_ids.chunks(MAX_BINDS_PER_QUERY) {
            let mut query = QueryBuilder::<Sqlite>::new(
                "SELECT product_id, path FROM product_images WHERE product_id IN (",
            );
            let mut ids = query.separated(", ");
            for id in batch {
                ids.push_bind(*id);
            }
            ids.push_unseparated(") ORDER BY id");

            let rows: Vec<ImageRow> = query.build_query_as().fetch_all(&self.pool).await?;

            for row in rows {
                by_product.entry(row.product_id).or_default().push(row.path);
            }
        }

        Ok(by_product)
    }
}

fn assemble(row: SaleRow, vouchers: VoucherPaths, images: Vec<String>) -> SaleView {
    SaleView {
        sale_id: row.sale_id,
        customer_id: row.customer_id,
        quantity: row.quantity,
        status: row.status,
        unit_price_cents: row.unit_price_cents,
        subtotal_cents: row.subtotal_cents,
        tax_cents: row.tax_cents,
        tax: display_amount(row.tax_cents),
        total_price_cents: row.total_price_cents,
        unit: UnitOfMeasure {
            id: row.unit_id,
            name: row.unit_name,
        },
        created_at: row.created_at,
        updated_at: row.updated_at,
        product: ProductView {
            id: row.product_id,
            name: row.product_name,
            description: row.product_description,
            category_id: row.category_id,
            price_cents: row.product_price_cents,
            stock: row.product_stock,
            unit: row.product_unit,
            images,
            producer: ProducerView {
                id: row.producer_id,
                name: row.producer_name,
                business_name: row.producer_business_name,
                phone: row.producer_phone,
                document: row.producer_document,
            },
        },
        customer: CustomerView {
            id: row.customer_id,
            first_name: row.customer_first_name,
            last_name: row.customer_last_name,
            business_name: row.customer_business_name,
            phone: row.customer_phone,
            document: row.customer_document,
        },
        vouchers,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::Fixture;
    use crate::repository::sale::{NewSaleDetail, SaleRepository};
    use crate::repository::voucher::VoucherRepository;
    use mercado_core::Money;

    async fn place(fx: &Fixture, customer_id: i64, product_id: i64, unit_id: i64) -> i64 {
        let mut tx = fx.db.begin().await.unwrap();
        let sale = SaleRepository::insert_sale(&mut tx, customer_id, 2, Money::from_cents(2360))
            .await
            .unwrap();
        SaleRepository::insert_detail(
            &mut tx,
            &NewSaleDetail {
                sale_id: sale.id,
                product_id,
                unit_price: Money::from_cents(1000),
                tax: Money::from_cents(360),
                unit_id,
                subtotal: Money::from_cents(2000),
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        sale.id
    }

    #[tokio::test]
    async fn test_scopes() {
        let fx = Fixture::new().await;
        let a = place(&fx, fx.customer_id, fx.potatoes_kg, fx.kg).await;
        let b = place(&fx, fx.customer_id, fx.quinoa_tn, fx.tn).await;
        let c = place(&fx, fx.other_customer_id, fx.potatoes_kg, fx.kg).await;
        let projection = fx.db.projection();

        let mine = projection.list(SaleScope::Customer(fx.customer_id)).await.unwrap();
        assert_eq!(mine.iter().map(|v| v.sale_id).collect::<Vec<_>>(), vec![b, a]);

        let producer = projection.list(SaleScope::Producer(fx.producer_id)).await.unwrap();
        assert_eq!(producer.iter().map(|v| v.sale_id).collect::<Vec<_>>(), vec![c, a]);

        assert!(projection
            .get(SaleScope::Customer(fx.other_customer_id), a)
            .await
            .unwrap()
            .is_none());
        assert!(projection
            .get(SaleScope::Producer(fx.other_producer_id), b)
            .await
            .unwrap()
            .is_some());
        assert!(projection
            .list(SaleScope::Producer(9999))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_view_tree() {
        let fx = Fixture::new().await;
        let sale_id = place(&fx, fx.customer_id, fx.potatoes_kg, fx.kg).await;

        let mut tx = fx.db.begin().await.unwrap();
        VoucherRepository::insert(&mut tx, sale_id, VoucherType::PaymentProof, "p1").await.unwrap();
        VoucherRepository::insert(&mut tx, sale_id, VoucherType::Receipt, "r1").await.unwrap();
        VoucherRepository::insert(&mut tx, sale_id, VoucherType::PaymentProof, "p2").await.unwrap();
        tx.commit().await.unwrap();

        let view = fx
            .db
            .projection()
            .get(SaleScope::Customer(fx.customer_id), sale_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.status, SaleStatus::Requested);
        assert_eq!(view.tax, "3.60");
        assert_eq!(view.unit.name, "kg");
        assert_eq!(view.product.name, "Papa amarilla");
        assert_eq!(view.product.unit, "kg");
        assert_eq!(view.product.stock, 5000);
        assert_eq!(view.product.images, vec!["products/papa-1.jpg"]);
        assert_eq!(view.product.producer.business_name.as_deref(), Some("Andina SAC"));
        assert_eq!(view.customer.first_name, "Rosa");
        assert_eq!(view.vouchers.receipt, vec!["r1"]);
        assert_eq!(view.vouchers.payment_proof, vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn test_list_spans_several_id_batches() {
        let fx = Fixture::new().await;
        let total = MAX_BINDS_PER_QUERY * 2 + 7;

        let mut sale_ids = Vec::with_capacity(total);
        for _ in 0..total {
            sale_ids.push(place(&fx, fx.customer_id, fx.potatoes_kg, fx.kg).await);
        }

        let first = sale_ids[0];
        let last = sale_ids[total - 1];
        let mut tx = fx.db.begin().await.unwrap();
        VoucherRepository::insert(&mut tx, first, VoucherType::Receipt, "r-first").await.unwrap();
        VoucherRepository::insert(&mut tx, last, VoucherType::PaymentProof, "p-last").await.unwrap();
        tx.commit().await.unwrap();

        let views = fx
            .db
            .projection()
            .list(SaleScope::Producer(fx.producer_id))
            .await
            .unwrap();

        assert_eq!(views.len(), total);
        let by_id: HashMap<i64, &SaleView> = views.iter().map(|v| (v.sale_id, v)).collect();
        assert_eq!(by_id[&first].vouchers.receipt, vec!["r-first"]);
        assert_eq!(by_id[&last].vouchers.payment_proof, vec!["p-last"]);
        assert!(views.iter().all(|v| v.product.images == vec!["products/papa-1.jpg"]));
    }
}
