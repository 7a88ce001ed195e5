//! Shared marketplace fixture for engine scenario tests.

#![allow(dead_code)]

use std::sync::Arc;

use mercado_core::{CreateSaleRequest, Principal, SaleDetail, SaleStatus, UpdateSaleRequest};
use mercado_db::{Database, DbConfig, NewCustomer, NewProducer, NewProduct};
use mercado_sales::{EngineOptions, MemoryStore, SaleEngine, VoucherStore};

pub const CUSTOMER: Principal = Principal::customer(100);
pub const OTHER_CUSTOMER: Principal = Principal::customer(101);
pub const PRODUCER: Principal = Principal::producer(200);
pub const OTHER_PRODUCER: Principal = Principal::producer(201);

/// Ids of the seeded rows.
#[derive(Debug, Clone, Copy)]
pub struct Seeded {
    pub kg: i64,
    pub tn: i64,
    /// S/ 10.00 per kg, bulk S/ 8.00 from 100 kg, 5000 kg in stock. PRODUCER.
    pub potatoes_kg: i64,
    /// S/ 6.50 per kg, no bulk tier, 100 kg in stock. PRODUCER.
    pub beans_kg: i64,
    /// S/ 2500.00 per tn, 20 tn in stock. OTHER_PRODUCER.
    pub quinoa_tn: i64,
}

pub struct Harness {
    pub engine: SaleEngine,
    pub store: Arc<MemoryStore>,
    pub ids: Seeded,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_options(EngineOptions::default()).await
    }

    pub async fn with_options(options: EngineOptions) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::build(db, options).await
    }

    pub async fn build(db: Database, options: EngineOptions) -> Self {
        let ids = seed(&db).await;
        let store = Arc::new(MemoryStore::new());
        let engine = SaleEngine::new(db, store.clone() as Arc<dyn VoucherStore>, options);
        Harness { engine, store, ids }
    }

    pub fn db(&self) -> &Database {
        self.engine.database()
    }

    /// Places an order as CUSTOMER and returns the sale id.
    pub async fn order(&self, product_id: i64, quantity: i64, unit: &str) -> i64 {
        self.engine
            .create_sale(CUSTOMER, &CreateSaleRequest::new(product_id, quantity, unit))
            .await
            .unwrap()
            .sale_id
    }

    /// Moves a sale to `status` as PRODUCER.
    pub async fn advance(&self, sale_id: i64, status: SaleStatus) {
        self.engine
            .update_sale(PRODUCER, sale_id, &UpdateSaleRequest::status(status))
            .await
            .unwrap();
    }

    pub async fn stock(&self, product_id: i64) -> i64 {
        self.db().products().get_stock(product_id).await.unwrap().unwrap()
    }

    pub async fn detail(&self, sale_id: i64) -> SaleDetail {
        self.db()
            .sales()
            .get_detail_by_sale(sale_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn sale_count(&self) -> i64 {
        self.db().sales().count().await.unwrap()
    }
}

pub async fn seed(db: &Database) -> Seeded {
    let products = db.products();
    let kg = products.ensure_unit("kg").await.unwrap();
    let tn = products.ensure_unit("tn").await.unwrap();

    let parties = db.parties();
    for (user_id, first_name) in [(CUSTOMER.user_id, "Rosa"), (OTHER_CUSTOMER.user_id, "Luis")] {
        parties
            .insert_customer(&NewCustomer {
                user_id,
                first_name: first_name.into(),
                last_name: "Quispe".into(),
                phone: Some("999111222".into()),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let producer = parties
        .insert_producer(&NewProducer {
            user_id: PRODUCER.user_id,
            name: "Cooperativa Andina".into(),
            business_name: Some("Andina SAC".into()),
            document: Some("20123456789".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let other_producer = parties
        .insert_producer(&NewProducer {
            user_id: OTHER_PRODUCER.user_id,
            name: "Granos del Sur".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let potatoes_kg = products
        .insert(&NewProduct {
            producer_id: producer,
            name: "Papa amarilla".into(),
            price_cents: 1000,
            stock: 5000,
            unit_id: kg,
            bulk_threshold: Some(100),
            bulk_price_cents: Some(800),
            ..Default::default()
        })
        .await
        .unwrap();
    products.add_image(potatoes_kg, "products/papa-1.jpg").await.unwrap();
    products.add_image(potatoes_kg, "products/papa-2.jpg").await.unwrap();

    let beans_kg = products
        .insert(&NewProduct {
            producer_id: producer,
            name: "Frijol canario".into(),
            price_cents: 650,
            stock: 100,
            unit_id: kg,
            ..Default::default()
        })
        .await
        .unwrap();

    let quinoa_tn = products
        .insert(&NewProduct {
            producer_id: other_producer,
            name: "Quinua blanca".into(),
            price_cents: 250_000,
            stock: 20,
            unit_id: tn,
            ..Default::default()
        })
        .await
        .unwrap();

    Seeded {
        kg,
        tn,
        potatoes_kg,
        beans_kg,
        quinoa_tn,
    }
}
