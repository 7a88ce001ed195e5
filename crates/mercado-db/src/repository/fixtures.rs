//! Shared test data for repository tests.

use crate::repository::party::{NewCustomer, NewProducer};
use crate::repository::product::NewProduct;
use crate::{Database, DbConfig};

pub(crate) const CUSTOMER_USER: i64 = 100;
pub(crate) const OTHER_CUSTOMER_USER: i64 = 101;
pub(crate) const PRODUCER_USER: i64 = 200;
pub(crate) const OTHER_PRODUCER_USER: i64 = 201;

pub(crate) struct Fixture {
    pub db: Database,
    pub kg: i64,
    pub tn: i64,
    pub customer_id: i64,
    pub other_customer_id: i64,
    pub producer_id: i64,
    pub other_producer_id: i64,
    /// S/ 10.00 per kg, bulk S/ 8.00 from 100 kg, 5000 kg in stock.
    pub potatoes_kg: i64,
    /// S/ 2500.00 per tn, no bulk tier, 20 tn in stock; other producer.
    pub quinoa_tn: i64,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let kg = db.products().ensure_unit("kg").await.unwrap();
        let tn = db.products().ensure_unit("tn").await.unwrap();

        let parties = db.parties();
        let customer_id = parties
            .insert_customer(&NewCustomer {
                user_id: CUSTOMER_USER,
                first_name: "Rosa".into(),
                last_name: "Quispe".into(),
                phone: Some("999111222".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let other_customer_id = parties
            .insert_customer(&NewCustomer {
                user_id: OTHER_CUSTOMER_USER,
                first_name: "Luis".into(),
                last_name: "Mamani".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let producer_id = parties
            .insert_producer(&NewProducer {
                user_id: PRODUCER_USER,
                name: "Cooperativa Andina".into(),
                business_name: Some("Andina SAC".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let other_producer_id = parties
            .insert_producer(&NewProducer {
                user_id: OTHER_PRODUCER_USER,
                name: "Granos del Sur".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let potatoes_kg = db
            .products()
            .insert(&NewProduct {
                producer_id,
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
        db.products()
            .add_image(potatoes_kg, "products/papa-1.jpg")
            .await
            .unwrap();

        let quinoa_tn = db
            .products()
            .insert(&NewProduct {
                producer_id: other_producer_id,
                name: "Quinua blanca".into(),
                price_cents: 250_000,
                stock: 20,
                unit_id: tn,
                ..Default::default()
            })
            .await
            .unwrap();

        Fixture {
            db,
            kg,
            tn,
            customer_id,
            other_customer_id,
            producer_id,
            other_producer_id,
            potatoes_kg,
            quinoa_tn,
        }
    }
}
