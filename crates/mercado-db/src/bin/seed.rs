//! # Seed Data Generator
//!
//! Populates the database with demo marketplace data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p mercado-db --bin seed
//!
//! # Specify database path
//! cargo run -p mercado-db --bin seed -- --db ./data/mercado.db
//! ```
//!
//! ## Generated Data
//! - Units `kg` and `tn`
//! - Two producers (user ids 200, 201) and two customers (user ids 100, 101)
//! - Products priced per kg and per tn, with and without a bulk tier

use std::env;
use tracing_subscriber::EnvFilter;

use mercado_db::{Database, DbConfig, NewCustomer, NewProducer, NewProduct};

/// (name, unit, price_cents, stock, bulk_threshold, bulk_price_cents)
type ProductSeed = (&'static str, &'static str, i64, i64, Option<i64>, Option<i64>);

const PRODUCER_A_PRODUCTS: &[ProductSeed] = &[
    ("Papa amarilla", "kg", 1000, 5000, Some(100), Some(800)),
    ("Papa huayro", "kg", 1200, 3000, Some(500), Some(950)),
    ("Maiz morado", "kg", 650, 2000, None, None),
];

const PRODUCER_B_PRODUCTS: &[ProductSeed] = &[
    ("Quinua blanca", "tn", 250_000, 20, None, None),
    ("Cafe pergamino", "kg", 1800, 800, Some(200), Some(1550)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mercado=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./data/mercado.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mercado Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./data/mercado.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mercado Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!();

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let products = db.products();
    products.ensure_unit("kg").await?;
    products.ensure_unit("tn").await?;
    println!("✓ Units: kg, tn");

    let parties = db.parties();
    for (user_id, first, last) in [(100, "Rosa", "Quispe"), (101, "Luis", "Mamani")] {
        parties
            .insert_customer(&NewCustomer {
                user_id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                phone: Some(format!("9{:08}", user_id)),
                ..Default::default()
            })
            .await?;
    }
    println!("✓ Customers: user ids 100, 101");

    let producer_a = parties
        .insert_producer(&NewProducer {
            user_id: 200,
            name: "Cooperativa Andina".to_string(),
            business_name: Some("Andina SAC".to_string()),
            document: Some("20123456789".to_string()),
            ..Default::default()
        })
        .await?;
    let producer_b = parties
        .insert_producer(&NewProducer {
            user_id: 201,
            name: "Granos del Sur".to_string(),
            ..Default::default()
        })
        .await?;
    println!("✓ Producers: user ids 200, 201");

    let mut generated = 0;
    for (producer_id, seeds) in [(producer_a, PRODUCER_A_PRODUCTS), (producer_b, PRODUCER_B_PRODUCTS)] {
        for (name, unit, price_cents, stock, bulk_threshold, bulk_price_cents) in seeds.iter().copied() {
            let unit_id = products.ensure_unit(unit).await?;
            let id = products
                .insert(&NewProduct {
                    producer_id,
                    name: name.to_string(),
                    price_cents,
                    stock,
                    unit_id,
                    bulk_threshold,
                    bulk_price_cents,
                    ..Default::default()
                })
                .await?;
            let slug = name.to_lowercase().replace(' ', "-");
            products.add_image(id, &format!("products/{slug}-1.jpg")).await?;
            generated += 1;
        }
    }

    println!("✓ Generated {} products", generated);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
