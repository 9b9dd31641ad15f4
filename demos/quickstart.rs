//! # Quick Start
//!
//! Connects with `fluentsql.toml` (or the file named by `FLUENTSQL_CONFIG`),
//! creates a small table and walks through the builders:
//! - insert with a generated key
//! - filtered, ordered and paged selects
//! - scalar helpers (count, sum, single value)
//! - an atomic update and a transaction
//!
//! Run with `RUST_LOG=info cargo run --example quickstart`.

use anyhow::Context;
use fluentsql::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, FromRow)]
struct Product {
    id: i32,
    name: String,
    stock: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load().context("loading fluentsql.toml")?;
    let db = FluentSql::new(&config).await?;
    db.health_check().await?;

    let products = db.table("demo_products");
    db.raw(format!(
        "CREATE TABLE IF NOT EXISTS {products} (
            id SERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            stock INTEGER NOT NULL DEFAULT 0,
            price NUMERIC(10, 2) NOT NULL
        )"
    ))
    .execute()
    .await?;

    // 1. Insert
    for (name, stock, price) in [("keyboard", 12, 49.5), ("mouse", 40, 19.99), ("monitor", 3, 219.0)] {
        let id: i32 = db
            .insert("demo_products")
            .set("name", name)
            .set("stock", stock)
            .set("price", price)
            .insert_get_id("id")
            .await?;
        println!("inserted {name} as #{id}");
    }

    // 2. Select
    let low_stock: Vec<Product> = db
        .select(["id", "name", "stock"])
        .from("demo_products")
        .where_op("stock", "<", 20)
        .order_by("stock")
        .get_all_as()
        .await?;
    for product in &low_stock {
        println!("low stock: #{} {} ({})", product.id, product.name, product.stock);
    }

    // 3. Scalars
    let count = db.select(["id"]).from("demo_products").get_count().await?;
    let units = db.select(["stock"]).from("demo_products").get_sum("stock").await?;
    let priciest: Option<String> = db
        .select(["name"])
        .from("demo_products")
        .order_by_desc("price")
        .get_value(None)
        .await?;
    println!("{count} products, {units} units, most expensive: {priciest:?}");

    // 4. Transaction: move stock between two products
    db.transaction(|tx| {
        Box::pin(async move {
            tx.update("demo_products")
                .decrement("stock", 2)
                .where_eq("name", "mouse")
                .execute()
                .await?;
            tx.update("demo_products")
                .increment("stock", 2)
                .where_eq("name", "monitor")
                .execute()
                .await?;
            Ok(())
        })
    })
    .await?;

    let page = db
        .select(["name", "stock", "price"])
        .from("demo_products")
        .order_by("name")
        .set_paging(2)
        .page(1)
        .get_all()
        .await?;
    println!("first page: {}", serde_json::to_string_pretty(&page)?);

    db.raw(format!("DROP TABLE {products}")).execute().await?;
    db.close().await;
    Ok(())
}
