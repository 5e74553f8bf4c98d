//! Example: Inventory Database
//!
//! Walks through the full surface: table creation, inserts (named,
//! positional, batch), a query with joins and grouping, and the table
//! rebuild path for the column changes SQLite cannot do in place.
//!
//! Run with: cargo run --example inventory -p litekit

use litekit::prelude::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db = Database::connect_in_memory().await?;

    // =========================================================================
    // Schema
    // =========================================================================

    db.new_table("suppliers")
        .primary_key("id", true)
        .text_column("name", "NN UQ")
        .create_table()
        .await?;

    db.new_table("products")
        .primary_key("id", true)
        .text_column("name", "NN")
        .float_column("price", "NN")
        .int_column("stock", "")
        .foreign_key("supplier_id", "suppliers", "id")
        .create_table()
        .await?;

    // =========================================================================
    // Records
    // =========================================================================

    db.insert_into("suppliers").field("name", "Acme").record().await?;
    db.insert_into("suppliers").field("name", "Globex").record().await?;

    // Positional: values follow the table's column order.
    db.insert_into("products")
        .row(vec![
            Value::Null,
            Value::from("Anvil"),
            Value::from(49.5),
            Value::from(12i64),
            Value::from(1i64),
        ])
        .record()
        .await?;

    // Batch: short rows get NULL in their trailing columns.
    db.insert_into("products")
        .rows(vec![
            vec![
                Value::Null,
                Value::from("Rocket skates"),
                Value::from(99.0),
                Value::from(3i64),
                Value::from(1i64),
            ],
            vec![Value::Null, Value::from("Mystery box"), Value::from(5.0)],
        ])
        .record()
        .await?;

    db.update("products")
        .field("stock", 0i64)
        .filter("name = ?", vec![Value::from("Mystery box")])
        .record()
        .await?;

    // =========================================================================
    // Queries
    // =========================================================================

    let stocked = db
        .select("products")
        .fields(&["suppliers.name AS supplier", "products.name", "products.price"])
        .join("suppliers", "suppliers.id = products.supplier_id")
        .filter("products.stock > ?", vec![Value::from(0i64)])
        .sort_by("products.price", false)
        .fetch()
        .await?;
    println!("\nStocked products:\n{stocked}");

    // =========================================================================
    // Rebuild: SQLite cannot ALTER COLUMN or (portably) DROP COLUMN
    // =========================================================================

    db.alter_table("products")
        .modify_column("price", ColumnDef::real("unit_price").not_null())
        .apply()
        .await?;

    db.alter_table("products").remove_column("stock").apply().await?;

    println!("{}", db.schema_report().await?);

    let as_json = db
        .select("products")
        .fields(&["name", "unit_price"])
        .sort_by("name", true)
        .fetch()
        .await?
        .to_json();
    println!("As JSON: {as_json}");

    db.close().await;
    Ok(())
}
