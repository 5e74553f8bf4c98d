//! Shared helpers for integration tests.

use litekit::prelude::*;

/// Opens a fresh in-memory database.
pub async fn fresh_db() -> Database {
    Database::connect_in_memory()
        .await
        .expect("Failed to open in-memory database")
}

/// Creates `people` as `[id, name, age, note]` and inserts three rows.
pub async fn seeded_people(db: &Database) {
    db.new_table("people")
        .primary_key("id", true)
        .text_column("name", "NN")
        .int_column("age", "")
        .text_column("note", "")
        .create_table()
        .await
        .expect("create people");

    for (name, age, note) in [
        ("Ada", 36i64, "compiler"),
        ("Grace", 85, "navy"),
        ("Edsger", 72, "proofs"),
    ] {
        db.insert_into("people")
            .field("name", name)
            .field("age", age)
            .field("note", note)
            .record()
            .await
            .expect("insert person");
    }
}
