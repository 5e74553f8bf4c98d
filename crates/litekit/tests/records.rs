//! Integration tests for the insert/update/delete builders.

mod common;

use common::{fresh_db, seeded_people};
use litekit::prelude::*;

#[tokio::test]
async fn positional_row_insert_maps_by_column_order() {
    let db = fresh_db().await;
    db.new_table("people")
        .primary_key("id", true)
        .text_column("name", "NN")
        .int_column("age", "")
        .text_column("note", "")
        .create_table()
        .await
        .unwrap();

    // Three values for four columns: note stays unset.
    db.insert_into("people")
        .row(vec![
            Value::from(7i64),
            Value::from("Barbara"),
            Value::from(88i64),
        ])
        .record()
        .await
        .unwrap();

    let result = db.select("people").fetch().await.unwrap();
    assert_eq!(result.get(0, "id"), Some(&Value::Integer(7)));
    assert_eq!(result.get(0, "name"), Some(&Value::Text("Barbara".into())));
    assert_eq!(result.get(0, "age"), Some(&Value::Integer(88)));
    assert_eq!(result.get(0, "note"), Some(&Value::Null));
}

#[tokio::test]
async fn named_field_overrides_positional_value() {
    let db = fresh_db().await;
    db.new_table("people")
        .primary_key("id", true)
        .text_column("name", "NN")
        .create_table()
        .await
        .unwrap();

    db.insert_into("people")
        .row(vec![Value::from(1i64), Value::from("Ada")])
        .field("name", "Grace")
        .record()
        .await
        .unwrap();

    let result = db.select("people").fetch().await.unwrap();
    assert_eq!(result.get(0, "name"), Some(&Value::Text("Grace".into())));
}

#[tokio::test]
async fn batch_insert_pads_short_rows_with_null() {
    let db = fresh_db().await;
    db.new_table("people")
        .primary_key("id", true)
        .text_column("name", "NN")
        .int_column("age", "")
        .text_column("note", "")
        .create_table()
        .await
        .unwrap();

    // Full column list per row; a NULL id lets the primary key assign
    // itself, and every short row gets NULL in its trailing columns.
    let inserted = db
        .insert_into("people")
        .rows(vec![
            vec![Value::Null, Value::from("Ada"), Value::from(36i64)],
            vec![Value::Null, Value::from("Grace")],
            vec![
                Value::Null,
                Value::from("Edsger"),
                Value::from(72i64),
                Value::from("proofs"),
            ],
        ])
        .record()
        .await
        .unwrap();
    assert_eq!(inserted, 3);

    let result = db.select("people").sort_by("id", true).fetch().await.unwrap();
    assert_eq!(result.get(0, "note"), Some(&Value::Null));
    assert_eq!(result.get(1, "age"), Some(&Value::Null));
    assert_eq!(result.get(1, "note"), Some(&Value::Null));
    assert_eq!(result.get(2, "note"), Some(&Value::Text("proofs".into())));
}

#[tokio::test]
async fn batch_row_with_excess_values_is_a_data_error() {
    let db = fresh_db().await;
    db.new_table("pair")
        .int_column("a", "")
        .int_column("b", "")
        .create_table()
        .await
        .unwrap();

    let result = db
        .insert_into("pair")
        .rows(vec![
            vec![Value::from(1i64), Value::from(2i64)],
            vec![Value::from(3i64), Value::from(4i64), Value::from(5i64)],
        ])
        .record()
        .await;
    assert!(matches!(result, Err(LiteKitError::Data(_))));

    // Width is validated before anything is sent: no partial batch.
    let rows = db.select("pair").fetch().await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn batch_path_wins_over_singly_staged_fields() {
    let db = fresh_db().await;
    db.new_table("people")
        .primary_key("id", true)
        .text_column("name", "NN")
        .create_table()
        .await
        .unwrap();

    // The staged field is queued separately from the batch and is not sent.
    db.insert_into("people")
        .field("name", "staged-but-unsent")
        .rows(vec![vec![Value::Null, Value::from("from-batch")]])
        .record()
        .await
        .unwrap();

    let result = db.select("people").fetch().await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(
        result.get(0, "name"),
        Some(&Value::Text("from-batch".into()))
    );
}

#[tokio::test]
async fn insert_with_nothing_staged_inserts_nothing() {
    let db = fresh_db().await;
    seeded_people(&db).await;

    let inserted = db.insert_into("people").record().await.unwrap();
    assert_eq!(inserted, 0);
    assert_eq!(db.select("people").fetch().await.unwrap().len(), 3);
}

#[tokio::test]
async fn unqualified_update_modifies_every_row() {
    let db = fresh_db().await;
    seeded_people(&db).await;

    let affected = db
        .update("people")
        .field("note", "rewritten")
        .record()
        .await
        .unwrap();
    assert_eq!(affected, 3);

    let result = db.select("people").fetch().await.unwrap();
    for row in 0..3 {
        assert_eq!(
            result.get(row, "note"),
            Some(&Value::Text("rewritten".into()))
        );
    }
}

#[tokio::test]
async fn qualified_update_modifies_matching_rows_only() {
    let db = fresh_db().await;
    seeded_people(&db).await;

    let affected = db
        .update("people")
        .field("age", 37i64)
        .filter("name = ?", vec![Value::from("Ada")])
        .record()
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let result = db
        .select("people")
        .filter("name = ?", vec![Value::from("Grace")])
        .fetch()
        .await
        .unwrap();
    assert_eq!(result.get(0, "age"), Some(&Value::Integer(85)));
}

#[tokio::test]
async fn update_with_no_fields_touches_nothing() {
    let db = fresh_db().await;
    seeded_people(&db).await;

    let affected = db.update("people").record().await.unwrap();
    assert_eq!(affected, 0);
}

#[tokio::test]
async fn unqualified_delete_removes_every_row() {
    let db = fresh_db().await;
    seeded_people(&db).await;

    let removed = db.delete_from("people").execute().await.unwrap();
    assert_eq!(removed, 3);
    assert!(db.select("people").fetch().await.unwrap().is_empty());
}

#[tokio::test]
async fn qualified_delete_removes_matching_rows_only() {
    let db = fresh_db().await;
    seeded_people(&db).await;

    let removed = db
        .delete_from("people")
        .filter("age > ?", vec![Value::from(50i64)])
        .execute()
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let result = db.select("people").fetch().await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result.get(0, "name"), Some(&Value::Text("Ada".into())));
}

#[tokio::test]
async fn insert_into_missing_column_is_an_engine_error() {
    let db = fresh_db().await;
    seeded_people(&db).await;

    let result = db
        .insert_into("people")
        .field("shoe_size", 43i64)
        .record()
        .await;
    assert!(matches!(result, Err(LiteKitError::Database(_))));
}
