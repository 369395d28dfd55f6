//! Concurrent checkouts against one file-backed database.
//!
//! In-memory databases are single-connection, so these tests use a real
//! file in a temp directory with several pooled connections.

use std::time::Duration;

use tally_core::{CoreError, CustomerDraft, ProductDraft, SaleLine, SaleRequest};
use tally_db::{Database, DbConfig, DbError};
use tempfile::TempDir;

async fn file_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let config = DbConfig::new(dir.path().join("tally.db"))
        .max_connections(8)
        .busy_timeout(Duration::from_secs(10));
    let db = Database::new(config).await.unwrap();
    (dir, db)
}

async fn product(db: &Database, barcode: &str, stock: i64) -> String {
    db.products()
        .insert(
            &ProductDraft {
                name: format!("Item {barcode}"),
                barcode: Some(barcode.to_string()),
                price_cents: 999,
                cost_cents: None,
            },
            stock,
        )
        .await
        .unwrap()
        .id
}

async fn customer(db: &Database) -> String {
    db.customers()
        .insert(&CustomerDraft {
            name: "Ana".to_string(),
            email: None,
            phone: None,
        })
        .await
        .unwrap()
        .id
}

fn one_line(customer_id: &str, product_id: &str, quantity: i64) -> SaleRequest {
    SaleRequest::new(
        Some(customer_id),
        vec![SaleLine {
            product_id: product_id.to_string(),
            quantity,
        }],
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_checkouts_race_for_last_unit() {
    let (_dir, db) = file_db().await;
    let customer_id = customer(&db).await;
    let product_id = product(&db, "123", 1).await;

    let request = one_line(&customer_id, &product_id, 1);
    let first = {
        let db = db.clone();
        let request = request.clone();
        tokio::spawn(async move { db.checkout().commit_sale(&request).await })
    };
    let second = {
        let db = db.clone();
        let request = request.clone();
        tokio::spawn(async move { db.checkout().commit_sale(&request).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];

    let committed = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(DbError::Domain(CoreError::InsufficientStock {
                    available: 0,
                    requested: 1,
                    ..
                }))
            )
        })
        .count();

    assert_eq!(committed, 1, "results: {results:?}");
    assert_eq!(rejected, 1, "results: {results:?}");

    let stock = db.ledger().price_and_stock(&product_id).await.unwrap().stock;
    assert_eq!(stock, 0);
    assert_eq!(db.sales().count().await.unwrap(), 1);
    assert_eq!(db.sales().quantity_sold(&product_id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_checkouts_never_oversell() {
    let (_dir, db) = file_db().await;
    let customer_id = customer(&db).await;
    let product_id = product(&db, "456", 10).await;

    let mut handles = Vec::new();
    for i in 0..12 {
        let db = db.clone();
        let request = one_line(&customer_id, &product_id, 1 + (i % 3));
        handles.push(tokio::spawn(async move {
            db.checkout().commit_sale(&request).await
        }));
    }

    let mut sold = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(sale_id) => {
                let items = db.sales().get_items(&sale_id).await.unwrap();
                sold += items[0].quantity;
            }
            Err(DbError::Domain(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    let stock = db.ledger().price_and_stock(&product_id).await.unwrap().stock;
    assert!(stock >= 0);
    assert_eq!(stock, 10 - sold);
    assert_eq!(db.sales().quantity_sold(&product_id).await.unwrap(), sold);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_checkout_conserves_stock() {
    let (_dir, db) = file_db().await;
    let customer_id = customer(&db).await;
    let product_id = product(&db, "789", 3).await;

    let first = db
        .checkout()
        .commit_sale(&one_line(&customer_id, &product_id, 3))
        .await
        .unwrap();

    let delete = {
        let db = db.clone();
        tokio::spawn(async move { db.checkout().delete_sale(&first).await })
    };
    let commit = {
        let db = db.clone();
        let request = one_line(&customer_id, &product_id, 2);
        tokio::spawn(async move { db.checkout().commit_sale(&request).await })
    };

    let restored = delete.await.unwrap().unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].quantity, 3);

    // The commit either ran before the delete (no stock) or after it.
    let committed = commit.await.unwrap().is_ok();
    let stock = db.ledger().price_and_stock(&product_id).await.unwrap().stock;
    let sold = db.sales().quantity_sold(&product_id).await.unwrap();

    assert_eq!(stock + sold, 3);
    assert_eq!(sold, if committed { 2 } else { 0 });
}
