//! Integration tests for the Postgres resource store.
//!
//! Exercises the repository through the `ResourceStore` seam:
//! - Insert, get, update, delete by surrogate key
//! - Substring and exact filtering, insertion ordering, paging
//! - Upsert by business key
//! - No uniqueness on the business key

use catalog_core::identifier::derive_id;
use catalog_core::resource::Resource;
use catalog_core::search::{ResourceField, ResourceFilter};
use catalog_core::store::{ResourceStore, StoreError};
use catalog_db::PgResourceStore;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resource(sku: &str, seller: &str) -> Resource {
    Resource {
        surrogate_id: None,
        id: derive_id(sku, seller, "90"),
        sku: sku.to_string(),
        seller: seller.to_string(),
        campaign_code: "90".to_string(),
        product_name: "Bota Mega Boots 6000".to_string(),
        brand: "Mega Boots".to_string(),
        category: "calcados".to_string(),
        subcategory: "calcados-masculinos".to_string(),
        size: "40".to_string(),
        list_price: 200.0,
        price: 150.0,
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn insert_then_get_populates_surrogate_key(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    let key = store.insert(&resource("XPTO1", "dafiti")).await.unwrap();

    let found = store
        .get(&ResourceFilter::by_id("XPTO1-dafiti-90"))
        .await
        .unwrap()
        .expect("resource should exist");
    assert_eq!(found.surrogate_id.as_deref(), Some(key.as_str()));
    assert_eq!(found.brand, "Mega Boots");
    assert_eq!(found.price, 150.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_overwrites_fields(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    let mut input = resource("XPTO1", "dafiti");
    let key = store.insert(&input).await.unwrap();

    input.brand = "Fulano".to_string();
    input.price = 99.9;
    store.update(&key, &input).await.unwrap();

    let found = store
        .get(&ResourceFilter::by_id(&input.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.brand, "Fulano");
    assert_eq!(found.price, 99.9);
}

#[sqlx::test(migrations = "./migrations")]
async fn update_of_missing_row_is_silent(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    store.update("987654", &resource("A", "b")).await.unwrap();
    assert_eq!(store.count(&ResourceFilter::new()).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_removes_row(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    let key = store.insert(&resource("XPTO1", "dafiti")).await.unwrap();
    store.delete(&key).await.unwrap();
    assert!(store
        .get(&ResourceFilter::by_id("XPTO1-dafiti-90"))
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn malformed_key_is_an_error(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    let err = store.delete("not-a-key").await.unwrap_err();
    assert!(matches!(err, StoreError::MalformedKey(_)));
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn list_keeps_insertion_order_and_pages(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    for i in 0..7 {
        store
            .insert(&resource(&format!("SKU{i}"), "dafiti"))
            .await
            .unwrap();
    }

    let page = store.list(&ResourceFilter::new(), 2, Some(3)).await.unwrap();
    let skus: Vec<&str> = page.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU2", "SKU3", "SKU4"]);

    let rest = store.list(&ResourceFilter::new(), 5, None).await.unwrap();
    assert_eq!(rest.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn substring_filter_is_literal_and_case_sensitive(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    store.insert(&resource("XPTO1", "dafiti")).await.unwrap();
    store.insert(&resource("XPTO2", "kanui")).await.unwrap();
    store.insert(&resource("100%", "tricae")).await.unwrap();

    let fit = ResourceFilter::new().contains(ResourceField::Seller, "fit");
    assert_eq!(store.count(&fit).await.unwrap(), 1);

    let upper = ResourceFilter::new().contains(ResourceField::Seller, "FIT");
    assert_eq!(store.count(&upper).await.unwrap(), 0);

    // `%` is not a wildcard.
    let percent = ResourceFilter::new().contains(ResourceField::Sku, "%");
    let found = store.list(&percent, 0, None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].seller, "tricae");
}

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn upsert_inserts_then_updates(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    let mut input = resource("1111", "dafiti");
    store.upsert_by_business_key(&input).await.unwrap();

    input.price = 87.89;
    store.upsert_by_business_key(&input).await.unwrap();

    assert_eq!(store.count(&ResourceFilter::new()).await.unwrap(), 1);
    let found = store
        .get(&ResourceFilter::by_id(&input.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.price, 87.89);
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_upserts_of_one_key_insert_once(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    let first = resource("1111", "dafiti");
    let mut second = first.clone();
    second.price = 87.89;

    let (a, b) = tokio::join!(
        store.upsert_by_business_key(&first),
        store.upsert_by_business_key(&second),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(store.count(&ResourceFilter::by_id(&first.id)).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn business_key_is_not_unique(pool: PgPool) {
    let store = PgResourceStore::new(pool);
    let input = resource("XPTO1", "dafiti");
    store.insert(&input).await.unwrap();
    store.insert(&input).await.unwrap();
    assert_eq!(store.count(&ResourceFilter::by_id(&input.id)).await.unwrap(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn ping_succeeds(pool: PgPool) {
    PgResourceStore::new(pool).ping().await.unwrap();
}
