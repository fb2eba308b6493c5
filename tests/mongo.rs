//! Store tests against a live MongoDB deployment.
//!
//! These tests require a MONGODB_URI environment variable and write to a
//! throwaway database.
//! Run with: cargo test --test mongo -- --ignored

use mongodb::bson::{doc, oid::ObjectId};

use asta_server::store::{Collection, Filter, MongoStore, Store, Update};

/// Connect to the test database, or `None` when no URI is configured.
async fn test_store() -> Option<MongoStore> {
    dotenvy::dotenv().ok();

    let uri = std::env::var("MONGODB_URI").ok()?;
    let db_name = format!("asta_test_{}", ObjectId::new().to_hex());
    MongoStore::connect(&uri, &db_name).await.ok()
}

#[tokio::test]
#[ignore = "requires MONGODB_URI"]
async fn test_ping() {
    let Some(store) = test_store().await else {
        println!("Skipping: MONGODB_URI not set or unreachable");
        return;
    };

    let result = store.ping().await;
    assert!(result.is_ok(), "Ping failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires MONGODB_URI"]
async fn test_insert_find_delete() {
    let Some(store) = test_store().await else {
        println!("Skipping: MONGODB_URI not set or unreachable");
        return;
    };

    let inserted = store
        .insert_one(
            Collection::Events,
            doc! { "eventName": "Gala", "eventFee": 500, "internalNote": "x" },
        )
        .await
        .expect("insert");
    assert!(inserted.acknowledged);

    let id = ObjectId::parse_str(inserted.inserted_id.as_str().expect("hex id")).expect("oid");
    let event = store
        .find_one(Collection::Events, Filter::Id(id), Some(&["eventName"][..]))
        .await
        .expect("find")
        .expect("event exists");
    assert_eq!(event.get_str("eventName").unwrap(), "Gala");
    assert!(event.get("internalNote").is_none());

    let deleted = store
        .delete_one(Collection::Events, Filter::Id(id))
        .await
        .expect("delete");
    assert_eq!(deleted.deleted_count, 1);
}

#[tokio::test]
#[ignore = "requires MONGODB_URI"]
async fn test_update_and_delete_many() {
    let Some(store) = test_store().await else {
        println!("Skipping: MONGODB_URI not set or unreachable");
        return;
    };

    let user = store
        .insert_one(
            Collection::Users,
            doc! { "email": "vendor@asta.io", "role": "hotel", "hotelType": "luxury" },
        )
        .await
        .expect("insert user");
    let id = ObjectId::parse_str(user.inserted_id.as_str().expect("hex id")).expect("oid");

    let outcome = store
        .update_one(
            Collection::Users,
            Filter::Id(id),
            Update {
                set: doc! { "role": "admin" },
                unset: vec!["hotelType".to_string()],
            },
        )
        .await
        .expect("update");
    assert_eq!(outcome.matched_count, 1);
    assert_eq!(outcome.modified_count, 1);

    let mut ids = Vec::new();
    for date in ["2024-05-01", "2024-05-02"] {
        let order = store
            .insert_one(Collection::Orders, doc! { "email": "a@b.c", "orderDate": date })
            .await
            .expect("insert order");
        ids.push(ObjectId::parse_str(order.inserted_id.as_str().expect("hex id")).expect("oid"));
    }

    let deleted = store
        .delete_many(Collection::Orders, Filter::AnyId(ids))
        .await
        .expect("delete many");
    assert_eq!(deleted.deleted_count, 2);

    store
        .delete_one(Collection::Users, Filter::Id(id))
        .await
        .expect("cleanup");
}
