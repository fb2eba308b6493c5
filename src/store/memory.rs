//! In-process document store.
//!
//! Used for local development (`--memory`) and by the router tests. It keeps
//! the same filter, projection and update semantics as the database backend
//! so handlers behave identically on both.

use async_trait::async_trait;
use dashmap::DashMap;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use tracing::debug;

use crate::error::StoreError;

use super::types::{
    bson_to_json, project, Collection, DeleteOutcome, Filter, InsertOutcome, Update, UpdateOutcome,
};
use super::Store;

/// Store keeping every collection in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Documents per collection, in insertion order.
    collections: DashMap<Collection, Vec<Document>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .get(&collection)
            .map_or(0, |documents| documents.len())
    }

    /// Whether a collection holds no documents.
    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

fn shape(document: &Document, projection: Option<&[&str]>) -> Document {
    match projection {
        Some(fields) => project(document.clone(), fields),
        None => document.clone(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>, StoreError> {
        let Some(documents) = self.collections.get(&collection) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .iter()
            .filter(|document| filter.matches(document))
            .map(|document| shape(document, projection))
            .collect())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
        projection: Option<&[&str]>,
    ) -> Result<Option<Document>, StoreError> {
        let Some(documents) = self.collections.get(&collection) else {
            return Ok(None);
        };
        Ok(documents
            .iter()
            .find(|document| filter.matches(document))
            .map(|document| shape(document, projection)))
    }

    async fn insert_one(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let id = match document.get("_id").cloned() {
            Some(id) => id,
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                let mut with_id = Document::new();
                with_id.insert("_id", id.clone());
                for (key, value) in document {
                    with_id.insert(key, value);
                }
                document = with_id;
                id
            }
        };

        self.collections
            .entry(collection)
            .or_default()
            .push(document);
        debug!(%collection, "Inserted document");

        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: bson_to_json(id),
        })
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        update: Update,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut matched_count = 0;
        let mut modified_count = 0;

        if let Some(mut documents) = self.collections.get_mut(&collection) {
            if let Some(document) = documents.iter_mut().find(|document| filter.matches(document)) {
                matched_count = 1;
                if update.apply(document) {
                    modified_count = 1;
                }
            }
        }

        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        })
    }

    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut deleted_count = 0;

        if let Some(mut documents) = self.collections.get_mut(&collection) {
            if let Some(index) = documents.iter().position(|document| filter.matches(document)) {
                documents.remove(index);
                deleted_count = 1;
            }
        }

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut deleted_count = 0;

        if let Some(mut documents) = self.collections.get_mut(&collection) {
            let before = documents.len();
            documents.retain(|document| !filter.matches(document));
            deleted_count = (before - documents.len()) as u64;
        }

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn insert_assigns_object_id_first() {
        let store = MemoryStore::new();
        let outcome = store
            .insert_one(Collection::Events, doc! { "eventName": "Wedding" })
            .await
            .unwrap();

        let events = store.find(Collection::Events, Filter::All, None).await.unwrap();
        assert_eq!(events.len(), 1);
        let id = events[0].get_object_id("_id").unwrap();
        assert_eq!(events[0].keys().next().map(String::as_str), Some("_id"));
        assert_eq!(outcome.inserted_id, serde_json::Value::String(id.to_hex()));
    }

    #[tokio::test]
    async fn insert_keeps_supplied_id() {
        let store = MemoryStore::new();
        let outcome = store
            .insert_one(Collection::Users, doc! { "_id": "custom", "email": "a@b.c" })
            .await
            .unwrap();
        assert_eq!(outcome.inserted_id, serde_json::json!("custom"));
    }

    #[tokio::test]
    async fn find_applies_filter_and_projection() {
        let store = MemoryStore::new();
        for email in ["a@b.c", "x@y.z", "a@b.c"] {
            store
                .insert_one(Collection::Bookings, doc! { "email": email, "note": "n" })
                .await
                .unwrap();
        }

        let found = store
            .find(
                Collection::Bookings,
                Filter::eq("email", "a@b.c"),
                Some(&["email"][..]),
            )
            .await
            .unwrap();
        assert_eq!(found, vec![doc! { "email": "a@b.c" }, doc! { "email": "a@b.c" }]);
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let store = MemoryStore::new();
        let id = ObjectId::new();
        store
            .insert_one(Collection::Users, doc! { "_id": id, "role": "user" })
            .await
            .unwrap();

        let update = Update {
            set: doc! { "role": "admin" },
            unset: Vec::new(),
        };
        let first = store
            .update_one(Collection::Users, Filter::Id(id), update.clone())
            .await
            .unwrap();
        assert_eq!((first.matched_count, first.modified_count), (1, 1));

        let second = store
            .update_one(Collection::Users, Filter::Id(id), update.clone())
            .await
            .unwrap();
        assert_eq!((second.matched_count, second.modified_count), (1, 0));

        let missing = store
            .update_one(Collection::Users, Filter::Id(ObjectId::new()), update)
            .await
            .unwrap();
        assert_eq!((missing.matched_count, missing.modified_count), (0, 0));
    }

    #[tokio::test]
    async fn delete_one_and_many() {
        let store = MemoryStore::new();
        let ids: Vec<ObjectId> = (0..3).map(|_| ObjectId::new()).collect();
        for id in &ids {
            store
                .insert_one(Collection::Orders, doc! { "_id": *id })
                .await
                .unwrap();
        }

        let one = store
            .delete_one(Collection::Orders, Filter::Id(ids[0]))
            .await
            .unwrap();
        assert_eq!(one.deleted_count, 1);

        let many = store
            .delete_many(Collection::Orders, Filter::AnyId(ids.clone()))
            .await
            .unwrap();
        assert_eq!(many.deleted_count, 2);
        assert!(store.is_empty(Collection::Orders));
    }

    #[tokio::test]
    async fn unknown_collection_reads_as_empty() {
        let store = MemoryStore::new();
        assert!(store
            .find_one(Collection::Payments, Filter::All, None)
            .await
            .unwrap()
            .is_none());
        let deleted = store
            .delete_many(Collection::Payments, Filter::All)
            .await
            .unwrap();
        assert_eq!(deleted.deleted_count, 0);
    }
}
