//! Document store abstraction over the marketplace collections.
//!
//! - [`MongoStore`]: MongoDB via the official driver
//! - [`MemoryStore`]: in-process collections for local runs and tests

pub mod memory;
pub mod mongo;
pub mod types;

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use types::{Collection, DeleteOutcome, Filter, InsertOutcome, Update, UpdateOutcome};

/// Operations the route handlers need from a document store.
///
/// Every method maps to one database call; there is no multi-document
/// atomicity.
#[async_trait]
pub trait Store: Send + Sync {
    /// All documents matching `filter`, optionally projected to `projection`.
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>, StoreError>;

    /// First document matching `filter`.
    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
        projection: Option<&[&str]>,
    ) -> Result<Option<Document>, StoreError>;

    /// Insert a document, assigning an ObjectId `_id` when absent.
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOutcome, StoreError>;

    /// Modify the first document matching `filter`.
    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        update: Update,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Remove the first document matching `filter`.
    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Remove every document matching `filter`.
    async fn delete_many(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteOutcome, StoreError>;

    /// Round trip to the store to check connectivity.
    async fn ping(&self) -> Result<(), StoreError>;
}
