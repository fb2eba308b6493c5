//! MongoDB-backed store.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Database};
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::metrics;

use super::types::{
    bson_to_json, projection_document, Collection, DeleteOutcome, Filter, InsertOutcome, Update,
    UpdateOutcome,
};
use super::Store;

/// Store backed by a MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoStore {
    /// Driver client (owns the connection pool).
    client: Client,
    /// Database holding the marketplace collections.
    database: Database,
}

impl MongoStore {
    /// Connect using the Stable API v1 in strict mode.
    ///
    /// The driver connects lazily; call [`Store::ping`] to verify reachability.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );
        options.app_name = Some("asta-server".to_string());

        let client = Client::with_options(options)?;
        let database = client.database(database);
        info!("Mongo client created for database {}", database.name());

        Ok(Self { client, database })
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.database.collection(collection.as_ref())
    }
}

#[async_trait]
impl Store for MongoStore {
    #[instrument(skip(self, projection), fields(collection = %collection))]
    async fn find(
        &self,
        collection: Collection,
        filter: Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>, StoreError> {
        let _timer = metrics::timer_store_operation();
        let documents = self.collection(collection);
        let mut find = documents.find(filter.to_document());
        if let Some(fields) = projection {
            find = find.projection(projection_document(fields));
        }
        let found: Vec<Document> = find.await?.try_collect().await?;
        debug!("Found {} documents", found.len());
        Ok(found)
    }

    #[instrument(skip(self, projection), fields(collection = %collection))]
    async fn find_one(
        &self,
        collection: Collection,
        filter: Filter,
        projection: Option<&[&str]>,
    ) -> Result<Option<Document>, StoreError> {
        let _timer = metrics::timer_store_operation();
        let documents = self.collection(collection);
        let mut find = documents.find_one(filter.to_document());
        if let Some(fields) = projection {
            find = find.projection(projection_document(fields));
        }
        Ok(find.await?)
    }

    #[instrument(skip(self, document), fields(collection = %collection))]
    async fn insert_one(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<InsertOutcome, StoreError> {
        let _timer = metrics::timer_store_operation();
        let result = self.collection(collection).insert_one(document).await?;
        Ok(InsertOutcome {
            acknowledged: true,
            inserted_id: bson_to_json(result.inserted_id),
        })
    }

    #[instrument(skip(self, update), fields(collection = %collection))]
    async fn update_one(
        &self,
        collection: Collection,
        filter: Filter,
        update: Update,
    ) -> Result<UpdateOutcome, StoreError> {
        let _timer = metrics::timer_store_operation();
        let result = self
            .collection(collection)
            .update_one(filter.to_document(), update.to_document())
            .await?;
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.map(bson_to_json),
        })
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn delete_one(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let _timer = metrics::timer_store_operation();
        let result = self
            .collection(collection)
            .delete_one(filter.to_document())
            .await?;
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn delete_many(
        &self,
        collection: Collection,
        filter: Filter,
    ) -> Result<DeleteOutcome, StoreError> {
        let _timer = metrics::timer_store_operation();
        let result = self
            .collection(collection)
            .delete_many(filter.to_document())
            .await?;
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        debug!("Ping acknowledged");
        Ok(())
    }
}
