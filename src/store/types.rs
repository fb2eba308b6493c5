//! Collection names, filters, updates and write outcomes shared by all stores.

use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};

use crate::error::StoreError;

/// Marketplace collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Collection {
    /// Registered users and their roles.
    Users,
    /// Bookable service offerings.
    Events,
    /// Single-service requests against an event.
    Bookings,
    /// Aggregated multi-vendor orders.
    Orders,
    /// Recorded payments.
    Payments,
}

/// Which documents an operation applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document.
    All,
    /// The document with this `_id`.
    Id(ObjectId),
    /// Any document whose `_id` is in the list.
    AnyId(Vec<ObjectId>),
    /// Documents whose fields equal all given values.
    ///
    /// A `Null` value also matches documents missing the field.
    Eq(Vec<(String, Bson)>),
}

impl Filter {
    /// Single-field equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Eq(vec![(field.into(), value.into())])
    }

    /// Render as a query document for the database driver.
    pub fn to_document(&self) -> Document {
        match self {
            Filter::All => Document::new(),
            Filter::Id(id) => doc! { "_id": *id },
            Filter::AnyId(ids) => doc! { "_id": { "$in": ids.clone() } },
            Filter::Eq(pairs) => pairs
                .iter()
                .map(|(field, value)| (field.clone(), value.clone()))
                .collect(),
        }
    }

    /// Whether a document satisfies the filter.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => document.get_object_id("_id").is_ok_and(|found| found == *id),
            Filter::AnyId(ids) => document
                .get_object_id("_id")
                .is_ok_and(|found| ids.contains(&found)),
            Filter::Eq(pairs) => pairs.iter().all(|(field, wanted)| {
                match (document.get(field), wanted) {
                    (None, Bson::Null) => true,
                    (Some(found), wanted) => found == wanted,
                    (None, _) => false,
                }
            }),
        }
    }
}

/// Field modifications for `update_one`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    /// Fields to set.
    pub set: Document,
    /// Fields to remove.
    pub unset: Vec<String>,
}

impl Update {
    /// Render as an update document (`$set` / `$unset`).
    pub fn to_document(&self) -> Document {
        let mut update = Document::new();
        if !self.set.is_empty() {
            update.insert("$set", self.set.clone());
        }
        if !self.unset.is_empty() {
            let fields: Document = self
                .unset
                .iter()
                .map(|field| (field.clone(), Bson::Int32(1)))
                .collect();
            update.insert("$unset", fields);
        }
        update
    }

    /// Apply in place, returning whether the document changed.
    pub fn apply(&self, document: &mut Document) -> bool {
        let mut changed = false;
        for (field, value) in &self.set {
            if document.get(field) != Some(value) {
                document.insert(field.clone(), value.clone());
                changed = true;
            }
        }
        for field in &self.unset {
            changed |= document.remove(field).is_some();
        }
        changed
    }
}

/// Result of `insert_one`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    /// Write acknowledged by the store.
    pub acknowledged: bool,
    /// `_id` of the new document.
    pub inserted_id: Value,
}

/// Result of `update_one`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    /// Write acknowledged by the store.
    pub acknowledged: bool,
    /// Documents matched by the filter.
    pub matched_count: u64,
    /// Documents actually changed.
    pub modified_count: u64,
    /// Always 0; upserts are never requested.
    pub upserted_count: u64,
    /// Always null.
    pub upserted_id: Option<Value>,
}

/// Result of `delete_one` / `delete_many`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    /// Write acknowledged by the store.
    pub acknowledged: bool,
    /// Documents removed.
    pub deleted_count: u64,
}

/// Keep only the listed top-level fields.
pub fn project(document: Document, fields: &[&str]) -> Document {
    document
        .into_iter()
        .filter(|(key, _)| fields.contains(&key.as_str()))
        .collect()
}

/// Projection document (`{field: 1, ...}`) for the driver.
pub fn projection_document(fields: &[&str]) -> Document {
    fields.iter().map(|field| (field.to_string(), Bson::Int32(1))).collect()
}

/// Turn a JSON request body into a document.
pub fn document_from_json(value: Value) -> Result<Document, StoreError> {
    if !value.is_object() {
        return Err(StoreError::NotAnObject);
    }
    Ok(mongodb::bson::to_document(&value)?)
}

/// Render a document as JSON the way API clients expect it.
pub fn document_to_json(document: Document) -> Value {
    Value::Object(
        document
            .into_iter()
            .map(|(key, value)| (key, bson_to_json(value)))
            .collect(),
    )
}

/// Render a BSON value as plain JSON.
///
/// ObjectIds become hex strings and dates RFC 3339 strings instead of the
/// extended-JSON `{"$oid": ...}` wrappers.
pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => Value::from(dt.timestamp_millis()),
        },
        Bson::Int32(n) => Value::from(n),
        Bson::Int64(n) => Value::from(n),
        Bson::Document(document) => document_to_json(document),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

/// Parse a hex ObjectId.
pub fn parse_object_id(raw: &str) -> Option<ObjectId> {
    ObjectId::parse_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn collection_names_are_lowercase() {
        assert_eq!(Collection::Users.as_ref(), "users");
        assert_eq!(Collection::Payments.to_string(), "payments");
    }

    #[test]
    fn null_equality_matches_missing_field() {
        let filter = Filter::Eq(vec![
            ("email".to_string(), Bson::String("a@b.c".to_string())),
            ("orderDate".to_string(), Bson::Null),
        ]);
        assert!(filter.matches(&doc! { "email": "a@b.c" }));
        assert!(filter.matches(&doc! { "email": "a@b.c", "orderDate": Bson::Null }));
        assert!(!filter.matches(&doc! { "email": "a@b.c", "orderDate": "2024-01-01" }));
    }

    #[test]
    fn id_filters_match_by_object_id() {
        let id = ObjectId::new();
        let other = ObjectId::new();
        let document = doc! { "_id": id };
        assert!(Filter::Id(id).matches(&document));
        assert!(!Filter::Id(other).matches(&document));
        assert!(Filter::AnyId(vec![other, id]).matches(&document));
        assert!(!Filter::AnyId(vec![]).matches(&document));
    }

    #[test]
    fn filter_renders_in_query() {
        let id = ObjectId::new();
        assert_eq!(
            Filter::AnyId(vec![id]).to_document(),
            doc! { "_id": { "$in": [id] } }
        );
        assert_eq!(Filter::eq("email", "x").to_document(), doc! { "email": "x" });
        assert_eq!(Filter::All.to_document(), Document::new());
    }

    #[test]
    fn update_sets_and_unsets() {
        let update = Update {
            set: doc! { "role": "admin" },
            unset: vec!["hotelType".to_string(), "catererType".to_string()],
        };
        assert_eq!(
            update.to_document(),
            doc! { "$set": { "role": "admin" }, "$unset": { "hotelType": 1, "catererType": 1 } }
        );

        let mut user = doc! { "email": "a@b.c", "hotelType": "luxury" };
        assert!(update.apply(&mut user));
        assert_eq!(user, doc! { "email": "a@b.c", "role": "admin" });
        assert!(!update.apply(&mut user));
    }

    #[test]
    fn projection_keeps_listed_fields() {
        let id = ObjectId::new();
        let event = doc! { "_id": id, "eventName": "Gala", "secret": true };
        assert_eq!(project(event, &["_id", "eventName"]), doc! { "_id": id, "eventName": "Gala" });
    }

    #[test]
    fn documents_render_as_plain_json() {
        let id = ObjectId::new();
        let document = doc! {
            "_id": id,
            "fee": 12.5,
            "guests": 40_i32,
            "tags": ["a", "b"],
            "nested": { "ref": id },
        };
        assert_eq!(
            document_to_json(document),
            json!({
                "_id": id.to_hex(),
                "fee": 12.5,
                "guests": 40,
                "tags": ["a", "b"],
                "nested": { "ref": id.to_hex() },
            })
        );
    }

    #[test]
    fn json_body_must_be_an_object() {
        assert!(matches!(
            document_from_json(json!([1, 2])),
            Err(StoreError::NotAnObject)
        ));
        let document = document_from_json(json!({ "email": "a@b.c", "total": 10 })).unwrap();
        assert_eq!(document.get_str("email").unwrap(), "a@b.c");
    }
}
