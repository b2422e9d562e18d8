use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;

use stockroom_core::ExpectedVersion;

use super::r#trait::{CollectionGateway, GatewayError};
use super::{split_id, Collection, Document, GroupCount, ID_FIELD};

type CollectionMap = BTreeMap<String, Document>;

/// In-memory document store.
///
/// Intended for tests/dev and for running the API without a database. Not
/// optimized for performance: field queries scan the whole collection.
#[derive(Debug, Default)]
pub struct InMemoryCollectionGateway {
    collections: RwLock<HashMap<Collection, CollectionMap>>,
}

impl InMemoryCollectionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document from any serializable model carrying a string `id`.
    ///
    /// Replaces an existing document with the same id. New documents start at
    /// version 1.
    pub fn insert<T: Serialize>(
        &self,
        collection: Collection,
        value: &T,
    ) -> Result<Document, GatewayError> {
        let json = serde_json::to_value(value)
            .map_err(|e| GatewayError::InvalidRequest(format!("serialization failed: {e}")))?;
        let (id, body) = split_id(json)?;

        let mut collections = self.write()?;
        let docs = collections.entry(collection).or_default();
        let version = docs.get(&id).map(|d| d.version + 1).unwrap_or(1);
        let doc = Document { id: id.clone(), version, body };
        docs.insert(id, doc.clone());
        Ok(doc)
    }

    /// Number of documents currently stored in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .map(|c| c.get(&collection).map(BTreeMap::len).unwrap_or(0))
            .unwrap_or(0)
    }

    /// Copy of every document in a collection, ordered by id.
    pub fn snapshot(&self, collection: Collection) -> Vec<Document> {
        self.collections
            .read()
            .map(|c| {
                c.get(&collection)
                    .map(|docs| docs.values().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Collection, CollectionMap>>, GatewayError>
    {
        self.collections
            .read()
            .map_err(|_| GatewayError::Backend("lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Collection, CollectionMap>>, GatewayError>
    {
        self.collections
            .write()
            .map_err(|_| GatewayError::Backend("lock poisoned".to_string()))
    }

    fn filter(
        &self,
        collection: Collection,
        predicate: impl Fn(&Document) -> bool,
    ) -> Result<Vec<Document>, GatewayError> {
        let collections = self.read()?;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.values().filter(|d| predicate(d)).cloned().collect())
            .unwrap_or_default())
    }
}

fn check_version(
    collection: Collection,
    doc: &Document,
    expected_version: ExpectedVersion,
) -> Result<(), GatewayError> {
    expected_version
        .check(doc.version)
        .map_err(|e| GatewayError::Conflict {
            collection,
            id: doc.id.clone(),
            detail: e.to_string(),
        })
}

#[async_trait]
impl CollectionGateway for InMemoryCollectionGateway {
    async fn get_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, GatewayError> {
        let collections = self.read()?;
        Ok(collections.get(&collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, GatewayError> {
        self.filter(collection, |d| &d.field(field) == value)
    }

    async fn find_many_by_field_in(
        &self,
        collection: Collection,
        field: &str,
        values: &[JsonValue],
    ) -> Result<Vec<Document>, GatewayError> {
        if values.is_empty() {
            return Ok(vec![]);
        }
        self.filter(collection, |d| values.contains(&d.field(field)))
    }

    async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: JsonValue,
        expected_version: ExpectedVersion,
    ) -> Result<u64, GatewayError> {
        if field == ID_FIELD {
            return Err(GatewayError::InvalidRequest(
                "document identity cannot be updated".to_string(),
            ));
        }

        let mut collections = self.write()?;
        let doc = collections
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| GatewayError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        check_version(collection, doc, expected_version)?;

        let body = doc.body.as_object_mut().ok_or_else(|| {
            GatewayError::Decode(format!("document {id} is not a JSON object"))
        })?;
        body.insert(field.to_string(), value);
        doc.version += 1;

        Ok(doc.version)
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
        expected_version: ExpectedVersion,
    ) -> Result<(), GatewayError> {
        let mut collections = self.write()?;
        let docs = collections
            .get_mut(&collection)
            .ok_or_else(|| GatewayError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        let doc = docs.get(id).ok_or_else(|| GatewayError::NotFound {
            collection,
            id: id.to_string(),
        })?;
        check_version(collection, doc, expected_version)?;

        docs.remove(id);
        Ok(())
    }

    async fn count_grouped_by(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<Vec<GroupCount>, GatewayError> {
        let collections = self.read()?;
        let Some(docs) = collections.get(&collection) else {
            return Ok(vec![]);
        };

        // JSON values are not hashable; group on their canonical text form.
        let mut groups: BTreeMap<String, GroupCount> = BTreeMap::new();
        for doc in docs.values() {
            let value = doc.field(field);
            groups
                .entry(value.to_string())
                .and_modify(|g| g.count += 1)
                .or_insert(GroupCount { value, count: 1 });
        }

        Ok(groups.into_values().collect())
    }
}
