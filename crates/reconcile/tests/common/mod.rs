#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value as JsonValue;

use stockroom_core::{BaseProductId, ExpectedVersion, VariantId};
use stockroom_infra::{
    Collection, CollectionGateway, Document, GatewayError, GroupCount, InMemoryCollectionGateway,
};
use stockroom_products::{BaseProduct, Variant};

pub fn bp(id: &str) -> BaseProductId {
    BaseProductId::parse(id).unwrap()
}

pub fn vid(id: &str) -> VariantId {
    VariantId::parse(id).unwrap()
}

pub fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// In-memory catalog with deterministic timestamps.
pub struct Catalog {
    pub gateway: Arc<InMemoryCollectionGateway>,
    clock: Mutex<i64>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            gateway: Arc::new(InMemoryCollectionGateway::new()),
            clock: Mutex::new(0),
        }
    }

    fn tick(&self) -> chrono::DateTime<Utc> {
        let mut minute = self.clock.lock().unwrap();
        *minute += 1;
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(*minute)
    }

    pub fn base(&self, id: &str, name: &str) -> &Self {
        let product = BaseProduct::new(bp(id), name, self.tick()).with_brand("Lala");
        self.gateway.insert(Collection::BaseProducts, &product).unwrap();
        self
    }

    pub fn variant(&self, id: &str, base: &str, ean: &str) -> &Self {
        let variant = Variant::new(vid(id), bp(base), format!("{id} 1 L"), self.tick())
            .with_ean(ean)
            .with_flavor("natural")
            .with_size("1 L");
        self.gateway.insert(Collection::Variants, &variant).unwrap();
        self
    }

    /// Seed a document as-is, bypassing the typed models.
    pub fn raw(&self, collection: Collection, document: JsonValue) -> &Self {
        self.gateway.insert(collection, &document).unwrap();
        self
    }

    pub fn documents(&self) -> (Vec<Document>, Vec<Document>) {
        (
            self.gateway.snapshot(Collection::BaseProducts),
            self.gateway.snapshot(Collection::Variants),
        )
    }
}

type Hook = Box<dyn FnOnce(&InMemoryCollectionGateway) + Send>;

/// Gateway wrapper that injects failures into chosen variant writes.
pub struct FaultyGateway {
    inner: Arc<InMemoryCollectionGateway>,
    conflict_on: HashSet<String>,
    backend_on: HashSet<String>,
    after_first_update: Mutex<Option<Hook>>,
}

impl FaultyGateway {
    pub fn new(inner: Arc<InMemoryCollectionGateway>) -> Self {
        Self {
            inner,
            conflict_on: HashSet::new(),
            backend_on: HashSet::new(),
            after_first_update: Mutex::new(None),
        }
    }

    /// Updates of this document fail as if another writer got there first.
    pub fn conflict_on(mut self, id: &str) -> Self {
        self.conflict_on.insert(id.to_string());
        self
    }

    /// Updates of this document fail as if the backend were unreachable.
    pub fn backend_failure_on(mut self, id: &str) -> Self {
        self.backend_on.insert(id.to_string());
        self
    }

    /// Run `hook` against the inner store right after the first successful update.
    pub fn after_first_update(
        self,
        hook: impl FnOnce(&InMemoryCollectionGateway) + Send + 'static,
    ) -> Self {
        *self.after_first_update.lock().unwrap() = Some(Box::new(hook));
        self
    }
}

#[async_trait]
impl CollectionGateway for FaultyGateway {
    async fn get_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, GatewayError> {
        self.inner.get_by_id(collection, id).await
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, GatewayError> {
        self.inner.find_by_field(collection, field, value).await
    }

    async fn find_many_by_field_in(
        &self,
        collection: Collection,
        field: &str,
        values: &[JsonValue],
    ) -> Result<Vec<Document>, GatewayError> {
        self.inner.find_many_by_field_in(collection, field, values).await
    }

    async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: JsonValue,
        expected_version: ExpectedVersion,
    ) -> Result<u64, GatewayError> {
        if self.backend_on.contains(id) {
            return Err(GatewayError::Backend("connection reset".into()));
        }
        if self.conflict_on.contains(id) {
            return Err(GatewayError::Conflict {
                collection,
                id: id.to_string(),
                detail: "injected".into(),
            });
        }

        let version = self
            .inner
            .update_field(collection, id, field, value, expected_version)
            .await?;

        let hook = self.after_first_update.lock().unwrap().take();
        if let Some(hook) = hook {
            hook(&self.inner);
        }
        Ok(version)
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
        expected_version: ExpectedVersion,
    ) -> Result<(), GatewayError> {
        self.inner.delete_by_id(collection, id, expected_version).await
    }

    async fn count_grouped_by(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<Vec<GroupCount>, GatewayError> {
        self.inner.count_grouped_by(collection, field).await
    }
}
