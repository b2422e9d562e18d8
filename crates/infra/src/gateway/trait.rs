use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use stockroom_core::ExpectedVersion;

use super::{Collection, Document, GroupCount};

/// Collection gateway operation error.
///
/// `NotFound` and `Conflict` describe the addressed document and are expected
/// outcomes callers can recover from. `Backend` is an **infrastructure error**
/// (store unreachable, query failure); callers propagate it.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{collection} document {id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("optimistic concurrency check failed on {collection} document {id}: {detail}")]
    Conflict {
        collection: Collection,
        id: String,
        detail: String,
    },

    #[error("document decode failed: {0}")]
    Decode(String),

    #[error("invalid gateway request: {0}")]
    InvalidRequest(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl GatewayError {
    /// True for errors that describe the store itself rather than a document.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, GatewayError::Backend(_) | GatewayError::Decode(_))
    }
}

/// Generic read/write access to the catalog's document collections.
///
/// ## Semantics
///
/// - Ids are opaque strings; the gateway performs no shape validation.
/// - Queries on [`super::ID_FIELD`] address the document identity.
/// - `update_field` writes exactly one top-level field, bumps the document
///   version, and returns the new version. No other field is touched.
/// - `update_field` / `delete_by_id` honor `ExpectedVersion`: a mismatch is
///   `GatewayError::Conflict`, a missing document is `GatewayError::NotFound`.
/// - `count_grouped_by` returns one bucket per distinct value, with `Null`
///   standing for documents where the field is missing.
/// - Each call touches at most one document for writes; there are no
///   multi-document transactions.
#[async_trait]
pub trait CollectionGateway: Send + Sync {
    async fn get_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, GatewayError>;

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, GatewayError>;

    async fn find_many_by_field_in(
        &self,
        collection: Collection,
        field: &str,
        values: &[JsonValue],
    ) -> Result<Vec<Document>, GatewayError>;

    async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: JsonValue,
        expected_version: ExpectedVersion,
    ) -> Result<u64, GatewayError>;

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
        expected_version: ExpectedVersion,
    ) -> Result<(), GatewayError>;

    async fn count_grouped_by(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<Vec<GroupCount>, GatewayError>;
}

#[async_trait]
impl<G> CollectionGateway for Arc<G>
where
    G: CollectionGateway + ?Sized,
{
    async fn get_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, GatewayError> {
        (**self).get_by_id(collection, id).await
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, GatewayError> {
        (**self).find_by_field(collection, field, value).await
    }

    async fn find_many_by_field_in(
        &self,
        collection: Collection,
        field: &str,
        values: &[JsonValue],
    ) -> Result<Vec<Document>, GatewayError> {
        (**self).find_many_by_field_in(collection, field, values).await
    }

    async fn update_field(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        value: JsonValue,
        expected_version: ExpectedVersion,
    ) -> Result<u64, GatewayError> {
        (**self)
            .update_field(collection, id, field, value, expected_version)
            .await
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
        expected_version: ExpectedVersion,
    ) -> Result<(), GatewayError> {
        (**self).delete_by_id(collection, id, expected_version).await
    }

    async fn count_grouped_by(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<Vec<GroupCount>, GatewayError> {
        (**self).count_grouped_by(collection, field).await
    }
}
