//! Postgres-backed document gateway.
//!
//! Both collections share one `documents` table keyed by `(collection, id)`,
//! with the document body stored as `jsonb`. Field queries compare
//! `body -> field` as `jsonb`, so stored strings, numbers, and nulls keep
//! their JSON types.
//!
//! ## Error Mapping
//!
//! | SQLx Error | GatewayError |
//! |------------|--------------|
//! | Database | `Backend` |
//! | PoolClosed / Io / Tls / other | `Backend` |
//! | ColumnDecode / Decode | `Decode` |
//!
//! Version predicates that match no row are disambiguated with a follow-up
//! lookup: a missing row is `NotFound`, an existing row is `Conflict`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{instrument, Span};

use stockroom_core::ExpectedVersion;

use super::r#trait::{CollectionGateway, GatewayError};
use super::{Collection, Document, GroupCount, ID_FIELD};

/// Postgres document store.
///
/// `Send + Sync`; all operations go through the SQLx connection pool. Each
/// write is a single statement, so every document write is atomic on its own
/// and nothing spans more than one document.
#[derive(Debug, Clone)]
pub struct PostgresCollectionGateway {
    pool: Arc<PgPool>,
}

impl PostgresCollectionGateway {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Create the `documents` table and its lookup indexes if missing.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), GatewayError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                version BIGINT NOT NULL DEFAULT 1,
                body JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (collection, id)
            )
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS documents_base_product_id_idx
                ON documents (collection, (body -> 'baseProductId'))
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS documents_ean_idx
                ON documents (collection, (body -> 'ean'))
            "#,
        ];

        for sql in statements {
            sqlx::query(sql)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    async fn resolve_missing_write(
        &self,
        collection: Collection,
        id: &str,
        expected_version: ExpectedVersion,
    ) -> GatewayError {
        match self.get_by_id(collection, id).await {
            Ok(Some(doc)) => GatewayError::Conflict {
                collection,
                id: id.to_string(),
                detail: format!("expected {expected_version:?}, found {}", doc.version),
            },
            Ok(None) => GatewayError::NotFound {
                collection,
                id: id.to_string(),
            },
            Err(e) => e,
        }
    }
}

#[async_trait]
impl CollectionGateway for PostgresCollectionGateway {
    #[instrument(skip(self), fields(collection = %collection), err)]
    async fn get_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, GatewayError> {
        let row = sqlx::query(
            r#"
            SELECT id, version, body
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_by_id", e))?;

        row.as_ref().map(document_from_row).transpose()
    }

    #[instrument(
        skip(self, value),
        fields(collection = %collection, rows = tracing::field::Empty),
        err
    )]
    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &JsonValue,
    ) -> Result<Vec<Document>, GatewayError> {
        if field == ID_FIELD {
            return match value.as_str() {
                Some(id) => Ok(self.get_by_id(collection, id).await?.into_iter().collect()),
                None => Ok(vec![]),
            };
        }

        let rows = sqlx::query(
            r#"
            SELECT id, version, body
            FROM documents
            WHERE collection = $1 AND body -> $2 = $3
            ORDER BY id ASC
            "#,
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(Json(value))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_field", e))?;

        Span::current().record("rows", rows.len());
        rows.iter().map(document_from_row).collect()
    }

    #[instrument(skip(self, values), fields(collection = %collection, values = values.len()), err)]
    async fn find_many_by_field_in(
        &self,
        collection: Collection,
        field: &str,
        values: &[JsonValue],
    ) -> Result<Vec<Document>, GatewayError> {
        if values.is_empty() {
            return Ok(vec![]);
        }

        let result = if field == ID_FIELD {
            let ids: Vec<String> = values
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();

            sqlx::query(
                r#"
                SELECT id, version, body
                FROM documents
                WHERE collection = $1 AND id = ANY($2)
                ORDER BY id ASC
                "#,
            )
            .bind(collection.as_str())
            .bind(ids)
            .fetch_all(&*self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                SELECT id, version, body
                FROM documents
                WHERE collection = $1 AND body -> $2 = ANY($3)
                ORDER BY id ASC
                "#,
            )
            .bind(collection.as_str())
            .bind(field)
            .bind(values.to_vec())
            .fetch_all(&*self.pool)
            .await
        };
        let rows = result.map_err(|e| map_sqlx_error("find_many_by_field_in", e))?;

        rows.iter().map(document_from_row).collect()
    }

    #[instrument(skip(self, value), fields(collection = %collection), err)]
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

        let expected = expected_version.as_exact().map(|v| v as i64);

        let row = sqlx::query(
            r#"
            UPDATE documents
            SET body = jsonb_set(body, ARRAY[$3]::text[], $4, true),
                version = version + 1
            WHERE collection = $1
                AND id = $2
                AND ($5::bigint IS NULL OR version = $5)
            RETURNING version
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(field)
        .bind(Json(&value))
        .bind(expected)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_field", e))?;

        match row {
            Some(row) => {
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| GatewayError::Decode(format!("version column: {e}")))?;
                Ok(version as u64)
            }
            None => Err(self
                .resolve_missing_write(collection, id, expected_version)
                .await),
        }
    }

    #[instrument(skip(self), fields(collection = %collection), err)]
    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
        expected_version: ExpectedVersion,
    ) -> Result<(), GatewayError> {
        let expected = expected_version.as_exact().map(|v| v as i64);

        let deleted = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1
                AND id = $2
                AND ($3::bigint IS NULL OR version = $3)
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(expected)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_by_id", e))?
        .rows_affected();

        if deleted == 0 {
            return Err(self
                .resolve_missing_write(collection, id, expected_version)
                .await);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection), err)]
    async fn count_grouped_by(
        &self,
        collection: Collection,
        field: &str,
    ) -> Result<Vec<GroupCount>, GatewayError> {
        let rows = sqlx::query(
            r#"
            SELECT body -> $2 AS value, COUNT(*) AS count
            FROM documents
            WHERE collection = $1
            GROUP BY 1
            "#,
        )
        .bind(collection.as_str())
        .bind(field)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_grouped_by", e))?;

        rows.iter()
            .map(|row| {
                let value: Option<JsonValue> = row
                    .try_get("value")
                    .map_err(|e| GatewayError::Decode(format!("value column: {e}")))?;
                let count: i64 = row
                    .try_get("count")
                    .map_err(|e| GatewayError::Decode(format!("count column: {e}")))?;
                Ok(GroupCount {
                    value: value.unwrap_or(JsonValue::Null),
                    count: count as u64,
                })
            })
            .collect()
    }
}

fn document_from_row(row: &PgRow) -> Result<Document, GatewayError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| GatewayError::Decode(format!("id column: {e}")))?;
    let version: i64 = row
        .try_get("version")
        .map_err(|e| GatewayError::Decode(format!("version column: {e}")))?;
    let body: JsonValue = row
        .try_get("body")
        .map_err(|e| GatewayError::Decode(format!("body column: {e}")))?;

    Ok(Document {
        id,
        version: version as u64,
        body,
    })
}

/// Map SQLx errors to gateway errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> GatewayError {
    match err {
        sqlx::Error::Database(db_err) => GatewayError::Backend(format!(
            "database error in {operation}: {}",
            db_err.message()
        )),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            GatewayError::Decode(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => {
            GatewayError::Backend(format!("connection pool closed in {operation}"))
        }
        other => GatewayError::Backend(format!("{operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(msg: &str) -> Box<dyn std::error::Error + Send + Sync> {
        msg.to_string().into()
    }

    #[test]
    fn sqlx_errors_map_to_gateway_errors() {
        let cases = [
            (
                sqlx::Error::ColumnDecode { index: "body".into(), source: boxed("not json") },
                "decode",
            ),
            (sqlx::Error::Decode(boxed("bad int8")), "decode"),
            (sqlx::Error::PoolClosed, "backend"),
            (sqlx::Error::PoolTimedOut, "backend"),
            (sqlx::Error::Protocol("unexpected message".into()), "backend"),
        ];

        for (err, expected) in cases {
            let mapped = map_sqlx_error("get_by_id", err);
            let kind = match &mapped {
                GatewayError::Decode(_) => "decode",
                GatewayError::Backend(_) => "backend",
                _ => "other",
            };
            assert_eq!(kind, expected, "{mapped}");
            assert!(mapped.to_string().contains("get_by_id"), "{mapped}");
        }
    }
}
