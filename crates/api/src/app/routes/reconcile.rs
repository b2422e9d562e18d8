use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/duplicates", get(find_duplicates))
        .route("/orphans", get(find_orphans))
        .route("/merge/preview", post(preview_merge))
        .route("/merge", post(merge_products))
        .route("/variants/reassign", post(reassign_variants))
        .route("/variants/:id/reassign", post(reassign_variant))
}

pub async fn find_duplicates(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.engine.find_duplicate_eans().await {
        Ok(groups) => Json(groups).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn find_orphans(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.engine.find_orphan_variants().await {
        Ok(orphans) => Json(orphans).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn preview_merge(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::MergeRequest>,
) -> axum::response::Response {
    match services
        .engine
        .preview_merge(&body.target_id, &body.source_ids)
        .await
    {
        Ok(preview) => Json(preview).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

/// Always 200 once the request is well-formed; callers inspect `success`
/// and `errors` in the body.
pub async fn merge_products(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::MergeRequest>,
) -> axum::response::Response {
    match services
        .engine
        .merge_products(&body.target_id, &body.source_ids)
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn reassign_variant(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReassignVariantRequest>,
) -> axum::response::Response {
    match services
        .engine
        .reassign_one(&id, &body.new_base_product_id)
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}

pub async fn reassign_variants(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ReassignVariantsRequest>,
) -> axum::response::Response {
    match services
        .engine
        .reassign_many(&body.variant_ids, &body.new_base_product_id)
        .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => errors::engine_error_to_response(e),
    }
}
