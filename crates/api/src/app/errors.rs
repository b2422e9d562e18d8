use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_infra::GatewayError;
use stockroom_reconcile::EngineError;

pub fn engine_error_to_response(err: EngineError) -> axum::response::Response {
    match err {
        EngineError::Validation(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        EngineError::TargetNotFound(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("target base product '{id}' not found"),
        ),
        EngineError::Store(e) => gateway_error_to_response(e),
    }
}

fn gateway_error_to_response(err: GatewayError) -> axum::response::Response {
    tracing::error!(error = %err, "store failure");
    match err {
        GatewayError::Backend(msg) => json_error(StatusCode::BAD_GATEWAY, "store_unavailable", msg),
        GatewayError::Conflict { .. } => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        GatewayError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        GatewayError::Decode(_) | GatewayError::InvalidRequest(_) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            err.to_string(),
        ),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::DomainError;

    #[test]
    fn maps_engine_errors_to_status_codes() {
        let validation = EngineError::Validation(DomainError::validation("sourceIds must not be empty"));
        assert_eq!(engine_error_to_response(validation).status(), StatusCode::BAD_REQUEST);

        let missing = EngineError::TargetNotFound("b1".into());
        assert_eq!(engine_error_to_response(missing).status(), StatusCode::NOT_FOUND);

        let down = EngineError::Store(GatewayError::Backend("timeout".into()));
        assert_eq!(engine_error_to_response(down).status(), StatusCode::BAD_GATEWAY);

        let bad_doc = EngineError::Store(GatewayError::Decode("missing fullName".into()));
        assert_eq!(
            engine_error_to_response(bad_doc).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
