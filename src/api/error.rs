use crate::application::circulation::CirculationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(CirculationError);

impl From<CirculationError> for ApiError {
    fn from(err: CirculationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 400 Bad Request - 入力が不正
            CirculationError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),

            // 404 Not Found - リクエストされたリソースが存在しない
            CirculationError::RequestNotFound(id) => (
                StatusCode::NOT_FOUND,
                "REQUEST_NOT_FOUND",
                format!("Request {} not found", id),
            ),
            CirculationError::LoanNotFound(id) => (
                StatusCode::NOT_FOUND,
                "LOAN_NOT_FOUND",
                format!("No open loan {}", id),
            ),

            // 409 Conflict - 競合する操作に負けた
            CirculationError::BookUnavailable { book_id, status } => (
                StatusCode::CONFLICT,
                "BOOK_UNAVAILABLE",
                format!("Book {} is not available (status: {})", book_id, status),
            ),

            // 422 Unprocessable Entity - 参照整合性・状態の違反
            CirculationError::MemberNotFound(id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MEMBER_NOT_FOUND",
                format!("Member {} does not exist", id),
            ),
            CirculationError::BookNotFound(id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOOK_NOT_FOUND",
                format!("Book {} does not exist", id),
            ),
            CirculationError::RequestAlreadyDecided { request_id, status } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "REQUEST_ALREADY_DECIDED",
                format!("Request {} is already {}", request_id, status),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            CirculationError::CatalogError(ref e) => {
                tracing::error!("Catalog store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CATALOG_ERROR",
                    "Catalog store error".to_string(),
                )
            }
            CirculationError::LedgerError(ref e) => {
                tracing::error!("Request ledger error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LEDGER_ERROR",
                    "Request ledger error".to_string(),
                )
            }
            CirculationError::LendingError(ref e) => {
                tracing::error!("Lending store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LENDING_ERROR",
                    "Lending store error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
