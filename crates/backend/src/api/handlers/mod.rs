use axum::http::StatusCode;

use crate::shared::error::ServiceError;

pub mod a001_customer_group;
pub mod a002_price_list;

/// Маппинг ошибки сервисного слоя в HTTP-статус
pub(crate) fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
