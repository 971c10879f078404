use axum::{extract::Path, http::StatusCode, Json};

use contracts::domain::a001_customer_group::aggregate::{
    CustomerGroup, CustomerGroupDto, CustomerGroupId,
};
use contracts::domain::common::AggregateId;

use super::status_for;
use crate::domain::a001_customer_group::service;
use crate::shared::data::db::get_connection;

/// GET /api/customer_group
pub async fn list_all() -> Result<Json<Vec<CustomerGroup>>, StatusCode> {
    match service::list_all(get_connection()).await {
        Ok(items) => Ok(Json(items)),
        Err(e) => {
            tracing::error!("Failed to list customer groups: {}", e);
            Err(status_for(&e))
        }
    }
}

/// GET /api/customer_group/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<CustomerGroup>, StatusCode> {
    let id = match CustomerGroupId::from_string(&id) {
        Ok(id) => id,
        Err(_) => return Err(StatusCode::BAD_REQUEST),
    };
    match service::retrieve(get_connection(), &id).await {
        Ok(group) => Ok(Json(group)),
        Err(e) => {
            tracing::error!("Failed to get customer group: {}", e);
            Err(status_for(&e))
        }
    }
}

/// POST /api/customer_group
pub async fn create(Json(dto): Json<CustomerGroupDto>) -> Result<Json<CustomerGroup>, StatusCode> {
    match service::create(get_connection(), dto).await {
        Ok(group) => Ok(Json(group)),
        Err(e) => {
            tracing::error!("Failed to create customer group: {}", e);
            Err(status_for(&e))
        }
    }
}
