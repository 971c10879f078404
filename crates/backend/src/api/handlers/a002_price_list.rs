use axum::{
    extract::{Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use contracts::domain::a002_price_list::aggregate::{
    CustomerGroupRef, PriceList, PriceListDto, PriceListId, PriceListUpdate,
};
use contracts::domain::a003_price_record::aggregate::{PriceRecordDto, PriceRecordId};
use contracts::domain::common::AggregateId;
use contracts::enums::price_list_status::PriceListStatus;

use super::status_for;
use crate::domain::a002_price_list::service::{self, Pagination, PriceListFilter, RetrieveConfig};
use crate::shared::data::db::get_connection;

#[derive(Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub status: Option<String>,
    pub customer_group_id: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(serde::Serialize)]
pub struct ListResponse {
    pub items: Vec<PriceList>,
    pub total_count: u64,
}

fn parse_list_params(params: &ListParams) -> Result<(PriceListFilter, Pagination), StatusCode> {
    let status = match params.status.as_deref() {
        Some(code) => match PriceListStatus::from_code(code) {
            Some(status) => Some(status),
            None => return Err(StatusCode::BAD_REQUEST),
        },
        None => None,
    };

    let mut page = Pagination::default();
    if let Some(limit) = params.limit {
        page.take = limit;
    }
    if let Some(offset) = params.offset {
        page.skip = offset;
    }

    Ok((
        PriceListFilter {
            q: params.q.clone(),
            status,
            customer_group_id: params.customer_group_id.clone(),
        },
        page,
    ))
}

fn parse_id(id: &str) -> Result<PriceListId, StatusCode> {
    PriceListId::from_string(id).map_err(|_| StatusCode::BAD_REQUEST)
}

/// GET /api/price_list
pub async fn list(Query(params): Query<ListParams>) -> Result<Json<Vec<PriceList>>, StatusCode> {
    let (filter, page) = parse_list_params(&params)?;
    match service::list(get_connection(), &filter, &page).await {
        Ok(items) => Ok(Json(items)),
        Err(e) => {
            tracing::error!("Failed to list price lists: {}", e);
            Err(status_for(&e))
        }
    }
}

/// GET /api/price_list/list
pub async fn list_paginated(
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, StatusCode> {
    let (filter, page) = parse_list_params(&params)?;
    match service::list_and_count(get_connection(), &filter, &page).await {
        Ok((items, total_count)) => Ok(Json(ListResponse { items, total_count })),
        Err(e) => {
            tracing::error!("Failed to list price lists: {}", e);
            Err(status_for(&e))
        }
    }
}

#[derive(Deserialize)]
pub struct RetrieveParams {
    /// Развернуть ценовые записи (по умолчанию — да)
    pub prices: Option<bool>,
    /// Развернуть группы покупателей (по умолчанию — да)
    pub customer_groups: Option<bool>,
}

/// GET /api/price_list/:id
pub async fn get_by_id(
    Path(id): Path<String>,
    Query(params): Query<RetrieveParams>,
) -> Result<Json<PriceList>, StatusCode> {
    let id = parse_id(&id)?;
    let config = RetrieveConfig {
        include_prices: params.prices.unwrap_or(true),
        include_customer_groups: params.customer_groups.unwrap_or(true),
    };
    match service::retrieve(get_connection(), &id, &config).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => {
            tracing::error!("Failed to get price list: {}", e);
            Err(status_for(&e))
        }
    }
}

/// POST /api/price_list
pub async fn create(Json(dto): Json<PriceListDto>) -> Result<Json<PriceList>, StatusCode> {
    match service::create(get_connection(), dto).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => {
            tracing::error!("Failed to create price list: {}", e);
            Err(status_for(&e))
        }
    }
}

/// PUT /api/price_list/:id
pub async fn update(
    Path(id): Path<String>,
    Json(patch): Json<PriceListUpdate>,
) -> Result<Json<PriceList>, StatusCode> {
    let id = parse_id(&id)?;
    match service::update(get_connection(), &id, patch).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => {
            tracing::error!("Failed to update price list: {}", e);
            Err(status_for(&e))
        }
    }
}

/// DELETE /api/price_list/:id
pub async fn delete(Path(id): Path<String>) -> Result<(), StatusCode> {
    let id = parse_id(&id)?;
    match service::delete(get_connection(), &id).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Failed to delete price list: {}", e);
            Err(status_for(&e))
        }
    }
}

#[derive(Deserialize)]
pub struct AddPricesBody {
    pub prices: Vec<PriceRecordDto>,
    pub replace: Option<bool>,
}

/// POST /api/price_list/:id/prices
pub async fn add_prices(
    Path(id): Path<String>,
    Json(body): Json<AddPricesBody>,
) -> Result<Json<PriceList>, StatusCode> {
    let id = parse_id(&id)?;
    let replace = body.replace.unwrap_or(false);
    match service::add_prices(get_connection(), &id, &body.prices, replace).await {
        Ok(list) => Ok(Json(list)),
        Err(e) => {
            tracing::error!("Failed to add prices to price list: {}", e);
            Err(status_for(&e))
        }
    }
}

#[derive(Deserialize)]
pub struct DeletePricesBody {
    pub price_ids: Vec<String>,
}

/// DELETE /api/price_list/:id/prices
pub async fn delete_prices(
    Path(id): Path<String>,
    Json(body): Json<DeletePricesBody>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let id = parse_id(&id)?;
    // Нечитаемые идентификаторы приравниваются к не найденным: молча игнорируются
    let price_ids: Vec<PriceRecordId> = body
        .price_ids
        .iter()
        .filter_map(|raw| PriceRecordId::from_string(raw).ok())
        .collect();
    match service::delete_prices(get_connection(), &id, &price_ids).await {
        Ok(deleted) => Ok(Json(json!({ "deleted": deleted }))),
        Err(e) => {
            tracing::error!("Failed to delete prices from price list: {}", e);
            Err(status_for(&e))
        }
    }
}

#[derive(Deserialize)]
pub struct CustomerGroupsBody {
    pub customer_groups: Vec<CustomerGroupRef>,
}

/// POST /api/price_list/:id/customer_groups
pub async fn upsert_customer_groups(
    Path(id): Path<String>,
    Json(body): Json<CustomerGroupsBody>,
) -> Result<(), StatusCode> {
    let id = parse_id(&id)?;
    match service::upsert_customer_groups(get_connection(), &id, &body.customer_groups).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::error!("Failed to set customer groups for price list: {}", e);
            Err(status_for(&e))
        }
    }
}
