use anyhow::Result;
use chrono::Utc;
use contracts::domain::a002_price_list::aggregate::{PriceList, PriceListId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use contracts::enums::price_list_status::PriceListStatus;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use super::group_link;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_price_list")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Произвольные пользовательские поля, сериализованный JSON
    pub custom_fields: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PriceList {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let id = PriceListId::from_string(&m.id).unwrap_or_else(|_| PriceListId::new_v4());

        let custom_fields = m
            .custom_fields
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok());

        PriceList {
            base: BaseAggregate::with_metadata(id, m.name, m.description, metadata),
            status: PriceListStatus::from_code(&m.status).unwrap_or_default(),
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            deleted_at: m.deleted_at,
            custom_fields,
            prices: Vec::new(),
            customer_groups: Vec::new(),
        }
    }
}

fn custom_fields_column(aggregate: &PriceList) -> Result<Option<String>> {
    match &aggregate.custom_fields {
        Some(value) => Ok(Some(serde_json::to_string(value)?)),
        None => Ok(None),
    }
}

/// Найти живой (не удалённый мягко) прайс-лист по идентификатору
pub async fn get_by_id<C: ConnectionTrait>(
    db: &C,
    id: &PriceListId,
) -> Result<Option<PriceList>> {
    let result = Entity::find_by_id(id.as_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert_txn<C: ConnectionTrait>(db: &C, aggregate: &PriceList) -> Result<()> {
    let active = ActiveModel {
        id: Set(aggregate.base.id.as_string()),
        name: Set(aggregate.base.name.clone()),
        description: Set(aggregate.base.description.clone()),
        status: Set(aggregate.status.code().to_string()),
        starts_at: Set(aggregate.starts_at),
        ends_at: Set(aggregate.ends_at),
        deleted_at: Set(aggregate.deleted_at),
        custom_fields: Set(custom_fields_column(aggregate)?),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(())
}

pub async fn update_txn<C: ConnectionTrait>(db: &C, aggregate: &PriceList) -> Result<()> {
    let active = ActiveModel {
        id: Set(aggregate.base.id.as_string()),
        name: Set(aggregate.base.name.clone()),
        description: Set(aggregate.base.description.clone()),
        status: Set(aggregate.status.code().to_string()),
        starts_at: Set(aggregate.starts_at),
        ends_at: Set(aggregate.ends_at),
        deleted_at: Set(aggregate.deleted_at),
        custom_fields: Set(custom_fields_column(aggregate)?),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
        created_at: sea_orm::ActiveValue::NotSet,
    };
    active.update(db).await?;
    Ok(())
}

/// Мягкое удаление. Идемпотентно: отсутствующий или уже удалённый список —
/// не ошибка, возвращается `false`.
pub async fn soft_delete_txn<C: ConnectionTrait>(db: &C, id: &PriceListId) -> Result<bool> {
    use sea_orm::sea_query::Expr;
    let now = Utc::now();
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::DeletedAt, Expr::value(now))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id.as_string()))
        .filter(Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Фильтр списка прайс-листов
#[derive(Debug, Clone, Default)]
pub struct PriceListFilter {
    /// Подстрока в названии или описании
    pub q: Option<String>,
    pub status: Option<PriceListStatus>,
    /// Только списки, привязанные к данной группе покупателей
    pub customer_group_id: Option<String>,
}

/// Параметры страницы
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub skip: u64,
    pub take: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { skip: 0, take: 20 }
    }
}

/// Список прайс-листов с фильтрами, пагинацией и общим количеством
pub async fn list_with_filters<C: ConnectionTrait>(
    db: &C,
    filter: &PriceListFilter,
    page: &Pagination,
) -> Result<(Vec<PriceList>, u64)> {
    let mut query = Entity::find().filter(Column::IsDeleted.eq(false));

    if let Some(status) = filter.status {
        query = query.filter(Column::Status.eq(status.code()));
    }

    if let Some(q) = filter.q.as_deref() {
        if !q.is_empty() {
            query = query.filter(
                Condition::any()
                    .add(Column::Name.contains(q))
                    .add(Column::Description.contains(q)),
            );
        }
    }

    if let Some(group_id) = filter.customer_group_id.as_deref() {
        let list_ids = group_link::list_ids_for_group(db, group_id).await?;
        query = query.filter(Column::Id.is_in(list_ids));
    }

    let total = query.clone().count(db).await?;

    let items = query
        .order_by_asc(Column::Name)
        .offset(page.skip)
        .limit(page.take)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok((items, total))
}
