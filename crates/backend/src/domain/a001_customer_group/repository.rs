use chrono::Utc;
use contracts::domain::a001_customer_group::aggregate::{CustomerGroup, CustomerGroupId};
use contracts::domain::common::{AggregateId, BaseAggregate, EntityMetadata};
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a001_customer_group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CustomerGroup {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata {
            created_at: m.created_at.unwrap_or_else(Utc::now),
            updated_at: m.updated_at.unwrap_or_else(Utc::now),
            is_deleted: m.is_deleted,
            version: m.version,
        };
        let id = CustomerGroupId::from_string(&m.id).unwrap_or_else(|_| CustomerGroupId::new_v4());

        CustomerGroup {
            base: BaseAggregate::with_metadata(id, m.name, m.description, metadata),
        }
    }
}

pub async fn get_by_id<C: ConnectionTrait>(
    db: &C,
    id: &CustomerGroupId,
) -> anyhow::Result<Option<CustomerGroup>> {
    let result = Entity::find_by_id(id.as_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

/// Найти группы по набору строковых идентификаторов (для развёртки связей)
pub async fn find_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: &[String],
) -> anyhow::Result<Vec<CustomerGroup>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let items = Entity::find()
        .filter(Column::Id.is_in(ids.iter().cloned()))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    aggregate: &CustomerGroup,
) -> anyhow::Result<CustomerGroupId> {
    let id = aggregate.base.id;
    let active = ActiveModel {
        id: Set(id.as_string()),
        name: Set(aggregate.base.name.clone()),
        description: Set(aggregate.base.description.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(id)
}

pub async fn list_all<C: ConnectionTrait>(db: &C) -> anyhow::Result<Vec<CustomerGroup>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
