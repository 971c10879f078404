use anyhow::Result;
use contracts::domain::a001_customer_group::aggregate::{CustomerGroup, CustomerGroupId};
use contracts::domain::a002_price_list::aggregate::PriceListId;
use contracts::domain::common::AggregateId;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::a001_customer_group;

/// Ребро связи прайс-лист — группа покупателей (таблица N:N)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a002_price_list_customer_group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub price_list_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub customer_group_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Заменить набор групп списка целиком (полная перезапись, не слияние)
pub async fn replace_groups_txn<C: ConnectionTrait>(
    db: &C,
    list_id: &PriceListId,
    group_ids: &[CustomerGroupId],
) -> Result<()> {
    Entity::delete_many()
        .filter(Column::PriceListId.eq(list_id.as_string()))
        .exec(db)
        .await?;

    let mut seen: Vec<String> = Vec::with_capacity(group_ids.len());
    for group_id in group_ids {
        let key = group_id.as_string();
        if !seen.contains(&key) {
            seen.push(key);
        }
    }

    if seen.is_empty() {
        return Ok(());
    }

    let models: Vec<ActiveModel> = seen
        .into_iter()
        .map(|group_id| ActiveModel {
            price_list_id: Set(list_id.as_string()),
            customer_group_id: Set(group_id),
        })
        .collect();
    Entity::insert_many(models).exec(db).await?;
    Ok(())
}

/// Идентификаторы групп, привязанных к списку
pub async fn group_ids_for_list<C: ConnectionTrait>(
    db: &C,
    list_id: &PriceListId,
) -> Result<Vec<String>> {
    let ids = Entity::find()
        .filter(Column::PriceListId.eq(list_id.as_string()))
        .order_by_asc(Column::CustomerGroupId)
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.customer_group_id)
        .collect();
    Ok(ids)
}

/// Идентификаторы списков, привязанных к группе (для фильтра по связи)
pub async fn list_ids_for_group<C: ConnectionTrait>(
    db: &C,
    group_id: &str,
) -> Result<Vec<String>> {
    let ids = Entity::find()
        .filter(Column::CustomerGroupId.eq(group_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.price_list_id)
        .collect();
    Ok(ids)
}

/// Группы списка, развёрнутые в агрегаты справочника
pub async fn groups_for_list<C: ConnectionTrait>(
    db: &C,
    list_id: &PriceListId,
) -> Result<Vec<CustomerGroup>> {
    let ids = group_ids_for_list(db, list_id).await?;
    a001_customer_group::repository::find_by_ids(db, &ids).await
}
