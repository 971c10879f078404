use anyhow::Result;
use chrono::Utc;
use contracts::domain::a001_customer_group::aggregate::CustomerGroupId;
use contracts::domain::a002_price_list::aggregate::PriceListId;
use contracts::domain::a003_price_record::aggregate::{PriceRecord, PriceRecordDto, PriceRecordId};
use contracts::domain::common::AggregateId;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Select, Set};

/// Модель ценовой записи прайс-листа
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_price_record")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Владеющий прайс-лист
    pub price_list_id: String,

    /// Код валюты (ISO 4217, нижний регистр)
    pub currency_code: String,

    /// Сумма
    pub amount: f64,

    pub customer_group_id: Option<String>,
    pub min_quantity: Option<i32>,
    pub max_quantity: Option<i32>,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for PriceRecord {
    fn from(m: Model) -> Self {
        let id = PriceRecordId::from_string(&m.id).unwrap_or_else(|_| PriceRecordId::new_v4());
        let price_list_id =
            PriceListId::from_string(&m.price_list_id).unwrap_or_else(|_| PriceListId::new_v4());

        PriceRecord {
            id,
            price_list_id,
            currency_code: m.currency_code,
            amount: m.amount,
            customer_group_id: m
                .customer_group_id
                .as_deref()
                .and_then(|s| CustomerGroupId::from_string(s).ok()),
            min_quantity: m.min_quantity,
            max_quantity: m.max_quantity,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Конвертация входных данных в ActiveModel для записи в БД
fn to_active_model(list_id: &PriceListId, dto: &PriceRecordDto) -> ActiveModel {
    let now = Utc::now();
    ActiveModel {
        id: Set(PriceRecordId::new_v4().as_string()),
        price_list_id: Set(list_id.as_string()),
        currency_code: Set(dto.normalized_currency()),
        amount: Set(dto.amount),
        customer_group_id: Set(dto.customer_group_id.clone()),
        min_quantity: Set(dto.min_quantity),
        max_quantity: Set(dto.max_quantity),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Запрос по естественному ключу записи: валюта + область действия
/// (группа покупателей, диапазон количества) внутри одного прайс-листа.
fn natural_key_query(list_id: &PriceListId, dto: &PriceRecordDto) -> Select<Entity> {
    let mut query = Entity::find()
        .filter(Column::PriceListId.eq(list_id.as_string()))
        .filter(Column::CurrencyCode.eq(dto.normalized_currency()));

    query = match &dto.customer_group_id {
        Some(group) => query.filter(Column::CustomerGroupId.eq(group.clone())),
        None => query.filter(Column::CustomerGroupId.is_null()),
    };
    query = match dto.min_quantity {
        Some(min) => query.filter(Column::MinQuantity.eq(min)),
        None => query.filter(Column::MinQuantity.is_null()),
    };
    match dto.max_quantity {
        Some(max) => query.filter(Column::MaxQuantity.eq(max)),
        None => query.filter(Column::MaxQuantity.is_null()),
    }
}

/// Записи прайс-листа в детерминированном порядке (валюта, затем id)
pub async fn find_by_price_list<C: ConnectionTrait>(
    db: &C,
    list_id: &PriceListId,
) -> Result<Vec<PriceRecord>> {
    let items = Entity::find()
        .filter(Column::PriceListId.eq(list_id.as_string()))
        .order_by_asc(Column::CurrencyCode)
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Добавить записи прайс-листа.
///
/// `replace == true` — сначала удаляются все существующие записи списка,
/// затем вставляются новые; выполняется внутри транзакции вызывающего,
/// частичная замена снаружи не наблюдаема.
pub async fn add_prices_txn<C: ConnectionTrait>(
    db: &C,
    list_id: &PriceListId,
    prices: &[PriceRecordDto],
    replace: bool,
) -> Result<()> {
    if replace {
        Entity::delete_many()
            .filter(Column::PriceListId.eq(list_id.as_string()))
            .exec(db)
            .await?;
    }

    if prices.is_empty() {
        return Ok(());
    }

    let models: Vec<ActiveModel> = prices.iter().map(|p| to_active_model(list_id, p)).collect();
    Entity::insert_many(models).exec(db).await?;
    Ok(())
}

/// Слить записи по естественному ключу: существующая запись с тем же
/// ключом получает новую сумму, остальные вставляются.
pub async fn update_prices_txn<C: ConnectionTrait>(
    db: &C,
    list_id: &PriceListId,
    prices: &[PriceRecordDto],
) -> Result<()> {
    for dto in prices {
        let existing = natural_key_query(list_id, dto).one(db).await?;

        if let Some(existing_model) = existing {
            let mut active_model: ActiveModel = existing_model.into();
            active_model.amount = Set(dto.amount);
            active_model.updated_at = Set(Utc::now());
            Entity::update(active_model).exec(db).await?;
        } else {
            let active_model = to_active_model(list_id, dto);
            Entity::insert(active_model).exec(db).await?;
        }
    }

    Ok(())
}

/// Удалить записи по идентификаторам. Удаляются только записи, принадлежащие
/// `list_id`; не найденные и чужие идентификаторы молча игнорируются.
pub async fn delete_prices_txn<C: ConnectionTrait>(
    db: &C,
    list_id: &PriceListId,
    price_ids: &[PriceRecordId],
) -> Result<u64> {
    if price_ids.is_empty() {
        return Ok(0);
    }

    let ids: Vec<String> = price_ids.iter().map(|id| id.as_string()).collect();
    let result = Entity::delete_many()
        .filter(Column::PriceListId.eq(list_id.as_string()))
        .filter(Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
