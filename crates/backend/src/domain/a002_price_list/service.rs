use contracts::domain::a001_customer_group::aggregate::CustomerGroupId;
use contracts::domain::a002_price_list::aggregate::{
    CustomerGroupRef, PriceList, PriceListDto, PriceListId, PriceListUpdate,
};
use contracts::domain::a003_price_record::aggregate::{PriceRecordDto, PriceRecordId};
use contracts::domain::common::AggregateId;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};

use super::{group_link, repository};
use crate::domain::a001_customer_group;
use crate::domain::a003_price_record;
use crate::shared::error::{ServiceError, ServiceResult};

pub use repository::{PriceListFilter, Pagination};

/// Какие связи развернуть при чтении прайс-листа
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrieveConfig {
    pub include_prices: bool,
    pub include_customer_groups: bool,
}

impl RetrieveConfig {
    /// Полная развёртка: цены + группы покупателей
    pub fn expanded() -> Self {
        Self {
            include_prices: true,
            include_customer_groups: true,
        }
    }
}

/// Получить прайс-лист по идентификатору.
/// Мягко удалённые списки не видны; отсутствие — ошибка NotFound.
pub async fn retrieve(
    db: &DatabaseConnection,
    id: &PriceListId,
    config: &RetrieveConfig,
) -> ServiceResult<PriceList> {
    retrieve_with(db, id, config).await
}

/// Вариант retrieve, работающий и внутри открытой транзакции.
/// Каждая мутация завершается таким чтением: вызывающий получает ровно то,
/// что легло в хранилище.
async fn retrieve_with<C: ConnectionTrait>(
    db: &C,
    id: &PriceListId,
    config: &RetrieveConfig,
) -> ServiceResult<PriceList> {
    let mut list = repository::get_by_id(db, id).await?.ok_or_else(|| {
        ServiceError::not_found(format!(
            "Price list with id {} was not found",
            id.as_string()
        ))
    })?;

    if config.include_prices {
        list.prices = a003_price_record::repository::find_by_price_list(db, id).await?;
    }
    if config.include_customer_groups {
        list.customer_groups = group_link::groups_for_list(db, id).await?;
    }

    Ok(list)
}

fn validate_prices(prices: &[PriceRecordDto]) -> ServiceResult<()> {
    for price in prices {
        price.validate().map_err(ServiceError::validation)?;
    }
    Ok(())
}

/// Создание прайс-листа: скалярные поля, цены и привязка групп —
/// одна транзакция, откат целиком при любом сбое.
pub async fn create(db: &DatabaseConnection, dto: PriceListDto) -> ServiceResult<PriceList> {
    validate_prices(&dto.prices)?;

    let mut aggregate = PriceList::new_for_insert(
        dto.name,
        dto.description,
        dto.status.unwrap_or_default(),
        dto.starts_at,
        dto.ends_at,
        dto.custom_fields,
    );
    aggregate.validate().map_err(ServiceError::validation)?;
    aggregate.before_write();

    let id = aggregate.base.id;

    let txn = db.begin().await?;
    repository::insert_txn(&txn, &aggregate).await?;

    if !dto.prices.is_empty() {
        a003_price_record::repository::add_prices_txn(&txn, &id, &dto.prices, false).await?;
    }
    if let Some(groups) = &dto.customer_groups {
        upsert_customer_groups_txn(&txn, &id, groups).await?;
    }

    let created = retrieve_with(&txn, &id, &RetrieveConfig::expanded()).await?;
    txn.commit().await?;

    tracing::info!("created price list {}", created.to_string_id());
    Ok(created)
}

/// Обновление прайс-листа.
///
/// Скалярные поля патча перезаписываются как есть; затем, независимо,
/// `prices` сливаются по естественному ключу, а `customer_groups` заменяют
/// набор групп целиком (намеренная асимметрия). Всё — в одной транзакции.
pub async fn update(
    db: &DatabaseConnection,
    id: &PriceListId,
    patch: PriceListUpdate,
) -> ServiceResult<PriceList> {
    if let Some(prices) = &patch.prices {
        validate_prices(prices)?;
    }

    let txn = db.begin().await?;

    let mut aggregate = retrieve_with(&txn, id, &RetrieveConfig::default()).await?;
    aggregate.apply_update(&patch);
    aggregate.validate().map_err(ServiceError::validation)?;
    aggregate.before_write();
    aggregate.base.metadata.increment_version();
    repository::update_txn(&txn, &aggregate).await?;

    if let Some(prices) = &patch.prices {
        a003_price_record::repository::update_prices_txn(&txn, id, prices).await?;
    }
    if let Some(groups) = &patch.customer_groups {
        upsert_customer_groups_txn(&txn, id, groups).await?;
    }

    let updated = retrieve_with(&txn, id, &RetrieveConfig::expanded()).await?;
    txn.commit().await?;
    Ok(updated)
}

/// Добавить цены в прайс-лист.
///
/// `replace == true` — существующие записи списка заменяются новым набором
/// атомарно; иначе новые записи дописываются к существующим.
pub async fn add_prices(
    db: &DatabaseConnection,
    id: &PriceListId,
    prices: &[PriceRecordDto],
    replace: bool,
) -> ServiceResult<PriceList> {
    validate_prices(prices)?;

    let txn = db.begin().await?;
    retrieve_with(&txn, id, &RetrieveConfig::default()).await?;

    a003_price_record::repository::add_prices_txn(&txn, id, prices, replace).await?;

    let list = retrieve_with(
        &txn,
        id,
        &RetrieveConfig {
            include_prices: true,
            include_customer_groups: false,
        },
    )
    .await?;
    txn.commit().await?;
    Ok(list)
}

/// Удалить ценовые записи списка по идентификаторам.
/// Не найденные и принадлежащие другим спискам идентификаторы
/// игнорируются молча. Возвращает число удалённых записей.
pub async fn delete_prices(
    db: &DatabaseConnection,
    id: &PriceListId,
    price_ids: &[PriceRecordId],
) -> ServiceResult<u64> {
    let txn = db.begin().await?;
    retrieve_with(&txn, id, &RetrieveConfig::default()).await?;

    let removed = a003_price_record::repository::delete_prices_txn(&txn, id, price_ids).await?;
    txn.commit().await?;

    tracing::debug!(
        "deleted {} of {} requested price records from {}",
        removed,
        price_ids.len(),
        id.as_string()
    );
    Ok(removed)
}

/// Идемпотентное мягкое удаление: отсутствующий или уже удалённый список —
/// успех без эффекта.
pub async fn delete(db: &DatabaseConnection, id: &PriceListId) -> ServiceResult<()> {
    let removed = repository::soft_delete_txn(db, id).await?;
    if !removed {
        tracing::debug!("price list {} already absent, delete is a no-op", id.as_string());
    }
    Ok(())
}

/// Список прайс-листов (страница по умолчанию: skip 0, take 20)
pub async fn list(
    db: &DatabaseConnection,
    filter: &PriceListFilter,
    page: &Pagination,
) -> ServiceResult<Vec<PriceList>> {
    let (items, _) = repository::list_with_filters(db, filter, page).await?;
    Ok(items)
}

/// Список прайс-листов вместе с общим количеством
pub async fn list_and_count(
    db: &DatabaseConnection,
    filter: &PriceListFilter,
    page: &Pagination,
) -> ServiceResult<(Vec<PriceList>, u64)> {
    Ok(repository::list_with_filters(db, filter, page).await?)
}

/// Заменить набор групп покупателей списка.
/// Каждая ссылка разрешается через справочник; несуществующая группа —
/// NotFound и откат всей транзакции.
pub async fn upsert_customer_groups(
    db: &DatabaseConnection,
    id: &PriceListId,
    groups: &[CustomerGroupRef],
) -> ServiceResult<()> {
    let txn = db.begin().await?;
    retrieve_with(&txn, id, &RetrieveConfig::default()).await?;
    upsert_customer_groups_txn(&txn, id, groups).await?;
    txn.commit().await?;
    Ok(())
}

async fn upsert_customer_groups_txn<C: ConnectionTrait>(
    db: &C,
    id: &PriceListId,
    groups: &[CustomerGroupRef],
) -> ServiceResult<()> {
    let mut group_ids = Vec::with_capacity(groups.len());
    for group_ref in groups {
        let missing = || {
            ServiceError::not_found(format!(
                "Customer group with id {} was not found",
                group_ref.id
            ))
        };
        let group_id = CustomerGroupId::from_string(&group_ref.id).map_err(|_| missing())?;
        match a001_customer_group::repository::get_by_id(db, &group_id).await? {
            Some(group) => group_ids.push(group.base.id),
            None => return Err(missing()),
        }
    }

    group_link::replace_groups_txn(db, id, &group_ids).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::ensure_schema;
    use contracts::domain::a001_customer_group::aggregate::{CustomerGroup, CustomerGroupDto};
    use contracts::enums::price_list_status::PriceListStatus;
    use sea_orm::Database;

    async fn setup() -> DatabaseConnection {
        // Одно соединение: у пула in-memory sqlite иначе будет своя БД
        // на каждое соединение
        let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        ensure_schema(&db).await.unwrap();
        db
    }

    fn price(currency: &str, amount: f64) -> PriceRecordDto {
        PriceRecordDto {
            currency_code: currency.into(),
            amount,
            ..Default::default()
        }
    }

    fn dto(name: &str, prices: Vec<PriceRecordDto>) -> PriceListDto {
        PriceListDto {
            name: name.into(),
            prices,
            ..Default::default()
        }
    }

    async fn seed_group(db: &DatabaseConnection, name: &str) -> CustomerGroup {
        crate::domain::a001_customer_group::service::create(
            db,
            CustomerGroupDto {
                name: name.into(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn group_ref(group: &CustomerGroup) -> CustomerGroupRef {
        CustomerGroupRef {
            id: group.to_string_id(),
        }
    }

    fn currencies(list: &PriceList) -> Vec<&str> {
        list.prices.iter().map(|p| p.currency_code.as_str()).collect()
    }

    #[tokio::test]
    async fn create_with_prices_retrieves_all_records() {
        let db = setup().await;

        let created = create(&db, dto("Розница", vec![price("eur", 1000.0), price("usd", 1200.0)]))
            .await
            .unwrap();

        let list = retrieve(&db, &created.base.id, &RetrieveConfig::expanded())
            .await
            .unwrap();
        assert_eq!(list.prices.len(), 2);
        for record in &list.prices {
            assert_eq!(record.price_list_id, created.base.id);
        }
    }

    #[tokio::test]
    async fn create_eu_prices_example() {
        let db = setup().await;

        let created = create(&db, dto("EU Prices", vec![price("EUR", 1000.0)]))
            .await
            .unwrap();
        let id = created.base.id;

        let list = retrieve(&db, &id, &RetrieveConfig::expanded()).await.unwrap();
        assert_eq!(list.prices.len(), 1);
        assert_eq!(list.prices[0].currency_code, "eur");
        assert_eq!(list.prices[0].amount, 1000.0);

        let list = add_prices(&db, &id, &[price("usd", 1200.0)], false)
            .await
            .unwrap();
        assert_eq!(list.prices.len(), 2);
    }

    #[tokio::test]
    async fn add_prices_replace_is_exact_and_idempotent() {
        let db = setup().await;

        let created = create(&db, dto("Опт", vec![price("eur", 500.0), price("usd", 600.0)]))
            .await
            .unwrap();
        let id = created.base.id;

        let replacement = [price("gbp", 700.0)];
        let list = add_prices(&db, &id, &replacement, true).await.unwrap();
        assert_eq!(currencies(&list), vec!["gbp"]);
        assert_eq!(list.prices[0].amount, 700.0);

        // Повторный идентичный replace даёт тот же результат
        let list = add_prices(&db, &id, &replacement, true).await.unwrap();
        assert_eq!(currencies(&list), vec!["gbp"]);
    }

    #[tokio::test]
    async fn add_prices_append_is_additive() {
        let db = setup().await;

        let created = create(&db, dto("Сезон", vec![])).await.unwrap();
        let id = created.base.id;

        add_prices(&db, &id, &[price("eur", 100.0)], false).await.unwrap();
        let list = add_prices(&db, &id, &[price("usd", 110.0)], false)
            .await
            .unwrap();
        assert_eq!(currencies(&list), vec!["eur", "usd"]);
    }

    #[tokio::test]
    async fn delete_prices_ignores_unknown_and_foreign_ids() {
        let db = setup().await;

        let first = create(&db, dto("Первый", vec![price("eur", 100.0)]))
            .await
            .unwrap();
        let second = create(&db, dto("Второй", vec![price("usd", 200.0)]))
            .await
            .unwrap();
        let foreign_record = second.prices[0].id;

        // Несуществующий id и запись чужого списка — не ошибка и не эффект
        let removed = delete_prices(
            &db,
            &first.base.id,
            &[PriceRecordId::new_v4(), foreign_record],
        )
        .await
        .unwrap();
        assert_eq!(removed, 0);

        let first = retrieve(&db, &first.base.id, &RetrieveConfig::expanded())
            .await
            .unwrap();
        let second = retrieve(&db, &second.base.id, &RetrieveConfig::expanded())
            .await
            .unwrap();
        assert_eq!(first.prices.len(), 1);
        assert_eq!(second.prices.len(), 1);

        // Свой id удаляется
        let removed = delete_prices(&db, &first.base.id, &[first.prices[0].id])
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_hides_list() {
        let db = setup().await;

        let created = create(&db, dto("Временный", vec![])).await.unwrap();
        let id = created.base.id;

        delete(&db, &id).await.unwrap();
        assert!(matches!(
            retrieve(&db, &id, &RetrieveConfig::default()).await,
            Err(ServiceError::NotFound(_))
        ));

        // Повторное удаление — успех без эффекта; как и удаление никогда не существовавшего
        delete(&db, &id).await.unwrap();
        delete(&db, &PriceListId::new_v4()).await.unwrap();
        assert!(matches!(
            retrieve(&db, &id, &RetrieveConfig::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_customer_group_aborts_create() {
        let db = setup().await;

        let mut input = dto("С группами", vec![price("eur", 100.0)]);
        input.customer_groups = Some(vec![CustomerGroupRef {
            id: CustomerGroupId::new_v4().as_string(),
        }]);

        let err = create(&db, input).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // Откат целиком: ни списка, ни цен
        let (_, total) = list_and_count(&db, &PriceListFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn missing_customer_group_rolls_back_whole_update() {
        let db = setup().await;
        let group = seed_group(&db, "VIP").await;

        let mut input = dto("Стабильный", vec![price("eur", 100.0)]);
        input.customer_groups = Some(vec![group_ref(&group)]);
        let created = create(&db, input).await.unwrap();
        let id = created.base.id;

        let patch = PriceListUpdate {
            name: Some("Изменённый".into()),
            prices: Some(vec![price("usd", 999.0)]),
            customer_groups: Some(vec![CustomerGroupRef {
                id: CustomerGroupId::new_v4().as_string(),
            }]),
            ..Default::default()
        };
        let err = update(&db, &id, patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // Ни скалярные поля, ни цены, ни группы не изменились
        let list = retrieve(&db, &id, &RetrieveConfig::expanded()).await.unwrap();
        assert_eq!(list.base.name, "Стабильный");
        assert_eq!(currencies(&list), vec!["eur"]);
        assert_eq!(list.customer_groups.len(), 1);
        assert_eq!(list.customer_groups[0].base.id, group.base.id);
    }

    #[tokio::test]
    async fn update_patches_scalars_merges_prices_and_replaces_groups() {
        let db = setup().await;
        let vip = seed_group(&db, "VIP").await;
        let retail = seed_group(&db, "Розничные").await;

        let mut input = dto("Базовый", vec![price("eur", 1000.0)]);
        input.customer_groups = Some(vec![group_ref(&vip)]);
        let created = create(&db, input).await.unwrap();
        let id = created.base.id;

        let patch = PriceListUpdate {
            status: Some(PriceListStatus::Active),
            prices: Some(vec![price("eur", 900.0), price("usd", 1200.0)]),
            customer_groups: Some(vec![group_ref(&retail)]),
            ..Default::default()
        };
        let updated = update(&db, &id, patch).await.unwrap();

        // Скаляры: статус перезаписан, имя сохранилось
        assert_eq!(updated.base.name, "Базовый");
        assert_eq!(updated.status, PriceListStatus::Active);

        // Цены: eur слит по естественному ключу (не задублирован), usd добавлен
        assert_eq!(currencies(&updated), vec!["eur", "usd"]);
        assert_eq!(updated.prices[0].amount, 900.0);

        // Группы: набор заменён целиком
        assert_eq!(updated.customer_groups.len(), 1);
        assert_eq!(updated.customer_groups[0].base.id, retail.base.id);
    }

    #[tokio::test]
    async fn upsert_customer_groups_replaces_set_wholesale() {
        let db = setup().await;
        let a = seed_group(&db, "A").await;
        let b = seed_group(&db, "B").await;
        let c = seed_group(&db, "C").await;

        let mut input = dto("Групповой", vec![]);
        input.customer_groups = Some(vec![group_ref(&a), group_ref(&b)]);
        let created = create(&db, input).await.unwrap();
        let id = created.base.id;

        upsert_customer_groups(&db, &id, &[group_ref(&b), group_ref(&c)])
            .await
            .unwrap();

        let list = retrieve(&db, &id, &RetrieveConfig::expanded()).await.unwrap();
        let names: Vec<&str> = list
            .customer_groups
            .iter()
            .map(|g| g.base.name.as_str())
            .collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[tokio::test]
    async fn list_filters_and_paginates() {
        let db = setup().await;
        let group = seed_group(&db, "Опт").await;

        for i in 0..25 {
            let mut input = dto(&format!("Прайс {:02}", i), vec![]);
            if i == 0 {
                input.customer_groups = Some(vec![group_ref(&group)]);
                input.status = Some(PriceListStatus::Active);
            }
            create(&db, input).await.unwrap();
        }

        // Страница по умолчанию — 20 записей, счётчик видит всё
        let (page, total) = list_and_count(&db, &PriceListFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 20);
        assert_eq!(total, 25);

        let rest = list(
            &db,
            &PriceListFilter::default(),
            &Pagination { skip: 20, take: 20 },
        )
        .await
        .unwrap();
        assert_eq!(rest.len(), 5);

        // Фильтр по статусу
        let (active, total_active) = list_and_count(
            &db,
            &PriceListFilter {
                status: Some(PriceListStatus::Active),
                ..Default::default()
            },
            &Pagination::default(),
        )
        .await
        .unwrap();
        assert_eq!(total_active, 1);
        assert_eq!(active[0].base.name, "Прайс 00");

        // Фильтр по наличию связи с группой
        let by_group = list(
            &db,
            &PriceListFilter {
                customer_group_id: Some(group.to_string_id()),
                ..Default::default()
            },
            &Pagination::default(),
        )
        .await
        .unwrap();
        assert_eq!(by_group.len(), 1);

        // Подстрочный фильтр
        let by_q = list(
            &db,
            &PriceListFilter {
                q: Some("Прайс 24".into()),
                ..Default::default()
            },
            &Pagination::default(),
        )
        .await
        .unwrap();
        assert_eq!(by_q.len(), 1);

        // Мягко удалённые исчезают из выдачи
        delete(&db, &active[0].base.id).await.unwrap();
        let (_, total) = list_and_count(&db, &PriceListFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(total, 24);
    }

    #[tokio::test]
    async fn scoped_prices_merge_by_full_natural_key() {
        let db = setup().await;
        let group = seed_group(&db, "Крупный опт").await;

        let scoped = PriceRecordDto {
            customer_group_id: Some(group.to_string_id()),
            min_quantity: Some(10),
            max_quantity: Some(100),
            ..price("eur", 800.0)
        };
        let created = create(&db, dto("Ступенчатый", vec![price("eur", 1000.0), scoped.clone()]))
            .await
            .unwrap();
        let id = created.base.id;

        // Тот же ключ — перезапись суммы, другой ключ — не тронут
        let patch = PriceListUpdate {
            prices: Some(vec![PriceRecordDto {
                amount: 750.0,
                ..scoped
            }]),
            ..Default::default()
        };
        let updated = update(&db, &id, patch).await.unwrap();
        assert_eq!(updated.prices.len(), 2);

        let plain = updated
            .prices
            .iter()
            .find(|p| p.customer_group_id.is_none())
            .unwrap();
        let grouped = updated
            .prices
            .iter()
            .find(|p| p.customer_group_id.is_some())
            .unwrap();
        assert_eq!(plain.amount, 1000.0);
        assert_eq!(grouped.amount, 750.0);
        assert_eq!(grouped.min_quantity, Some(10));
    }

    #[tokio::test]
    async fn validation_failures_reject_whole_call() {
        let db = setup().await;

        let err = create(&db, dto("", vec![])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = create(&db, dto("Ок", vec![price("euro", 1.0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = create(&db, dto("Ок", vec![price("eur", -5.0)]))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let (_, total) = list_and_count(&db, &PriceListFilter::default(), &Pagination::default())
            .await
            .unwrap();
        assert_eq!(total, 0);
    }
}
