use contracts::domain::a001_customer_group::aggregate::{
    CustomerGroup, CustomerGroupDto, CustomerGroupId,
};
use contracts::domain::common::AggregateId;
use sea_orm::DatabaseConnection;

use super::repository;
use crate::shared::error::{ServiceError, ServiceResult};

/// Получить группу по идентификатору; отсутствие — ошибка NotFound
pub async fn retrieve(
    db: &DatabaseConnection,
    id: &CustomerGroupId,
) -> ServiceResult<CustomerGroup> {
    repository::get_by_id(db, id).await?.ok_or_else(|| {
        ServiceError::not_found(format!(
            "Customer group with id {} was not found",
            id.as_string()
        ))
    })
}

/// Создание новой группы покупателей
pub async fn create(db: &DatabaseConnection, dto: CustomerGroupDto) -> ServiceResult<CustomerGroup> {
    let mut aggregate = CustomerGroup::new_for_insert(dto.name, dto.description);

    aggregate.validate().map_err(ServiceError::validation)?;
    aggregate.before_write();

    let id = repository::insert(db, &aggregate).await?;
    retrieve(db, &id).await
}

/// Список всех групп
pub async fn list_all(db: &DatabaseConnection) -> ServiceResult<Vec<CustomerGroup>> {
    Ok(repository::list_all(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::ensure_schema;
    use sea_orm::Database;

    async fn setup() -> DatabaseConnection {
        let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = Database::connect(options).await.unwrap();
        ensure_schema(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn retrieve_missing_group_is_not_found() {
        let db = setup().await;
        let err = retrieve(&db, &CustomerGroupId::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_then_retrieve_round_trips() {
        let db = setup().await;
        let created = create(
            &db,
            CustomerGroupDto {
                name: "Оптовые".into(),
                description: Some("Оптовые покупатели".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let found = retrieve(&db, &created.base.id).await.unwrap();
        assert_eq!(found.base.name, "Оптовые");
        assert_eq!(found.base.description.as_deref(), Some("Оптовые покупатели"));

        let all = list_all(&db).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
