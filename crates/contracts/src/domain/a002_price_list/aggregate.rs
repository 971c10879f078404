use crate::domain::a001_customer_group::aggregate::CustomerGroup;
use crate::domain::a003_price_record::aggregate::{PriceRecord, PriceRecordDto};
use crate::domain::common::{
    aggregate_id::{parse_tagged_id, tag_id},
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata,
};
use crate::enums::price_list_status::PriceListStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceListId(pub Uuid);

impl PriceListId {
    pub const PREFIX: &'static str = "plist";

    pub fn new(value: Uuid) -> Self {
        Self(value)
    }

    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl AggregateId for PriceListId {
    fn as_string(&self) -> String {
        tag_id(Self::PREFIX, &self.0)
    }

    fn from_string(s: &str) -> Result<Self, String> {
        parse_tagged_id(Self::PREFIX, s).map(PriceListId::new)
    }
}

impl Serialize for PriceListId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for PriceListId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Прайс-лист: именованный набор цен с окном действия, опционально
/// ограниченный группами покупателей.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceList {
    #[serde(flatten)]
    pub base: BaseAggregate<PriceListId>,

    /// Статус (active / draft)
    #[serde(default)]
    pub status: PriceListStatus,

    /// Начало окна действия
    #[serde(rename = "startsAt")]
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Конец окна действия
    #[serde(rename = "endsAt")]
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Момент мягкого удаления
    #[serde(rename = "deletedAt")]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Произвольные пользовательские поля (JSON)
    #[serde(rename = "customFields")]
    pub custom_fields: Option<serde_json::Value>,

    /// Ценовые записи (заполняются при запросе с развёрнутыми связями)
    #[serde(default)]
    pub prices: Vec<PriceRecord>,

    /// Привязанные группы покупателей (заполняются при запросе с развёрнутыми связями)
    #[serde(rename = "customerGroups", default)]
    pub customer_groups: Vec<CustomerGroup>,
}

impl PriceList {
    pub fn new_for_insert(
        name: String,
        description: Option<String>,
        status: PriceListStatus,
        starts_at: Option<chrono::DateTime<chrono::Utc>>,
        ends_at: Option<chrono::DateTime<chrono::Utc>>,
        custom_fields: Option<serde_json::Value>,
    ) -> Self {
        let mut base = BaseAggregate::new(PriceListId::new_v4(), name);
        base.description = description;

        Self {
            base,
            status,
            starts_at,
            ends_at,
            deleted_at: None,
            custom_fields,
            prices: Vec::new(),
            customer_groups: Vec::new(),
        }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    /// Применить изменяемые скалярные поля из патча.
    /// Поле присутствует — перезаписывается, отсутствует — сохраняется.
    /// `prices` и `customer_groups` применяются отдельно, на уровне сервиса.
    pub fn apply_update(&mut self, patch: &PriceListUpdate) {
        if let Some(name) = &patch.name {
            self.base.name = name.clone();
        }
        if patch.description.is_some() {
            self.base.description = patch.description.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.starts_at.is_some() {
            self.starts_at = patch.starts_at;
        }
        if patch.ends_at.is_some() {
            self.ends_at = patch.ends_at;
        }
        if patch.custom_fields.is_some() {
            self.custom_fields = patch.custom_fields.clone();
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.name.trim().is_empty() {
            return Err("Название прайс-листа не может быть пустым".into());
        }
        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at) {
            if ends < starts {
                return Err("Окно действия задано в обратном порядке".into());
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for PriceList {
    type Id = PriceListId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn name(&self) -> &str {
        &self.base.name
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a002"
    }

    fn collection_name() -> &'static str {
        "price_list"
    }
}

// ============================================================================
// DTO
// ============================================================================

/// Ссылка на группу покупателей (при создании/обновлении прайс-листа)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerGroupRef {
    pub id: String,
}

/// Данные для создания прайс-листа
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceListDto {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<PriceListStatus>,
    #[serde(rename = "startsAt")]
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "endsAt")]
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "customFields")]
    pub custom_fields: Option<serde_json::Value>,
    #[serde(default)]
    pub prices: Vec<PriceRecordDto>,
    #[serde(rename = "customerGroups")]
    pub customer_groups: Option<Vec<CustomerGroupRef>>,
}

/// Патч для обновления прайс-листа: только перечисленные поля,
/// присутствующее поле перезаписывает значение целиком
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceListUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<PriceListStatus>,
    #[serde(rename = "startsAt")]
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "endsAt")]
    pub ends_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(rename = "customFields")]
    pub custom_fields: Option<serde_json::Value>,
    /// Присутствует — записи сливаются по естественному ключу
    pub prices: Option<Vec<PriceRecordDto>>,
    /// Присутствует — набор групп заменяется целиком
    #[serde(rename = "customerGroups")]
    pub customer_groups: Option<Vec<CustomerGroupRef>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_tagged_string() {
        let id = PriceListId::new_v4();
        let s = id.as_string();
        assert!(s.starts_with("plist_"));
        assert_eq!(PriceListId::from_string(&s).unwrap(), id);
    }

    #[test]
    fn id_rejects_foreign_prefix() {
        let id = PriceListId::new_v4();
        let s = id.as_string().replace("plist_", "cgrp_");
        assert!(PriceListId::from_string(&s).is_err());
    }

    #[test]
    fn apply_update_keeps_absent_fields() {
        let mut list = PriceList::new_for_insert(
            "Базовый".into(),
            Some("описание".into()),
            PriceListStatus::Draft,
            None,
            None,
            None,
        );
        list.apply_update(&PriceListUpdate {
            status: Some(PriceListStatus::Active),
            ..Default::default()
        });
        assert_eq!(list.base.name, "Базовый");
        assert_eq!(list.base.description.as_deref(), Some("описание"));
        assert_eq!(list.status, PriceListStatus::Active);
    }

    #[test]
    fn validate_rejects_inverted_window() {
        let starts = chrono::Utc::now();
        let list = PriceList::new_for_insert(
            "X".into(),
            None,
            PriceListStatus::Draft,
            Some(starts),
            Some(starts - chrono::Duration::days(1)),
            None,
        );
        assert!(list.validate().is_err());
    }
}
