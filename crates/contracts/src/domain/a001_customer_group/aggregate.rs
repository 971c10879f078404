use crate::domain::common::{
    aggregate_id::{parse_tagged_id, tag_id},
    AggregateId, AggregateRoot, BaseAggregate, EntityMetadata,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CustomerGroupId(pub Uuid);

impl CustomerGroupId {
    pub const PREFIX: &'static str = "cgrp";

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

impl AggregateId for CustomerGroupId {
    fn as_string(&self) -> String {
        tag_id(Self::PREFIX, &self.0)
    }

    fn from_string(s: &str) -> Result<Self, String> {
        parse_tagged_id(Self::PREFIX, s).map(CustomerGroupId::new)
    }
}

impl Serialize for CustomerGroupId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for CustomerGroupId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Группа покупателей. Жизненным циклом группы владеет внешняя подсистема;
/// здесь — справочник, достаточный для привязки групп к прайс-листам.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerGroup {
    #[serde(flatten)]
    pub base: BaseAggregate<CustomerGroupId>,
}

impl CustomerGroup {
    pub fn new_for_insert(name: String, description: Option<String>) -> Self {
        let mut base = BaseAggregate::new(CustomerGroupId::new_v4(), name);
        base.description = description;
        Self { base }
    }

    pub fn to_string_id(&self) -> String {
        self.base.id.as_string()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.name.trim().is_empty() {
            return Err("Название группы не может быть пустым".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for CustomerGroup {
    type Id = CustomerGroupId;

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
        "a001"
    }

    fn collection_name() -> &'static str {
        "customer_group"
    }
}

// ============================================================================
// DTO
// ============================================================================
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerGroupDto {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
}
