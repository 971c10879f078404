use serde::{de::DeserializeOwned, Serialize};
use std::hash::Hash;

/// Трейт для типов идентификаторов агрегатов
///
/// Все идентификаторы хранятся и передаются как строковые теги с префиксом
/// ("plist_...", "cgrp_..."); внутри — UUID.
pub trait AggregateId:
    Clone + Copy + PartialEq + Eq + Hash + Serialize + DeserializeOwned + std::fmt::Debug
{
    /// Преобразовать ID в строку
    fn as_string(&self) -> String;

    /// Создать ID из строки
    fn from_string(s: &str) -> Result<Self, String>;
}

/// Собрать строковый тег из префикса и UUID
pub fn tag_id(prefix: &str, value: &uuid::Uuid) -> String {
    format!("{}_{}", prefix, value.simple())
}

/// Разобрать строковый тег обратно в UUID
pub fn parse_tagged_id(prefix: &str, s: &str) -> Result<uuid::Uuid, String> {
    let raw = s
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .ok_or_else(|| format!("Invalid id '{}': expected '{}_' prefix", s, prefix))?;
    uuid::Uuid::parse_str(raw).map_err(|e| format!("Invalid id '{}': {}", s, e))
}
