use crate::domain::a001_customer_group::aggregate::CustomerGroupId;
use crate::domain::a002_price_list::aggregate::PriceListId;
use crate::domain::common::aggregate_id::{parse_tagged_id, tag_id};
use crate::domain::common::AggregateId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// ID Type
// ============================================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceRecordId(pub Uuid);

impl PriceRecordId {
    pub const PREFIX: &'static str = "price";

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

impl AggregateId for PriceRecordId {
    fn as_string(&self) -> String {
        tag_id(Self::PREFIX, &self.0)
    }

    fn from_string(s: &str) -> Result<Self, String> {
        parse_tagged_id(Self::PREFIX, s).map(PriceRecordId::new)
    }
}

impl Serialize for PriceRecordId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

impl<'de> Deserialize<'de> for PriceRecordId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Price record
// ============================================================================

/// Одна ценовая запись прайс-листа: валюта + сумма, опционально
/// суженная группой покупателей и диапазоном количества.
/// Запись принадлежит ровно одному прайс-листу и достижима только через него.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRecord {
    pub id: PriceRecordId,

    #[serde(rename = "priceListId")]
    pub price_list_id: PriceListId,

    /// Код валюты (ISO 4217, нижний регистр)
    #[serde(rename = "currencyCode")]
    pub currency_code: String,

    /// Сумма (неотрицательная)
    pub amount: f64,

    #[serde(rename = "customerGroupId")]
    pub customer_group_id: Option<CustomerGroupId>,

    #[serde(rename = "minQuantity")]
    pub min_quantity: Option<i32>,

    #[serde(rename = "maxQuantity")]
    pub max_quantity: Option<i32>,

    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// DTO
// ============================================================================

/// Данные одной цены при создании/обновлении
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PriceRecordDto {
    #[serde(rename = "currencyCode")]
    pub currency_code: String,
    pub amount: f64,
    #[serde(rename = "customerGroupId")]
    pub customer_group_id: Option<String>,
    #[serde(rename = "minQuantity")]
    pub min_quantity: Option<i32>,
    #[serde(rename = "maxQuantity")]
    pub max_quantity: Option<i32>,
}

impl PriceRecordDto {
    /// Нормализованный код валюты
    pub fn normalized_currency(&self) -> String {
        self.currency_code.trim().to_lowercase()
    }

    pub fn validate(&self) -> Result<(), String> {
        let currency = self.normalized_currency();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("Некорректный код валюты: '{}'", self.currency_code));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(format!("Сумма не может быть отрицательной: {}", self.amount));
        }
        if let (Some(min), Some(max)) = (self.min_quantity, self.max_quantity) {
            if max < min {
                return Err("Диапазон количества задан в обратном порядке".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(currency: &str, amount: f64) -> PriceRecordDto {
        PriceRecordDto {
            currency_code: currency.into(),
            amount,
            ..Default::default()
        }
    }

    #[test]
    fn currency_is_normalized_to_lowercase() {
        assert_eq!(dto(" EUR ", 1.0).normalized_currency(), "eur");
    }

    #[test]
    fn validate_rejects_bad_inputs() {
        assert!(dto("euro", 1.0).validate().is_err());
        assert!(dto("eur", -0.01).validate().is_err());
        assert!(dto("eur", f64::NAN).validate().is_err());

        let inverted = PriceRecordDto {
            min_quantity: Some(10),
            max_quantity: Some(5),
            ..dto("eur", 1.0)
        };
        assert!(inverted.validate().is_err());
    }
}
