use serde::{Deserialize, Serialize};

/// Статусы прайс-листа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceListStatus {
    Active,
    Draft,
}

impl PriceListStatus {
    /// Получить код статуса
    pub fn code(&self) -> &'static str {
        match self {
            PriceListStatus::Active => "active",
            PriceListStatus::Draft => "draft",
        }
    }

    /// Получить человекочитаемое название
    pub fn display_name(&self) -> &'static str {
        match self {
            PriceListStatus::Active => "Активен",
            PriceListStatus::Draft => "Черновик",
        }
    }

    /// Получить все статусы
    pub fn all() -> Vec<PriceListStatus> {
        vec![PriceListStatus::Active, PriceListStatus::Draft]
    }

    /// Парсинг из строки
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "active" => Some(PriceListStatus::Active),
            "draft" => Some(PriceListStatus::Draft),
            _ => None,
        }
    }
}

impl std::fmt::Display for PriceListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl Default for PriceListStatus {
    fn default() -> Self {
        PriceListStatus::Draft
    }
}
