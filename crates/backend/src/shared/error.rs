use thiserror::Error;

/// Единая поверхность ошибок сервисного слоя.
///
/// Любой сбой хранилища нормализуется в `Persistence`, чтобы вызывающий
/// код видел один тип ошибки независимо от нижележащей технологии.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn persistence(err: impl Into<anyhow::Error>) -> Self {
        Self::Persistence(err.into())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err)
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Persistence(anyhow::Error::new(err))
    }
}

/// Result-алиас сервисного слоя
pub type ServiceResult<T> = Result<T, ServiceError>;
