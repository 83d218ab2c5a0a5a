use ifdo_core::error::CoreError;

/// Failure of a repository operation that mixes domain checks and SQL.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    pub fn not_found(entity: &'static str, key: impl Into<ifdo_core::types::ResourceKey>) -> Self {
        Self::Core(CoreError::NotFound {
            entity,
            key: key.into(),
        })
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Core(CoreError::Validation(message.into()))
    }
}
