use crate::types::ResourceKey;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with {key} not found")]
    NotFound {
        entity: &'static str,
        key: ResourceKey,
    },

    #[error("{0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Short machine-readable kind, surfaced as the `type` field of error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "value_error",
            Self::Conflict(_) => "conflict",
            Self::Internal(_) => "internal",
        }
    }
}
