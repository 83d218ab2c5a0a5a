//! Extractors and small request-parsing helpers whose failures render as
//! [`AppError`] JSON bodies.

use axum::extract::FromRequest;
use ifdo_core::types::ResourceKey;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// `axum::Json` with a JSON error body on malformed input.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Parse a `{id}` path segment as a numeric id or a UUID.
pub fn key(raw: &str) -> AppResult<ResourceKey> {
    Ok(ResourceKey::parse(raw)?)
}

/// A row reference inside a JSON body: a number, or a string holding an id or UUID.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BodyKey {
    Number(i64),
    Text(String),
}

impl BodyKey {
    pub fn to_raw(&self) -> String {
        match self {
            Self::Number(id) => id.to_string(),
            Self::Text(raw) => raw.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn body_key_accepts_numbers_and_strings() {
        let number: BodyKey = serde_json::from_str("12").unwrap();
        assert_eq!(number.to_raw(), "12");

        let uuid = Uuid::new_v4();
        let text: BodyKey = serde_json::from_value(serde_json::json!(uuid.to_string())).unwrap();
        assert_eq!(key(&text.to_raw()).unwrap(), ResourceKey::Uuid(uuid));
    }

    #[test]
    fn bad_path_key_is_a_validation_error() {
        assert_matches!(key("abc"), Err(AppError::Core(_)));
    }
}
