//! The table description every generically-served entity implements.
//!
//! [`crate::repositories::CrudRepo`] builds its SQL from these constants, so
//! a new resource needs a row struct, its DTOs and one `impl Resource`.

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::FromRow;
use ifdo_core::error::CoreError;
use ifdo_core::types::DbId;

pub trait Resource: for<'r> FromRow<'r, PgRow> + Serialize + Send + Unpin + 'static {
    /// Human-readable name used in error messages, e.g. `"Dataset"`.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    /// Columns selected for every read. Also the valid filter and `order_by` columns.
    const COLUMNS: &'static [&'static str];
    /// Columns a create or update payload may set.
    const WRITABLE: &'static [&'static str];

    fn id(&self) -> DbId;

    /// Check and normalize a filtered write payload.
    ///
    /// `existing` is the current row on update and `None` on create.
    fn validate(_payload: &mut Map<String, Value>, _existing: Option<&Self>) -> Result<(), CoreError> {
        Ok(())
    }

    /// Columns computed from the row itself that differ from what is stored.
    fn derived(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// Which nulls a write payload drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drops nulls and empty arrays.
    Create,
    /// Drops nulls only: absent fields are left untouched.
    Update,
}

/// Serialize a DTO into a column map for `R`.
pub fn payload_from<R: Resource, T: Serialize>(
    input: &T,
    mode: WriteMode,
) -> Result<Map<String, Value>, CoreError> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => Ok(filter_payload::<R>(map, mode)),
        Ok(_) => Err(CoreError::Validation(format!(
            "{} input must be a JSON object",
            R::ENTITY
        ))),
        Err(err) => Err(CoreError::Internal(format!(
            "Failed to serialize {} input: {err}",
            R::ENTITY
        ))),
    }
}

/// Keep only writable columns with meaningful values.
pub fn filter_payload<R: Resource>(mut map: Map<String, Value>, mode: WriteMode) -> Map<String, Value> {
    map.retain(|column, value| {
        if !R::WRITABLE.contains(&column.as_str()) || value.is_null() {
            return false;
        }
        !(mode == WriteMode::Create && value.as_array().is_some_and(Vec::is_empty))
    });
    map
}

/// Insert `column: value` into `derived` when `value` differs from `current`.
pub fn derive_if_changed(
    derived: &mut Map<String, Value>,
    column: &str,
    current: &Option<Value>,
    value: Option<Value>,
) {
    if *current != value {
        derived.insert(column.to_string(), value.unwrap_or(Value::Null));
    }
}
