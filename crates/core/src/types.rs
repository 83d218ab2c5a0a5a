use std::fmt;

use uuid::Uuid;

use crate::error::CoreError;

/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// How a single row is addressed from a URL path: numeric primary key or UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKey {
    Id(DbId),
    Uuid(Uuid),
}

impl ResourceKey {
    /// Parse a path segment as either a positive integer id or a UUID.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if let Ok(id) = trimmed.parse::<DbId>() {
            if id <= 0 {
                return Err(CoreError::Validation(format!(
                    "Invalid identifier '{raw}'. Ids must be positive"
                )));
            }
            return Ok(Self::Id(id));
        }
        Uuid::parse_str(trimmed).map(Self::Uuid).map_err(|_| {
            CoreError::Validation(format!(
                "Invalid identifier '{raw}'. Expected an integer id or a UUID"
            ))
        })
    }
}

impl From<DbId> for ResourceKey {
    fn from(id: DbId) -> Self {
        Self::Id(id)
    }
}

impl From<Uuid> for ResourceKey {
    fn from(uuid: Uuid) -> Self {
        Self::Uuid(uuid)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Uuid(uuid) => write!(f, "uuid {uuid}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_numeric_id() {
        assert_eq!(ResourceKey::parse("42").unwrap(), ResourceKey::Id(42));
    }

    #[test]
    fn parses_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(
            ResourceKey::parse(&uuid.to_string()).unwrap(),
            ResourceKey::Uuid(uuid)
        );
    }

    #[test]
    fn rejects_zero_and_negative_ids() {
        assert_matches!(ResourceKey::parse("0"), Err(CoreError::Validation(_)));
        assert_matches!(ResourceKey::parse("-3"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_garbage() {
        let err = ResourceKey::parse("not-a-key").unwrap_err();
        assert!(err.to_string().contains("integer id or a UUID"));
    }

    #[test]
    fn not_found_message_names_the_key() {
        let err = CoreError::NotFound {
            entity: "Dataset",
            key: ResourceKey::Id(7),
        };
        assert_eq!(err.to_string(), "Dataset with id 7 not found");
    }
}
