//! PROV-style agents, entities and activities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use ifdo_core::error::CoreError;
use ifdo_core::provenance;
use ifdo_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::resource::Resource;

fn check_unique_id(payload: &Map<String, Value>) -> Result<(), CoreError> {
    match payload.get("unique_id").and_then(Value::as_str) {
        Some(unique_id) => provenance::validate_unique_id(unique_id),
        None => Ok(()),
    }
}

fn timestamp(
    column: &str,
    payload: &Map<String, Value>,
    stored: Option<Timestamp>,
) -> Result<Option<Timestamp>, CoreError> {
    match payload.get(column) {
        None => Ok(stored),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|_| CoreError::Validation(format!("{column} must be an RFC 3339 timestamp"))),
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProvenanceAgent {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    /// ORCID, URL or any other stable identifier.
    pub unique_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateProvenanceAgent {
    pub uuid: Option<Uuid>,
    pub name: String,
    pub unique_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateProvenanceAgent {
    pub name: Option<String>,
    pub unique_id: Option<String>,
}

impl Resource for ProvenanceAgent {
    const ENTITY: &'static str = "Provenance agent";
    const TABLE: &'static str = "provenance_agents";
    const COLUMNS: &'static [&'static str] =
        &["id", "uuid", "name", "unique_id", "created_at", "updated_at"];
    const WRITABLE: &'static [&'static str] = &["uuid", "name", "unique_id"];

    fn id(&self) -> DbId {
        self.id
    }

    fn validate(payload: &mut Map<String, Value>, _existing: Option<&Self>) -> Result<(), CoreError> {
        check_unique_id(payload)
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProvenanceEntity {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub unique_id: String,
    pub generated_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateProvenanceEntity {
    pub uuid: Option<Uuid>,
    pub name: String,
    pub unique_id: String,
    pub generated_at: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateProvenanceEntity {
    pub name: Option<String>,
    pub unique_id: Option<String>,
    pub generated_at: Option<Timestamp>,
}

impl Resource for ProvenanceEntity {
    const ENTITY: &'static str = "Provenance entity";
    const TABLE: &'static str = "provenance_entities";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "uuid",
        "name",
        "unique_id",
        "generated_at",
        "created_at",
        "updated_at",
    ];
    const WRITABLE: &'static [&'static str] = &["uuid", "name", "unique_id", "generated_at"];

    fn id(&self) -> DbId {
        self.id
    }

    fn validate(payload: &mut Map<String, Value>, _existing: Option<&Self>) -> Result<(), CoreError> {
        check_unique_id(payload)
    }
}

// ---------------------------------------------------------------------------
// Activity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ProvenanceActivity {
    pub id: DbId,
    pub uuid: Uuid,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateProvenanceActivity {
    pub uuid: Option<Uuid>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

pub type UpdateProvenanceActivity = CreateProvenanceActivity;

impl Resource for ProvenanceActivity {
    const ENTITY: &'static str = "Provenance activity";
    const TABLE: &'static str = "provenance_activities";
    const COLUMNS: &'static [&'static str] =
        &["id", "uuid", "start_time", "end_time", "created_at", "updated_at"];
    const WRITABLE: &'static [&'static str] = &["uuid", "start_time", "end_time"];

    fn id(&self) -> DbId {
        self.id
    }

    /// The window is checked against the stored bound the payload leaves out.
    fn validate(payload: &mut Map<String, Value>, existing: Option<&Self>) -> Result<(), CoreError> {
        let start = timestamp("start_time", payload, existing.and_then(|row| row.start_time))?;
        let end = timestamp("end_time", payload, existing.and_then(|row| row.end_time))?;
        provenance::validate_activity_window(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[test]
    fn activity_update_checked_against_stored_start() {
        let now = Utc::now();
        let row = ProvenanceActivity {
            id: 1,
            uuid: Uuid::new_v4(),
            start_time: Some(now),
            end_time: None,
            created_at: now,
            updated_at: now,
        };
        let early = serde_json::to_value(now - Duration::hours(1)).unwrap();
        let mut payload = json!({ "end_time": early }).as_object().cloned().unwrap();
        assert!(ProvenanceActivity::validate(&mut payload, Some(&row)).is_err());

        let late = serde_json::to_value(now + Duration::hours(1)).unwrap();
        let mut payload = json!({ "end_time": late }).as_object().cloned().unwrap();
        assert!(ProvenanceActivity::validate(&mut payload, Some(&row)).is_ok());
    }

    #[test]
    fn blank_agent_unique_id_rejected() {
        let mut payload = json!({ "name": "Cruise PI", "unique_id": "" })
            .as_object()
            .cloned()
            .unwrap();
        assert!(ProvenanceAgent::validate(&mut payload, None).is_err());
    }
}
