//! Provenance (PROV model) rules: agents, entities and activities.

use crate::error::CoreError;
use crate::types::Timestamp;

/// An activity may not end before it starts.
pub fn validate_activity_window(
    start_time: Option<Timestamp>,
    end_time: Option<Timestamp>,
) -> Result<(), CoreError> {
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end < start {
            return Err(CoreError::Validation(format!(
                "Activity end_time ({end}) is before start_time ({start})"
            )));
        }
    }
    Ok(())
}

/// Agents and entities are keyed by a non-blank `unique_id`.
pub fn validate_unique_id(unique_id: &str) -> Result<(), CoreError> {
    if unique_id.trim().is_empty() {
        return Err(CoreError::Validation(
            "unique_id must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn open_windows_accepted() {
        assert!(validate_activity_window(None, None).is_ok());
        assert!(validate_activity_window(Some(Utc::now()), None).is_ok());
    }

    #[test]
    fn end_before_start_rejected() {
        let start = Utc::now();
        let end = start - Duration::minutes(5);
        assert!(validate_activity_window(Some(start), Some(end)).is_err());
        assert!(validate_activity_window(Some(end), Some(start)).is_ok());
    }

    #[test]
    fn blank_unique_id_rejected() {
        assert!(validate_unique_id("  ").is_err());
        assert!(validate_unique_id("orcid:0000").is_ok());
    }
}
