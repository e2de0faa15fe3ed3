//! Visit models: the in-progress encounter and its completed snapshot.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a visit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Active,
    Completed,
}

/// An in-progress visit, keyed by patient ID in the record store.
///
/// At most one exists per patient; the key itself enforces that.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveVisit {
    pub start_time: String,
    #[serde(default)]
    pub doctor: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
    pub status: VisitStatus,
}

/// A completed visit snapshot, appended to the patient's visit history
/// when the visit ends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitRecord {
    pub start_time: String,
    /// Absent on records imported from dirty historical data; such visits
    /// are never archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub doctor: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<String>,
    pub status: VisitStatus,
}

/// Input for starting a visit.
#[derive(Debug, Clone, Default)]
pub struct VisitDraft {
    pub doctor: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Closing notes supplied when ending a visit.
#[derive(Debug, Clone, Default)]
pub struct VisitNotes {
    pub notes: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub follow_up: Option<String>,
}

/// An active visit enriched with the owning patient's display name,
/// for listing views.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveVisitSummary {
    pub patient_id: String,
    pub patient_name: String,
    pub visit: ActiveVisit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(VisitStatus::Active).unwrap(),
            serde_json::json!("active")
        );
        assert_eq!(
            serde_json::to_value(VisitStatus::Completed).unwrap(),
            serde_json::json!("completed")
        );
    }

    #[test]
    fn test_visit_record_tolerates_missing_end_time() {
        let json = serde_json::json!({
            "start_time": "2025-01-10T09:00:00",
            "status": "completed"
        });
        let record: VisitRecord = serde_json::from_value(json).unwrap();
        assert!(record.end_time.is_none());
        assert_eq!(record.doctor, "");
    }
}
