//! Patient records and their append-only history logs.

use serde::{Deserialize, Serialize};

use crate::time::now_stamp;

use super::visit::VisitRecord;

/// A registered patient.
///
/// `medical_history` and `visit_history` are append-only: updates to the
/// patient record never replace them (see [`PatientUpdate`], which has no
/// history fields at all).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Patient display name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Ordered log of diagnoses and conditions
    #[serde(default)]
    pub medical_history: Vec<MedicalHistoryEntry>,
    /// Ordered log of completed visit snapshots
    #[serde(default)]
    pub visit_history: Vec<VisitRecord>,
    /// Current medications
    #[serde(default)]
    pub medications: Vec<Medication>,
    pub created_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Patient {
    /// Build a patient record from registration input, stamping `created_on`.
    pub fn new(data: NewPatient) -> Self {
        Self {
            name: data.name,
            date_of_birth: data.date_of_birth,
            gender: data.gender,
            phone: data.phone,
            email: data.email,
            address: data.address,
            emergency_contact: data.emergency_contact,
            insurance_provider: data.insurance_provider,
            insurance_number: data.insurance_number,
            notes: data.notes,
            medical_history: Vec::new(),
            visit_history: Vec::new(),
            medications: data.medications,
            created_on: now_stamp(),
            last_updated: None,
        }
    }
}

/// One entry in a patient's medical history log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalHistoryEntry {
    pub date: String,
    /// Entry kind: "diagnosis", "condition", "allergy", ...
    #[serde(rename = "type")]
    pub entry_type: String,
    pub condition: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub treatment: String,
}

/// A prescribed medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Registration input for a new patient.
#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    /// Caller-supplied ID; a sequential `P0001`-style ID is assigned
    /// when absent
    pub id: Option<String>,
    pub name: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub notes: Option<String>,
    pub medications: Vec<Medication>,
}

impl NewPatient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Input for a new medical history entry; the log date is stamped at
/// append time.
#[derive(Debug, Clone, Default)]
pub struct NewHistoryEntry {
    /// Entry kind, defaulting to "condition"
    pub entry_type: Option<String>,
    pub condition: String,
    pub notes: Option<String>,
    pub treatment: Option<String>,
}

/// Partial update for a patient record.
///
/// History logs and `created_on` are deliberately absent: they cannot be
/// replaced through an update.
#[derive(Debug, Clone, Default)]
pub struct PatientUpdate {
    pub name: Option<String>,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
    pub insurance_provider: Option<String>,
    pub insurance_number: Option<String>,
    pub notes: Option<String>,
    pub medications: Option<Vec<Medication>>,
}
