//! Visit lifecycle: at most one active visit per patient, ended visits
//! fold into the patient's history logs.

use tracing::info;

use crate::error::{ClinicError, ClinicResult};
use crate::models::{
    ActiveVisit, ActiveVisitSummary, MedicalHistoryEntry, VisitDraft, VisitNotes, VisitRecord,
    VisitStatus,
};
use crate::store::RecordStore;
use crate::time::now_stamp;

pub struct VisitTracker<'a> {
    store: &'a mut RecordStore,
}

impl<'a> VisitTracker<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Start a visit for a patient. Fails if the patient is unknown or
    /// already has one in progress.
    pub fn start(&mut self, patient_id: &str, draft: VisitDraft) -> ClinicResult<()> {
        let doc = self.store.doc_mut();
        if !doc.patients.contains_key(patient_id) {
            return Err(ClinicError::NotFound(format!("patient {patient_id}")));
        }
        if doc.active_visits.contains_key(patient_id) {
            return Err(ClinicError::AlreadyActive(patient_id.to_string()));
        }

        doc.active_visits.insert(
            patient_id.to_string(),
            ActiveVisit {
                start_time: now_stamp(),
                doctor: draft.doctor.unwrap_or_default(),
                reason: draft.reason.unwrap_or_default(),
                notes: draft.notes.unwrap_or_default(),
                status: VisitStatus::Active,
            },
        );
        self.store.save()?;
        info!(patient_id = %patient_id, "visit started");
        Ok(())
    }

    /// End the patient's active visit.
    ///
    /// Appends the completed snapshot to `visit_history` and, when a
    /// non-empty diagnosis was supplied, a matching `medical_history`
    /// entry. Both preconditions (patient exists, visit exists) are checked
    /// before any mutation, so a failed call changes nothing.
    pub fn end(&mut self, patient_id: &str, notes: VisitNotes) -> ClinicResult<VisitRecord> {
        let doc = self.store.doc_mut();
        let patient = doc
            .patients
            .get_mut(patient_id)
            .ok_or_else(|| ClinicError::NotFound(format!("patient {patient_id}")))?;
        let visit = doc
            .active_visits
            .remove(patient_id)
            .ok_or_else(|| ClinicError::NoActiveVisit(patient_id.to_string()))?;

        let now = now_stamp();
        let record = VisitRecord {
            start_time: visit.start_time,
            end_time: Some(now.clone()),
            doctor: visit.doctor,
            reason: visit.reason,
            notes: notes.notes.unwrap_or(visit.notes),
            diagnosis: notes.diagnosis.clone(),
            treatment: notes.treatment.clone(),
            follow_up: notes.follow_up,
            status: VisitStatus::Completed,
        };

        patient.visit_history.push(record.clone());

        if let Some(diagnosis) = notes.diagnosis.filter(|d| !d.trim().is_empty()) {
            patient.medical_history.push(MedicalHistoryEntry {
                date: now,
                entry_type: "diagnosis".into(),
                condition: diagnosis,
                notes: record.notes.clone(),
                treatment: notes.treatment.unwrap_or_default(),
            });
        }

        self.store.save()?;
        info!(patient_id = %patient_id, "visit ended");
        Ok(record)
    }

    /// Overwrite the notes of the active visit.
    pub fn update_notes(&mut self, patient_id: &str, notes: &str) -> ClinicResult<()> {
        let visit = self
            .store
            .doc_mut()
            .active_visits
            .get_mut(patient_id)
            .ok_or_else(|| ClinicError::NoActiveVisit(patient_id.to_string()))?;
        visit.notes = notes.to_string();
        self.store.save()?;
        Ok(())
    }

    pub fn get_active(&self, patient_id: &str) -> Option<&ActiveVisit> {
        self.store.doc().active_visits.get(patient_id)
    }

    /// All active visits, each with the owning patient's display name.
    pub fn all_active(&self) -> Vec<ActiveVisitSummary> {
        let doc = self.store.doc();
        doc.active_visits
            .iter()
            .map(|(patient_id, visit)| ActiveVisitSummary {
                patient_id: patient_id.clone(),
                patient_name: doc
                    .patients
                    .get(patient_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| "Unknown".into()),
                visit: visit.clone(),
            })
            .collect()
    }
}
