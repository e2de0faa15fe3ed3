//! Patient registry: registration, updates, search, and the medical
//! history log.

use tracing::info;

use crate::error::{ClinicError, ClinicResult};
use crate::models::{
    MedicalHistoryEntry, NewHistoryEntry, NewPatient, Patient, PatientUpdate, VisitRecord,
};
use crate::store::RecordStore;
use crate::time::now_stamp;

/// Patient CRUD over the record store. Constructed per use with a borrow
/// of the store, like every other subsystem.
pub struct PatientRegistry<'a> {
    store: &'a mut RecordStore,
}

impl<'a> PatientRegistry<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Register a new patient. Returns the assigned patient ID.
    pub fn add(&mut self, data: NewPatient) -> ClinicResult<String> {
        if data.name.trim().is_empty() {
            return Err(ClinicError::Validation("patient name is required".into()));
        }

        let id = match &data.id {
            Some(id) => id.clone(),
            None => self.next_patient_id(),
        };
        if self.store.doc().patients.contains_key(&id) {
            return Err(ClinicError::DuplicateId(format!("patient {id}")));
        }

        let patient = Patient::new(data);
        self.store.doc_mut().patients.insert(id.clone(), patient);
        self.store.save()?;
        info!(patient_id = %id, "patient registered");
        Ok(id)
    }

    /// Apply a partial update. History logs and `created_on` are untouched
    /// by construction.
    pub fn update(&mut self, patient_id: &str, changes: PatientUpdate) -> ClinicResult<()> {
        let patient = self
            .store
            .doc_mut()
            .patients
            .get_mut(patient_id)
            .ok_or_else(|| ClinicError::NotFound(format!("patient {patient_id}")))?;

        if let Some(name) = changes.name {
            if name.trim().is_empty() {
                return Err(ClinicError::Validation("patient name is required".into()));
            }
            patient.name = name;
        }
        if let Some(v) = changes.date_of_birth {
            patient.date_of_birth = Some(v);
        }
        if let Some(v) = changes.gender {
            patient.gender = Some(v);
        }
        if let Some(v) = changes.phone {
            patient.phone = Some(v);
        }
        if let Some(v) = changes.email {
            patient.email = Some(v);
        }
        if let Some(v) = changes.address {
            patient.address = Some(v);
        }
        if let Some(v) = changes.emergency_contact {
            patient.emergency_contact = Some(v);
        }
        if let Some(v) = changes.insurance_provider {
            patient.insurance_provider = Some(v);
        }
        if let Some(v) = changes.insurance_number {
            patient.insurance_number = Some(v);
        }
        if let Some(v) = changes.notes {
            patient.notes = Some(v);
        }
        if let Some(v) = changes.medications {
            patient.medications = v;
        }
        patient.last_updated = Some(now_stamp());

        self.store.save()?;
        Ok(())
    }

    /// Remove a patient. Refused while the patient has an active visit.
    pub fn delete(&mut self, patient_id: &str) -> ClinicResult<()> {
        if !self.store.doc().patients.contains_key(patient_id) {
            return Err(ClinicError::NotFound(format!("patient {patient_id}")));
        }
        if self.store.doc().active_visits.contains_key(patient_id) {
            return Err(ClinicError::Validation(
                "cannot delete a patient with an active visit; end the visit first".into(),
            ));
        }
        self.store.doc_mut().patients.remove(patient_id);
        self.store.save()?;
        info!(patient_id = %patient_id, "patient deleted");
        Ok(())
    }

    pub fn get(&self, patient_id: &str) -> Option<&Patient> {
        self.store.doc().patients.get(patient_id)
    }

    /// All patients, keyed by ID.
    pub fn all(&self) -> &std::collections::BTreeMap<String, Patient> {
        &self.store.doc().patients
    }

    /// Case-insensitive substring search over ID, name, phone, and email.
    pub fn search(&self, term: &str) -> Vec<(String, Patient)> {
        let term = term.to_lowercase();
        self.store
            .doc()
            .patients
            .iter()
            .filter(|(id, p)| {
                id.to_lowercase().contains(&term)
                    || p.name.to_lowercase().contains(&term)
                    || p.phone
                        .as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(&term))
                    || p.email
                        .as_deref()
                        .is_some_and(|v| v.to_lowercase().contains(&term))
            })
            .map(|(id, p)| (id.clone(), p.clone()))
            .collect()
    }

    /// Append an entry to the patient's medical history log.
    pub fn add_medical_history(
        &mut self,
        patient_id: &str,
        entry: NewHistoryEntry,
    ) -> ClinicResult<()> {
        if entry.condition.trim().is_empty() {
            return Err(ClinicError::Validation(
                "medical condition is required".into(),
            ));
        }
        let patient = self
            .store
            .doc_mut()
            .patients
            .get_mut(patient_id)
            .ok_or_else(|| ClinicError::NotFound(format!("patient {patient_id}")))?;

        patient.medical_history.push(MedicalHistoryEntry {
            date: now_stamp(),
            entry_type: entry.entry_type.unwrap_or_else(|| "condition".into()),
            condition: entry.condition,
            notes: entry.notes.unwrap_or_default(),
            treatment: entry.treatment.unwrap_or_default(),
        });
        self.store.save()?;
        Ok(())
    }

    /// Snapshot of the patient's visit history; empty if the patient is
    /// unknown.
    pub fn visit_history(&self, patient_id: &str) -> Vec<VisitRecord> {
        self.store
            .doc()
            .patients
            .get(patient_id)
            .map(|p| p.visit_history.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the patient's medical history; empty if the patient is
    /// unknown.
    pub fn medical_history(&self, patient_id: &str) -> Vec<MedicalHistoryEntry> {
        self.store
            .doc()
            .patients
            .get(patient_id)
            .map(|p| p.medical_history.clone())
            .unwrap_or_default()
    }

    /// Next free `P0001`-style ID. Scans existing numeric suffixes so IDs
    /// are never reused after a deletion.
    fn next_patient_id(&self) -> String {
        let max = self
            .store
            .doc()
            .patients
            .keys()
            .filter_map(|id| id.strip_prefix('P'))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("P{:04}", max + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_add_assigns_sequential_ids() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        let id1 = registry.add(NewPatient::named("Jane Doe")).unwrap();
        let id2 = registry.add(NewPatient::named("John Roe")).unwrap();
        assert_eq!(id1, "P0001");
        assert_eq!(id2, "P0002");
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        registry.add(NewPatient::named("Jane Doe")).unwrap();
        let id2 = registry.add(NewPatient::named("John Roe")).unwrap();
        registry.delete("P0001").unwrap();
        let id3 = registry.add(NewPatient::named("Ann Poe")).unwrap();
        assert_eq!(id2, "P0002");
        assert_eq!(id3, "P0003");
    }

    #[test]
    fn test_add_requires_name() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        let err = registry.add(NewPatient::named("  ")).unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        let mut data = NewPatient::named("Jane Doe");
        data.id = Some("P0007".into());
        registry.add(data.clone()).unwrap();
        let err = registry.add(data).unwrap_err();
        assert!(matches!(err, ClinicError::DuplicateId(_)));
    }

    #[test]
    fn test_update_preserves_history_and_created_on() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        let id = registry.add(NewPatient::named("Jane Doe")).unwrap();
        registry
            .add_medical_history(
                &id,
                NewHistoryEntry {
                    condition: "Hypertension".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        let created_on = registry.get(&id).unwrap().created_on.clone();

        registry
            .update(
                &id,
                PatientUpdate {
                    phone: Some("555-0101".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let patient = registry.get(&id).unwrap();
        assert_eq!(patient.phone.as_deref(), Some("555-0101"));
        assert_eq!(patient.medical_history.len(), 1);
        assert_eq!(patient.created_on, created_on);
        assert!(patient.last_updated.is_some());
    }

    #[test]
    fn test_update_unknown_patient() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        let err = registry.update("P9999", PatientUpdate::default()).unwrap_err();
        assert!(matches!(err, ClinicError::NotFound(_)));
    }

    #[test]
    fn test_search_matches_name_and_phone() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        let mut jane = NewPatient::named("Jane Doe");
        jane.phone = Some("555-0199".into());
        registry.add(jane).unwrap();
        registry.add(NewPatient::named("John Roe")).unwrap();

        assert_eq!(registry.search("jane").len(), 1);
        assert_eq!(registry.search("0199").len(), 1);
        assert_eq!(registry.search("oe").len(), 2);
        assert!(registry.search("zzz").is_empty());
    }

    #[test]
    fn test_medical_history_requires_condition() {
        let (_dir, mut store) = setup();
        let mut registry = PatientRegistry::new(&mut store);
        let id = registry.add(NewPatient::named("Jane Doe")).unwrap();
        let err = registry
            .add_medical_history(&id, NewHistoryEntry::default())
            .unwrap_err();
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn test_history_getters_empty_for_unknown_patient() {
        let (_dir, mut store) = setup();
        let registry = PatientRegistry::new(&mut store);
        assert!(registry.visit_history("P9999").is_empty());
        assert!(registry.medical_history("P9999").is_empty());
    }
}
