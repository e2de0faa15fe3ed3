//! Archival of old completed visits.
//!
//! Visits whose end time predates the retention cutoff move from the
//! patient's `visit_history` into the archive bucket. Ambiguous entries
//! (missing or unparsable end time) are always kept; archiving must never
//! destroy data it cannot date.

use chrono::Duration;
use tracing::{info, warn};

use crate::error::ClinicResult;
use crate::store::RecordStore;
use crate::time::{now, parse_timestamp};

/// Default retention window in days.
pub const DEFAULT_CUTOFF_DAYS: i64 = 90;

pub struct Archiver<'a> {
    store: &'a mut RecordStore,
}

impl<'a> Archiver<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Move every visit older than `cutoff_days` into the archive bucket.
    ///
    /// Sweeps all patients, then persists once, so the whole sweep lands in
    /// a single file write. Returns the number of visits archived; running
    /// it again immediately archives nothing further.
    pub fn archive_old_visits(&mut self, cutoff_days: i64) -> ClinicResult<usize> {
        let cutoff = now() - Duration::days(cutoff_days);
        let mut archived_count = 0;

        let doc = self.store.doc_mut();
        for (patient_id, patient) in &mut doc.patients {
            if patient.visit_history.is_empty() {
                continue;
            }

            let mut keep = Vec::with_capacity(patient.visit_history.len());
            let mut archive = Vec::new();
            for visit in patient.visit_history.drain(..) {
                let old_enough = match &visit.end_time {
                    None => false,
                    Some(end) => match parse_timestamp(end) {
                        Ok(end) => end <= cutoff,
                        Err(_) => {
                            warn!(patient_id = %patient_id, end_time = %end,
                                  "keeping visit with unparsable end time");
                            false
                        }
                    },
                };
                if old_enough {
                    archive.push(visit);
                } else {
                    keep.push(visit);
                }
            }

            patient.visit_history = keep;
            if !archive.is_empty() {
                archived_count += archive.len();
                doc.archived_visits
                    .entry(patient_id.clone())
                    .or_default()
                    .extend(archive);
            }
        }

        self.store.save()?;
        info!(archived = archived_count, cutoff_days, "visit archival sweep finished");
        Ok(archived_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPatient, VisitRecord, VisitStatus};
    use crate::patients::PatientRegistry;
    use crate::time::format_timestamp;

    fn visit_ended_days_ago(days: i64) -> VisitRecord {
        let end = now() - Duration::days(days);
        VisitRecord {
            start_time: format_timestamp(end - Duration::minutes(30)),
            end_time: Some(format_timestamp(end)),
            doctor: "Dr. Smith".into(),
            reason: "Check-up".into(),
            notes: String::new(),
            diagnosis: None,
            treatment: None,
            follow_up: None,
            status: VisitStatus::Completed,
        }
    }

    fn setup_with_patient() -> (tempfile::TempDir, RecordStore, String) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordStore::open(dir.path()).unwrap();
        let id = PatientRegistry::new(&mut store)
            .add(NewPatient::named("Jane Doe"))
            .unwrap();
        (dir, store, id)
    }

    #[test]
    fn test_archives_only_visits_past_cutoff() {
        let (_dir, mut store, id) = setup_with_patient();
        let old = visit_ended_days_ago(100);
        let recent = visit_ended_days_ago(10);
        {
            let patient = store.doc_mut().patients.get_mut(&id).unwrap();
            patient.visit_history.push(old.clone());
            patient.visit_history.push(recent.clone());
        }

        let count = Archiver::new(&mut store).archive_old_visits(90).unwrap();
        assert_eq!(count, 1);

        let patient = &store.doc().patients[&id];
        assert_eq!(patient.visit_history, vec![recent]);
        assert_eq!(store.doc().archived_visits[&id], vec![old]);
    }

    #[test]
    fn test_idempotent_second_sweep() {
        let (_dir, mut store, id) = setup_with_patient();
        store
            .doc_mut()
            .patients
            .get_mut(&id)
            .unwrap()
            .visit_history
            .push(visit_ended_days_ago(100));

        assert_eq!(Archiver::new(&mut store).archive_old_visits(90).unwrap(), 1);
        assert_eq!(Archiver::new(&mut store).archive_old_visits(90).unwrap(), 0);
        assert_eq!(store.doc().archived_visits[&id].len(), 1);
    }

    #[test]
    fn test_missing_or_unparsable_end_time_kept() {
        let (_dir, mut store, id) = setup_with_patient();
        {
            let patient = store.doc_mut().patients.get_mut(&id).unwrap();
            let mut no_end = visit_ended_days_ago(200);
            no_end.end_time = None;
            let mut bad_end = visit_ended_days_ago(200);
            bad_end.end_time = Some("garbage".into());
            patient.visit_history.push(no_end);
            patient.visit_history.push(bad_end);
        }

        let count = Archiver::new(&mut store).archive_old_visits(90).unwrap();
        assert_eq!(count, 0);
        assert_eq!(store.doc().patients[&id].visit_history.len(), 2);
        assert!(store.doc().archived_visits.get(&id).is_none());
    }

    #[test]
    fn test_archive_appends_to_prior_contents() {
        let (_dir, mut store, id) = setup_with_patient();
        store
            .doc_mut()
            .patients
            .get_mut(&id)
            .unwrap()
            .visit_history
            .push(visit_ended_days_ago(120));
        Archiver::new(&mut store).archive_old_visits(90).unwrap();

        store
            .doc_mut()
            .patients
            .get_mut(&id)
            .unwrap()
            .visit_history
            .push(visit_ended_days_ago(100));
        Archiver::new(&mut store).archive_old_visits(90).unwrap();

        assert_eq!(store.doc().archived_visits[&id].len(), 2);
    }
}
