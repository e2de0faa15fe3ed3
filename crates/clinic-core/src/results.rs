//! Lab test results: per-patient CRUD and numeric trend extraction.

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ClinicError, ClinicResult};
use crate::models::{NewTestResult, TestResult, TestResultUpdate, TrendPoint};
use crate::store::RecordStore;
use crate::time::{now_stamp, parse_date, parse_timestamp};

pub struct TestResultLog<'a> {
    store: &'a mut RecordStore,
}

impl<'a> TestResultLog<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Record a new test result for a patient. Returns the result ID.
    pub fn add(&mut self, patient_id: &str, data: NewTestResult) -> ClinicResult<String> {
        if patient_id.trim().is_empty() {
            return Err(ClinicError::Validation("patient ID is required".into()));
        }
        if data.test_name.trim().is_empty() {
            return Err(ClinicError::Validation("test name is required".into()));
        }
        if data.test_date.trim().is_empty() {
            return Err(ClinicError::Validation("test date is required".into()));
        }

        let id = data.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let patient_results = self
            .store
            .doc_mut()
            .test_results
            .entry(patient_id.to_string())
            .or_default();
        if patient_results.contains_key(&id) {
            return Err(ClinicError::DuplicateId(format!(
                "test result {id} for patient {patient_id}"
            )));
        }

        patient_results.insert(
            id.clone(),
            TestResult {
                test_name: data.test_name,
                test_date: data.test_date,
                value: data.value,
                unit: data.unit,
                reference_range: data.reference_range,
                is_normal: data.is_normal,
                notes: data.notes,
                ordered_by: data.ordered_by,
                lab: data.lab,
                created_on: now_stamp(),
                last_updated: None,
            },
        );
        self.store.save()?;
        info!(patient_id = %patient_id, result_id = %id, "test result recorded");
        Ok(id)
    }

    /// Apply a partial update to a test result.
    pub fn update(
        &mut self,
        patient_id: &str,
        result_id: &str,
        changes: TestResultUpdate,
    ) -> ClinicResult<()> {
        let result = self
            .store
            .doc_mut()
            .test_results
            .get_mut(patient_id)
            .and_then(|m| m.get_mut(result_id))
            .ok_or_else(|| {
                ClinicError::NotFound(format!("test result {result_id} for patient {patient_id}"))
            })?;

        if let Some(v) = changes.test_name {
            result.test_name = v;
        }
        if let Some(v) = changes.test_date {
            result.test_date = v;
        }
        if let Some(v) = changes.value {
            result.value = Some(v);
        }
        if let Some(v) = changes.unit {
            result.unit = Some(v);
        }
        if let Some(v) = changes.reference_range {
            result.reference_range = Some(v);
        }
        if let Some(v) = changes.is_normal {
            result.is_normal = Some(v);
        }
        if let Some(v) = changes.notes {
            result.notes = Some(v);
        }
        if let Some(v) = changes.ordered_by {
            result.ordered_by = Some(v);
        }
        if let Some(v) = changes.lab {
            result.lab = Some(v);
        }
        result.last_updated = Some(now_stamp());

        self.store.save()?;
        Ok(())
    }

    /// Delete a test result, pruning the patient key once empty.
    pub fn delete(&mut self, patient_id: &str, result_id: &str) -> ClinicResult<()> {
        let doc = self.store.doc_mut();
        let patient_results = doc.test_results.get_mut(patient_id).ok_or_else(|| {
            ClinicError::NotFound(format!("test result {result_id} for patient {patient_id}"))
        })?;
        if patient_results.remove(result_id).is_none() {
            return Err(ClinicError::NotFound(format!(
                "test result {result_id} for patient {patient_id}"
            )));
        }
        if patient_results.is_empty() {
            doc.test_results.remove(patient_id);
        }
        self.store.save()?;
        info!(patient_id = %patient_id, result_id = %result_id, "test result deleted");
        Ok(())
    }

    pub fn get(&self, patient_id: &str, result_id: &str) -> Option<&TestResult> {
        self.store
            .doc()
            .test_results
            .get(patient_id)
            .and_then(|m| m.get(result_id))
    }

    /// All results for a patient, newest first by test date.
    pub fn for_patient(&self, patient_id: &str) -> Vec<(String, TestResult)> {
        let mut out: Vec<(String, TestResult)> = self
            .store
            .doc()
            .test_results
            .get(patient_id)
            .map(|m| m.iter().map(|(id, r)| (id.clone(), r.clone())).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| b.1.test_date.cmp(&a.1.test_date));
        out
    }

    /// A patient's results for one test type, newest first.
    pub fn by_type(&self, patient_id: &str, test_type: &str) -> Vec<(String, TestResult)> {
        let mut out = self.for_patient(patient_id);
        out.retain(|(_, r)| r.test_name == test_type);
        out
    }

    /// A patient's results within an inclusive date range, newest first.
    /// Results with unparsable dates are skipped.
    pub fn in_range(
        &self,
        patient_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<(String, TestResult)> {
        let mut out = self.for_patient(patient_id);
        out.retain(|(id, r)| match parse_date(&r.test_date) {
            Ok(d) => d >= from && d <= to,
            Err(_) => {
                warn!(result_id = %id, test_date = %r.test_date,
                      "skipping test result with unparsable date");
                false
            }
        });
        out
    }

    /// Distinct test names across all patients, sorted.
    pub fn test_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .store
            .doc()
            .test_results
            .values()
            .flat_map(|m| m.values())
            .map(|r| r.test_name.clone())
            .collect();
        types.sort();
        types.dedup();
        types
    }

    /// Numeric trend series for one test type, ascending by date.
    ///
    /// Results whose value does not parse as a number, or whose date does
    /// not parse, are silently excluded; that is trimming, not an error.
    pub fn numerical_for_type(&self, patient_id: &str, test_type: &str) -> Vec<TrendPoint> {
        let mut points: Vec<TrendPoint> = self
            .by_type(patient_id, test_type)
            .into_iter()
            .filter_map(|(id, r)| {
                let value: f64 = r.value.as_deref()?.trim().parse().ok()?;
                let date = parse_timestamp(&r.test_date).ok()?;
                Some(TrendPoint {
                    result_id: id,
                    date,
                    value,
                    unit: r.unit.unwrap_or_default(),
                    reference_range: r.reference_range.unwrap_or_default(),
                })
            })
            .collect();
        points.sort_by_key(|p| p.date);
        points
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

    fn glucose(date: &str, value: &str) -> NewTestResult {
        NewTestResult {
            test_name: "Glucose".into(),
            test_date: date.into(),
            value: Some(value.into()),
            unit: Some("mg/dL".into()),
            reference_range: Some("70-100".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_requires_fields() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        assert!(matches!(
            log.add("", glucose("2025-01-10", "95")),
            Err(ClinicError::Validation(_))
        ));
        assert!(matches!(
            log.add(
                "P0001",
                NewTestResult {
                    test_date: "2025-01-10".into(),
                    ..Default::default()
                }
            ),
            Err(ClinicError::Validation(_))
        ));
        assert!(matches!(
            log.add(
                "P0001",
                NewTestResult {
                    test_name: "Glucose".into(),
                    ..Default::default()
                }
            ),
            Err(ClinicError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_id_scoped_per_patient() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        let mut data = glucose("2025-01-10", "95");
        data.id = Some("r1".into());
        log.add("P0001", data.clone()).unwrap();
        assert!(matches!(
            log.add("P0001", data.clone()),
            Err(ClinicError::DuplicateId(_))
        ));
        // Same ID under another patient is a different (patient, id) pair
        log.add("P0002", data).unwrap();
    }

    #[test]
    fn test_delete_prunes_empty_patient_key() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        let id = log.add("P0001", glucose("2025-01-10", "95")).unwrap();
        log.delete("P0001", &id).unwrap();
        assert!(store.doc().test_results.get("P0001").is_none());
    }

    #[test]
    fn test_update_and_get() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        let id = log.add("P0001", glucose("2025-01-10", "95")).unwrap();
        log.update(
            "P0001",
            &id,
            TestResultUpdate {
                value: Some("102".into()),
                is_normal: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let result = log.get("P0001", &id).unwrap();
        assert_eq!(result.value.as_deref(), Some("102"));
        assert_eq!(result.is_normal, Some(false));
        assert!(result.last_updated.is_some());
    }

    #[test]
    fn test_for_patient_newest_first() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        log.add("P0001", glucose("2025-01-10", "95")).unwrap();
        log.add("P0001", glucose("2025-03-10", "99")).unwrap();
        log.add("P0001", glucose("2025-02-10", "97")).unwrap();

        let results = log.for_patient("P0001");
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].1.test_date, "2025-03-10");
        assert_eq!(results[2].1.test_date, "2025-01-10");
    }

    #[test]
    fn test_in_range_filters() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        log.add("P0001", glucose("2025-01-10", "95")).unwrap();
        log.add("P0001", glucose("2025-02-10", "97")).unwrap();

        let hits = log.in_range(
            "P0001",
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1.test_date, "2025-01-10");
    }

    #[test]
    fn test_test_types_distinct_across_patients() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        log.add("P0001", glucose("2025-01-10", "95")).unwrap();
        log.add("P0002", glucose("2025-01-11", "88")).unwrap();
        let mut hba1c = glucose("2025-01-12", "5.4");
        hba1c.test_name = "HbA1c".into();
        log.add("P0001", hba1c).unwrap();

        assert_eq!(log.test_types(), vec!["Glucose".to_string(), "HbA1c".to_string()]);
    }

    #[test]
    fn test_numerical_trend_excludes_non_numeric_and_sorts_ascending() {
        let (_dir, mut store) = setup();
        let mut log = TestResultLog::new(&mut store);
        log.add("P0001", glucose("2025-02-10", "142")).unwrap();
        log.add("P0001", glucose("2025-01-10", "95")).unwrap();
        log.add("P0001", glucose("2025-03-10", "pending")).unwrap();
        let mut bad_date = glucose("someday", "101");
        bad_date.id = Some("bad-date".into());
        log.add("P0001", bad_date).unwrap();

        let trend = log.numerical_for_type("P0001", "Glucose");
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].value, 95.0);
        assert_eq!(trend[1].value, 142.0);
        assert!(trend[0].date < trend[1].date);
        assert_eq!(trend[0].unit, "mg/dL");
    }
}
