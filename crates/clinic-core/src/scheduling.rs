//! Appointment scheduling with per-doctor conflict detection.
//!
//! Two appointments for the same doctor conflict when their half-open
//! `[start, start + duration)` windows overlap. Only `scheduled`
//! appointments participate: a cancelled or completed slot frees its time.
//! Stored appointments whose datetime no longer parses are skipped during
//! the scan (logged, not raised) so dirty historical data cannot block
//! scheduling.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ClinicError, ClinicResult};
use crate::models::{
    Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment, DEFAULT_DURATION_MINUTES,
};
use crate::store::RecordStore;
use crate::time::{now_stamp, parse_date, parse_timestamp};

/// Half-open interval overlap: `[a_start, a_end)` meets `[b_start, b_end)`.
fn overlaps(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> bool {
    a_start < b_end && a_end > b_start
}

pub struct AppointmentBook<'a> {
    store: &'a mut RecordStore,
}

impl<'a> AppointmentBook<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Schedule a new appointment. Returns the assigned appointment ID.
    pub fn add(&mut self, data: NewAppointment) -> ClinicResult<String> {
        if data.patient_id.trim().is_empty() {
            return Err(ClinicError::Validation("patient ID is required".into()));
        }
        if data.datetime.trim().is_empty() {
            return Err(ClinicError::Validation(
                "appointment date and time is required".into(),
            ));
        }
        if data.doctor.trim().is_empty() {
            return Err(ClinicError::Validation("doctor is required".into()));
        }

        let id = data.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.store.doc().appointments.contains_key(&id) {
            return Err(ClinicError::DuplicateId(format!("appointment {id}")));
        }

        let duration = data.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        let start = parse_timestamp(&data.datetime)?;
        let end = start + Duration::minutes(duration);
        self.check_available(&data.doctor, start, end, None)?;

        let appointment = Appointment {
            patient_id: data.patient_id,
            datetime: data.datetime,
            duration_minutes: duration,
            doctor: data.doctor,
            reason: data.reason,
            notes: data.notes,
            status: AppointmentStatus::Scheduled,
            created_on: now_stamp(),
            last_updated: None,
            completed_on: None,
            cancelled_on: None,
            cancel_reason: None,
        };
        self.store.doc_mut().appointments.insert(id.clone(), appointment);
        self.store.save()?;
        info!(appointment_id = %id, "appointment scheduled");
        Ok(id)
    }

    /// Apply a partial update to a scheduled appointment.
    ///
    /// When the merged doctor/time differ from the stored values, the
    /// conflict check runs again against everything but this appointment.
    pub fn update(&mut self, id: &str, changes: AppointmentUpdate) -> ClinicResult<()> {
        let current = self
            .store
            .doc()
            .appointments
            .get(id)
            .ok_or_else(|| ClinicError::NotFound(format!("appointment {id}")))?;
        if current.status.is_terminal() {
            return Err(ClinicError::Validation(
                "cannot update a completed or cancelled appointment".into(),
            ));
        }

        let doctor = changes.doctor.clone().unwrap_or_else(|| current.doctor.clone());
        let datetime = changes
            .datetime
            .clone()
            .unwrap_or_else(|| current.datetime.clone());
        let duration = changes.duration_minutes.unwrap_or(current.duration_minutes);

        let reschedule = doctor != current.doctor
            || datetime != current.datetime
            || duration != current.duration_minutes;
        if reschedule {
            let start = parse_timestamp(&datetime)?;
            let end = start + Duration::minutes(duration);
            self.check_available(&doctor, start, end, Some(id))?;
        }

        let appointment = self
            .store
            .doc_mut()
            .appointments
            .get_mut(id)
            .ok_or_else(|| ClinicError::NotFound(format!("appointment {id}")))?;
        if let Some(v) = changes.patient_id {
            appointment.patient_id = v;
        }
        if let Some(v) = changes.datetime {
            appointment.datetime = v;
        }
        if let Some(v) = changes.duration_minutes {
            appointment.duration_minutes = v;
        }
        if let Some(v) = changes.doctor {
            appointment.doctor = v;
        }
        if let Some(v) = changes.reason {
            appointment.reason = Some(v);
        }
        if let Some(v) = changes.notes {
            appointment.notes = Some(v);
        }
        appointment.last_updated = Some(now_stamp());

        self.store.save()?;
        info!(appointment_id = %id, "appointment updated");
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> ClinicResult<()> {
        if self.store.doc_mut().appointments.remove(id).is_none() {
            return Err(ClinicError::NotFound(format!("appointment {id}")));
        }
        self.store.save()?;
        info!(appointment_id = %id, "appointment deleted");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Appointment> {
        self.store.doc().appointments.get(id)
    }

    pub fn all(&self) -> &std::collections::BTreeMap<String, Appointment> {
        &self.store.doc().appointments
    }

    /// All appointments for a patient, ascending by start time.
    pub fn for_patient(&self, patient_id: &str) -> Vec<(String, Appointment)> {
        self.collect_sorted(|a| a.patient_id == patient_id)
    }

    /// All appointments for a doctor, optionally limited to a date range
    /// (inclusive on both ends). Entries with unparsable datetimes are
    /// excluded when a range is given, since they cannot be placed in it.
    pub fn for_doctor(
        &self,
        doctor: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Vec<(String, Appointment)> {
        let mut out: Vec<(String, Appointment)> = self
            .store
            .doc()
            .appointments
            .iter()
            .filter(|(_, a)| a.doctor == doctor)
            .filter(|(id, a)| match range {
                None => true,
                Some((from, to)) => match parse_timestamp(&a.datetime) {
                    Ok(dt) => {
                        let d = dt.date();
                        d >= from && d <= to
                    }
                    Err(_) => {
                        warn!(appointment_id = %id, datetime = %a.datetime,
                              "skipping appointment with unparsable datetime");
                        false
                    }
                },
            })
            .map(|(id, a)| (id.clone(), a.clone()))
            .collect();
        out.sort_by(|a, b| a.1.datetime.cmp(&b.1.datetime));
        out
    }

    /// All appointments falling on a calendar date, ascending by start time.
    pub fn for_date(&self, date: NaiveDate) -> Vec<(String, Appointment)> {
        self.in_range(date, date)
    }

    /// All appointments within an inclusive date range, ascending by start
    /// time. Unparsable datetimes are skipped.
    pub fn in_range(&self, from: NaiveDate, to: NaiveDate) -> Vec<(String, Appointment)> {
        let mut out: Vec<(String, Appointment)> = self
            .store
            .doc()
            .appointments
            .iter()
            .filter(|(id, a)| match parse_date(&a.datetime) {
                Ok(d) => d >= from && d <= to,
                Err(_) => {
                    warn!(appointment_id = %id, datetime = %a.datetime,
                          "skipping appointment with unparsable datetime");
                    false
                }
            })
            .map(|(id, a)| (id.clone(), a.clone()))
            .collect();
        out.sort_by(|a, b| a.1.datetime.cmp(&b.1.datetime));
        out
    }

    /// Mark a scheduled appointment completed, with optional closing notes.
    pub fn mark_completed(&mut self, id: &str, notes: Option<&str>) -> ClinicResult<()> {
        let appointment = self
            .store
            .doc_mut()
            .appointments
            .get_mut(id)
            .ok_or_else(|| ClinicError::NotFound(format!("appointment {id}")))?;
        if appointment.status.is_terminal() {
            return Err(ClinicError::Validation(
                "appointment is already completed or cancelled".into(),
            ));
        }
        appointment.status = AppointmentStatus::Completed;
        appointment.completed_on = Some(now_stamp());
        if let Some(notes) = notes {
            appointment.notes = Some(notes.to_string());
        }
        self.store.save()?;
        info!(appointment_id = %id, "appointment completed");
        Ok(())
    }

    /// Cancel a scheduled appointment, with an optional reason.
    pub fn mark_cancelled(&mut self, id: &str, reason: Option<&str>) -> ClinicResult<()> {
        let appointment = self
            .store
            .doc_mut()
            .appointments
            .get_mut(id)
            .ok_or_else(|| ClinicError::NotFound(format!("appointment {id}")))?;
        if appointment.status.is_terminal() {
            return Err(ClinicError::Validation(
                "appointment is already completed or cancelled".into(),
            ));
        }
        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancelled_on = Some(now_stamp());
        if let Some(reason) = reason {
            appointment.cancel_reason = Some(reason.to_string());
        }
        self.store.save()?;
        info!(appointment_id = %id, "appointment cancelled");
        Ok(())
    }

    /// Error if `[start, end)` overlaps another scheduled appointment for
    /// `doctor`. `exclude` skips the appointment being rescheduled.
    fn check_available(
        &self,
        doctor: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<&str>,
    ) -> ClinicResult<()> {
        for (other_id, other) in &self.store.doc().appointments {
            if exclude == Some(other_id.as_str()) {
                continue;
            }
            if other.doctor != doctor || other.status != AppointmentStatus::Scheduled {
                continue;
            }
            let (other_start, other_end) = match other.time_window() {
                Ok(window) => window,
                Err(_) => {
                    // Permissive by policy: a dirty stored datetime must not
                    // block legitimate scheduling.
                    warn!(appointment_id = %other_id, datetime = %other.datetime,
                          "skipping appointment with unparsable datetime in conflict check");
                    continue;
                }
            };
            if overlaps(start, end, other_start, other_end) {
                return Err(ClinicError::Conflict(format!(
                    "{doctor} already has an appointment at {}",
                    other.datetime
                )));
            }
        }
        Ok(())
    }

    fn collect_sorted<F>(&self, keep: F) -> Vec<(String, Appointment)>
    where
        F: Fn(&Appointment) -> bool,
    {
        let mut out: Vec<(String, Appointment)> = self
            .store
            .doc()
            .appointments
            .iter()
            .filter(|(_, a)| keep(a))
            .map(|(id, a)| (id.clone(), a.clone()))
            .collect();
        out.sort_by(|a, b| a.1.datetime.cmp(&b.1.datetime));
        out
    }
}
