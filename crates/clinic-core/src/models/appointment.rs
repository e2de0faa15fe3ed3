//! Appointment models.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::time::{parse_timestamp, TimeParseError};

pub const DEFAULT_DURATION_MINUTES: i64 = 30;

fn default_duration() -> i64 {
    DEFAULT_DURATION_MINUTES
}

/// Appointment lifecycle state.
///
/// `Completed` and `Cancelled` are terminal: no update or further
/// transition is accepted once either is reached.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// A scheduled appointment, keyed by appointment ID in the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub patient_id: String,
    /// Clinic-local start time, ISO-8601
    pub datetime: String,
    #[serde(default = "default_duration")]
    pub duration_minutes: i64,
    /// Conflict detection is scoped per doctor
    pub doctor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub status: AppointmentStatus,
    pub created_on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl Appointment {
    /// The half-open `[start, start + duration)` window this appointment
    /// occupies, if its stored datetime parses.
    pub fn time_window(&self) -> Result<(NaiveDateTime, NaiveDateTime), TimeParseError> {
        let start = parse_timestamp(&self.datetime)?;
        Ok((start, start + Duration::minutes(self.duration_minutes)))
    }
}

/// Input for scheduling a new appointment.
#[derive(Debug, Clone, Default)]
pub struct NewAppointment {
    /// Caller-supplied ID; generated when absent
    pub id: Option<String>,
    pub patient_id: String,
    pub datetime: String,
    pub duration_minutes: Option<i64>,
    pub doctor: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Partial update for a scheduled appointment.
#[derive(Debug, Clone, Default)]
pub struct AppointmentUpdate {
    pub patient_id: Option<String>,
    pub datetime: Option<String>,
    pub duration_minutes: Option<i64>,
    pub doctor: Option<String>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}
