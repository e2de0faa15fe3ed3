//! Domain types for the clinic record store.
//!
//! Every entity the original system kept as a loosely-typed map is a struct
//! here, with optional fields as `Option` and validation done once at the
//! subsystem boundary instead of scattered defaulted lookups.

mod appointment;
mod document;
mod patient;
mod test_result;
mod visit;

pub use appointment::{
    Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment, DEFAULT_DURATION_MINUTES,
};
pub use document::{DocumentMeta, DocumentUpdate, NewDocument};
pub use patient::{
    MedicalHistoryEntry, Medication, NewHistoryEntry, NewPatient, Patient, PatientUpdate,
};
pub use test_result::{NewTestResult, TestResult, TestResultUpdate, TrendPoint};
pub use visit::{ActiveVisit, ActiveVisitSummary, VisitDraft, VisitNotes, VisitRecord, VisitStatus};
