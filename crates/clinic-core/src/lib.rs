//! Clinic Core Library
//!
//! Record keeping for a single-desk medical clinic: patient registration,
//! visit tracking, appointment scheduling, lab results, and document
//! storage, all backed by one JSON document on local disk.
//!
//! # Architecture
//!
//! ```text
//!  PatientRegistry   VisitTracker   AppointmentBook
//!         │               │               │
//!         ├───────────────┼───────────────┤
//!  TestResultLog    DocumentVault      Archiver
//!         │               │               │
//!         └───────────────▼───────────────┘
//!                    RecordStore
//!           (in-memory ClinicDocument,
//!            atomic save + rotating backups)
//! ```
//!
//! Subsystems never talk to each other; each borrows the [`RecordStore`],
//! mutates its slice of the document, and persists. There is no concurrent
//! access: every operation is a synchronous read-modify-write.
//!
//! # Core invariants
//!
//! - A patient has at most one active visit (enforced by key presence).
//! - Two `scheduled` appointments for the same doctor never overlap.
//! - History logs are append-only; updates cannot replace them.
//! - Every mutating operation validates before it mutates, so a failure
//!   leaves both memory and disk untouched.
//!
//! # Modules
//!
//! - [`store`]: the JSON record store and persistence layer
//! - [`models`]: domain types (Patient, Appointment, visits, results, ...)
//! - [`patients`]: registration, search, medical history
//! - [`visits`]: active-visit lifecycle
//! - [`scheduling`]: appointments with per-doctor conflict detection
//! - [`archive`]: retention sweep for old completed visits
//! - [`results`]: lab results and numeric trend extraction
//! - [`documents`]: document metadata tied to per-patient files

pub mod archive;
pub mod documents;
pub mod error;
pub mod models;
pub mod patients;
pub mod results;
pub mod scheduling;
pub mod store;
pub mod time;
pub mod visits;

// Re-export commonly used types
pub use archive::{Archiver, DEFAULT_CUTOFF_DAYS};
pub use documents::DocumentVault;
pub use error::{ClinicError, ClinicResult};
pub use models::{
    ActiveVisit, Appointment, AppointmentStatus, AppointmentUpdate, DocumentMeta, NewAppointment,
    NewDocument, NewPatient, NewTestResult, Patient, PatientUpdate, TestResult, TrendPoint,
    VisitDraft, VisitNotes, VisitRecord,
};
pub use patients::PatientRegistry;
pub use results::TestResultLog;
pub use scheduling::AppointmentBook;
pub use store::{ClinicDocument, RecordStore};
pub use visits::VisitTracker;
