//! The record store: one JSON document on disk, mirrored in memory.
//!
//! Every subsystem reads and mutates its slice of [`ClinicDocument`] and then
//! calls [`RecordStore::save`], which rewrites the whole file. Saves go
//! through a temp file and an atomic rename, so a failed write leaves the
//! previous on-disk state intact; the outgoing file is copied into a rotating
//! backup set first.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ClinicResult;
use crate::models::{ActiveVisit, Appointment, DocumentMeta, Patient, TestResult, VisitRecord};
use crate::time;

const STORE_FILE: &str = "clinic_records.json";
const BACKUPS_DIR: &str = "backups";
const DOCUMENTS_DIR: &str = "patient_documents";

/// Rotating backups retained per store file.
const BACKUP_KEEP: usize = 10;

/// The persisted document. Collections introduced after the first release
/// (`appointments`, `test_results`, `documents_metadata`) default to empty
/// so older files load cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicDocument {
    pub clinic_name: String,
    pub clinic_address: String,
    pub clinic_phone: String,
    pub clinic_email: String,
    pub doctors: Vec<String>,
    pub specialties: Vec<String>,
    pub visit_reasons: Vec<String>,
    pub patients: BTreeMap<String, Patient>,
    /// At most one entry per patient; the key enforces the invariant.
    pub active_visits: BTreeMap<String, ActiveVisit>,
    pub archived_visits: BTreeMap<String, Vec<VisitRecord>>,
    #[serde(default)]
    pub appointments: BTreeMap<String, Appointment>,
    #[serde(default)]
    pub test_results: BTreeMap<String, BTreeMap<String, TestResult>>,
    #[serde(default)]
    pub documents_metadata: BTreeMap<String, BTreeMap<String, DocumentMeta>>,
}

impl Default for ClinicDocument {
    fn default() -> Self {
        Self {
            clinic_name: "Medical Clinic".into(),
            clinic_address: "123 Health St, Medical City".into(),
            clinic_phone: "123-456-7890".into(),
            clinic_email: "info@medicalclinic.com".into(),
            doctors: vec!["Dr. Smith".into(), "Dr. Johnson".into(), "Dr. Williams".into()],
            specialties: vec![
                "General Medicine".into(),
                "Pediatrics".into(),
                "Cardiology".into(),
                "Dermatology".into(),
                "Orthopedics".into(),
            ],
            visit_reasons: vec![
                "Check-up".into(),
                "Follow-up".into(),
                "Consultation".into(),
                "Prescription Renewal".into(),
                "Test Results".into(),
                "Emergency".into(),
                "Other".into(),
            ],
            patients: BTreeMap::new(),
            active_visits: BTreeMap::new(),
            archived_visits: BTreeMap::new(),
            appointments: BTreeMap::new(),
            test_results: BTreeMap::new(),
            documents_metadata: BTreeMap::new(),
        }
    }
}

/// Owner of the in-memory document and its on-disk mirror.
pub struct RecordStore {
    data_dir: PathBuf,
    doc: ClinicDocument,
}

impl RecordStore {
    /// Open the store rooted at `data_dir`, creating a default document if
    /// none exists yet.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> ClinicResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let path = data_dir.join(STORE_FILE);
        let store = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let doc: ClinicDocument = serde_json::from_str(&raw)?;
            info!(path = %path.display(), "loaded clinic records");
            Self { data_dir, doc }
        } else {
            let store = Self {
                data_dir,
                doc: ClinicDocument::default(),
            };
            store.save()?;
            info!(path = %path.display(), "created new clinic records file");
            store
        };
        Ok(store)
    }

    /// Persist the document: back up the current file, serialize to a temp
    /// file, then rename into place.
    pub fn save(&self) -> ClinicResult<()> {
        let path = self.store_path();

        // Serialize before touching anything on disk
        let raw = serde_json::to_string_pretty(&self.doc)?;

        if path.exists() {
            if let Err(e) = self.backup_current(&path) {
                // A failed backup should not block the save itself
                error!(error = %e, "backup before save failed");
            }
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;
        info!(path = %path.display(), "clinic records saved");
        Ok(())
    }

    fn backup_current(&self, path: &Path) -> std::io::Result<()> {
        let backups = self.data_dir.join(BACKUPS_DIR);
        fs::create_dir_all(&backups)?;

        let stamp = time::now().format("%Y%m%d_%H%M%S").to_string();
        let backup_path = backups.join(format!("clinic_records_{stamp}.json"));
        fs::copy(path, &backup_path)?;

        // Rotate: timestamped names sort chronologically
        let mut old: Vec<PathBuf> = fs::read_dir(&backups)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("clinic_records_") && n.ends_with(".json"))
            })
            .collect();
        old.sort();
        while old.len() > BACKUP_KEEP {
            let victim = old.remove(0);
            fs::remove_file(&victim)?;
            info!(path = %victim.display(), "removed old backup");
        }
        Ok(())
    }

    /// Read access to the whole document.
    pub fn doc(&self) -> &ClinicDocument {
        &self.doc
    }

    /// Mutable access to the whole document. Callers mutate and then `save`.
    pub fn doc_mut(&mut self) -> &mut ClinicDocument {
        &mut self.doc
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Root of the per-patient document file tree.
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join(DOCUMENTS_DIR)
    }

    /// Storage directory for one patient's document files, created on
    /// first use.
    pub fn patient_documents_dir(&self, patient_id: &str) -> ClinicResult<PathBuf> {
        let dir = self.documents_dir().join(patient_id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }
}
