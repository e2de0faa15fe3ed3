//! Patient documents: metadata CRUD tied to files in per-patient storage.
//!
//! Metadata and backing file live or die together: a failed file copy
//! aborts the metadata write, and deleting the metadata removes the file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::{ClinicError, ClinicResult};
use crate::models::{DocumentMeta, DocumentUpdate, NewDocument};
use crate::store::RecordStore;
use crate::time::now_stamp;

pub struct DocumentVault<'a> {
    store: &'a mut RecordStore,
}

impl<'a> DocumentVault<'a> {
    pub fn new(store: &'a mut RecordStore) -> Self {
        Self { store }
    }

    /// Attach a document to a patient, optionally copying a source file
    /// into the patient's storage directory. Returns the document ID.
    pub fn add(
        &mut self,
        patient_id: &str,
        data: NewDocument,
        source_file: Option<&Path>,
    ) -> ClinicResult<String> {
        if patient_id.trim().is_empty() {
            return Err(ClinicError::Validation("patient ID is required".into()));
        }
        if data.name.trim().is_empty() {
            return Err(ClinicError::Validation("document name is required".into()));
        }
        if data.category.trim().is_empty() {
            return Err(ClinicError::Validation(
                "document category is required".into(),
            ));
        }

        let id = data.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        if self
            .store
            .doc()
            .documents_metadata
            .get(patient_id)
            .is_some_and(|m| m.contains_key(&id))
        {
            return Err(ClinicError::DuplicateId(format!(
                "document {id} for patient {patient_id}"
            )));
        }

        let mut meta = DocumentMeta {
            name: data.name,
            category: data.category,
            date: data.date,
            source: data.source,
            description: data.description,
            file_name: None,
            file_extension: None,
            file_size: None,
            created_on: now_stamp(),
            last_updated: None,
        };

        // Copy the file before touching metadata: a failed copy leaves no
        // orphaned metadata behind.
        if let Some(source) = source_file {
            let (file_name, extension, size) = self.store_file(patient_id, &id, source)?;
            meta.file_name = Some(file_name);
            meta.file_extension = Some(extension);
            meta.file_size = Some(size);
        }

        self.store
            .doc_mut()
            .documents_metadata
            .entry(patient_id.to_string())
            .or_default()
            .insert(id.clone(), meta);
        self.store.save()?;
        info!(patient_id = %patient_id, document_id = %id, "document added");
        Ok(id)
    }

    /// Apply a partial update, optionally replacing the backing file.
    pub fn update(
        &mut self,
        patient_id: &str,
        document_id: &str,
        changes: DocumentUpdate,
        new_file: Option<&Path>,
    ) -> ClinicResult<()> {
        let old_file_name = self
            .store
            .doc()
            .documents_metadata
            .get(patient_id)
            .and_then(|m| m.get(document_id))
            .ok_or_else(|| {
                ClinicError::NotFound(format!("document {document_id} for patient {patient_id}"))
            })?
            .file_name
            .clone();

        let mut file_fields = None;
        if let Some(source) = new_file {
            let (file_name, extension, size) = self.store_file(patient_id, document_id, source)?;
            // A replacement with a different extension leaves the old file
            // behind under its old name; remove it.
            if let Some(old) = &old_file_name {
                if *old != file_name {
                    let old_path = self.store.documents_dir().join(patient_id).join(old);
                    if old_path.exists() {
                        fs::remove_file(&old_path)?;
                    }
                }
            }
            file_fields = Some((file_name, extension, size));
        }

        let meta = self
            .store
            .doc_mut()
            .documents_metadata
            .get_mut(patient_id)
            .and_then(|m| m.get_mut(document_id))
            .ok_or_else(|| {
                ClinicError::NotFound(format!("document {document_id} for patient {patient_id}"))
            })?;
        if let Some(v) = changes.name {
            meta.name = v;
        }
        if let Some(v) = changes.category {
            meta.category = v;
        }
        if let Some(v) = changes.date {
            meta.date = Some(v);
        }
        if let Some(v) = changes.source {
            meta.source = Some(v);
        }
        if let Some(v) = changes.description {
            meta.description = Some(v);
        }
        if let Some((file_name, extension, size)) = file_fields {
            meta.file_name = Some(file_name);
            meta.file_extension = Some(extension);
            meta.file_size = Some(size);
        }
        meta.last_updated = Some(now_stamp());

        self.store.save()?;
        info!(patient_id = %patient_id, document_id = %document_id, "document updated");
        Ok(())
    }

    /// Delete a document and its backing file, pruning the patient key
    /// once empty.
    pub fn delete(&mut self, patient_id: &str, document_id: &str) -> ClinicResult<()> {
        let file_name = self
            .store
            .doc()
            .documents_metadata
            .get(patient_id)
            .and_then(|m| m.get(document_id))
            .ok_or_else(|| {
                ClinicError::NotFound(format!("document {document_id} for patient {patient_id}"))
            })?
            .file_name
            .clone();

        if let Some(file_name) = file_name {
            let path = self.store.documents_dir().join(patient_id).join(&file_name);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }

        let doc = self.store.doc_mut();
        if let Some(patient_docs) = doc.documents_metadata.get_mut(patient_id) {
            patient_docs.remove(document_id);
            if patient_docs.is_empty() {
                doc.documents_metadata.remove(patient_id);
            }
        }
        self.store.save()?;
        info!(patient_id = %patient_id, document_id = %document_id, "document deleted");
        Ok(())
    }

    pub fn get(&self, patient_id: &str, document_id: &str) -> Option<&DocumentMeta> {
        self.store
            .doc()
            .documents_metadata
            .get(patient_id)
            .and_then(|m| m.get(document_id))
    }

    /// Absolute path of a document's backing file, if one is attached.
    pub fn file_path(&self, patient_id: &str, document_id: &str) -> Option<PathBuf> {
        let meta = self.get(patient_id, document_id)?;
        let file_name = meta.file_name.as_ref()?;
        Some(self.store.documents_dir().join(patient_id).join(file_name))
    }

    /// All documents for a patient, newest first.
    pub fn for_patient(&self, patient_id: &str) -> Vec<(String, DocumentMeta)> {
        let mut out: Vec<(String, DocumentMeta)> = self
            .store
            .doc()
            .documents_metadata
            .get(patient_id)
            .map(|m| m.iter().map(|(id, d)| (id.clone(), d.clone())).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| b.1.created_on.cmp(&a.1.created_on));
        out
    }

    /// A patient's documents in one category, newest first.
    pub fn by_category(&self, patient_id: &str, category: &str) -> Vec<(String, DocumentMeta)> {
        let mut out = self.for_patient(patient_id);
        out.retain(|(_, d)| d.category == category);
        out
    }

    /// Distinct categories across all patients, sorted.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .store
            .doc()
            .documents_metadata
            .values()
            .flat_map(|m| m.values())
            .map(|d| d.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Copy `source` into the patient's storage directory as
    /// `<document_id><ext>`. Returns (file_name, extension, size).
    fn store_file(
        &self,
        patient_id: &str,
        document_id: &str,
        source: &Path,
    ) -> ClinicResult<(String, String, u64)> {
        let extension = source
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let file_name = format!("{document_id}{extension}");
        let target = self.store.patient_documents_dir(patient_id)?.join(&file_name);
        fs::copy(source, &target)?;
        let size = fs::metadata(&target)?.len();
        Ok((file_name, extension, size))
    }
}
