//! Application Store - Applications and reviews as JSON files on disk
//!
//! Everything is loaded at start-up; each change is written through
//! immediately. Layout under the storage root:
//!
//! ```text
//! institutions.json           organisations offered in the form
//! applications/{uuid}.json
//! reviews/{uuid}.json
//! datasets/{uuid}/...          uploaded data files
//! {uuid}_Budget_Template       uploaded budget
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{ApplicationFields, ApplicationForm, DatasetFile, Institution, Review};

/// Default storage root (relative to current dir)
pub const DEFAULT_STORAGE_DIR: &str = ".fairfund";

/// Store for applications and their reviews
pub struct ApplicationStore {
    /// Storage root
    root: PathBuf,
    /// Loaded applications (uuid -> application)
    applications: HashMap<Uuid, ApplicationForm>,
    /// Loaded reviews (application uuid -> review)
    reviews: HashMap<Uuid, Review>,
    /// Institutions offered in the form, in display order
    institutions: Vec<Institution>,
}

impl ApplicationStore {
    /// Open the store at `root`, loading everything already on disk
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let mut store = Self {
            root: root.as_ref().to_path_buf(),
            applications: HashMap::new(),
            reviews: HashMap::new(),
            institutions: Vec::new(),
        };
        fs::create_dir_all(store.applications_dir())?;
        fs::create_dir_all(store.reviews_dir())?;

        store.applications = load_dir::<ApplicationForm>(&store.applications_dir())
            .into_iter()
            .map(|form| (form.uuid, form))
            .collect();
        store.reviews = load_dir::<Review>(&store.reviews_dir())
            .into_iter()
            .map(|review| (review.application_uuid, review))
            .collect();
        store.institutions = store.load_institutions()?;

        tracing::info!(
            "Loaded {} application(s), {} review(s) and {} institution(s) from {}",
            store.applications.len(),
            store.reviews.len(),
            store.institutions.len(),
            store.root.display()
        );
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn applications_dir(&self) -> PathBuf {
        self.root.join("applications")
    }

    fn reviews_dir(&self) -> PathBuf {
        self.root.join("reviews")
    }

    fn institutions_path(&self) -> PathBuf {
        self.root.join("institutions.json")
    }

    /// Read `institutions.json`, writing the default list when it is missing
    fn load_institutions(&self) -> StoreResult<Vec<Institution>> {
        let path = self.institutions_path();
        if path.exists() {
            return Ok(serde_json::from_str(&fs::read_to_string(&path)?)?);
        }
        let defaults = Institution::defaults();
        write_json(&path, &defaults)?;
        Ok(defaults)
    }

    pub fn institutions(&self) -> &[Institution] {
        &self.institutions
    }

    pub fn has_institution(&self, uuid: &Uuid) -> bool {
        self.institutions.iter().any(|i| i.uuid == *uuid)
    }

    /// Where the budget template of an application is kept
    pub fn budget_path(&self, uuid: &Uuid) -> PathBuf {
        self.root.join(format!("{}_Budget_Template", uuid))
    }

    /// Directory holding the data files of a dataset
    pub fn dataset_dir(&self, uuid: &Uuid) -> PathBuf {
        self.root.join("datasets").join(uuid.to_string())
    }

    /// All applications, oldest first
    pub fn list(&self) -> Vec<&ApplicationForm> {
        let mut all: Vec<_> = self.applications.values().collect();
        all.sort_by_key(|form| form.created_at);
        all
    }

    /// Get an application by UUID
    pub fn get(&self, uuid: &Uuid) -> Option<&ApplicationForm> {
        self.applications.get(uuid)
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.applications.contains_key(uuid)
    }

    /// Create and persist an empty application
    pub fn create(&mut self) -> StoreResult<Uuid> {
        let form = ApplicationForm::new();
        let uuid = form.uuid;
        self.persist_application(&form)?;
        self.applications.insert(uuid, form);
        Ok(uuid)
    }

    /// Replace the editable fields; `submit` marks the application submitted
    pub fn update(&mut self, uuid: &Uuid, fields: ApplicationFields, submit: bool) -> StoreResult<()> {
        self.modify(uuid, |form| {
            form.fields = fields;
            form.submitted = form.submitted || submit;
        })
    }

    /// Remember the original name of the uploaded budget
    pub fn set_budget_filename(&mut self, uuid: &Uuid, filename: String) -> StoreResult<()> {
        self.modify(uuid, |form| form.budget_filename = Some(filename))
    }

    fn modify(&mut self, uuid: &Uuid, change: impl FnOnce(&mut ApplicationForm)) -> StoreResult<()> {
        let mut form = self
            .applications
            .get(uuid)
            .cloned()
            .ok_or(StoreError::NotFound(*uuid))?;
        change(&mut form);
        form.updated_at = Utc::now();

        // Memory only changes once the disk write went through.
        self.persist_application(&form)?;
        self.applications.insert(*uuid, form);
        Ok(())
    }

    /// Store reviewer scores, replacing earlier ones
    pub fn save_review(&mut self, uuid: &Uuid, scores: BTreeMap<String, String>) -> StoreResult<()> {
        if !self.contains(uuid) {
            return Err(StoreError::NotFound(*uuid));
        }
        let review = Review {
            application_uuid: *uuid,
            scores,
            submitted_at: Utc::now(),
        };
        write_json(&self.reviews_dir().join(format!("{}.json", uuid)), &review)?;
        self.reviews.insert(*uuid, review);
        Ok(())
    }

    pub fn review(&self, uuid: &Uuid) -> Option<&Review> {
        self.reviews.get(uuid)
    }

    /// Files uploaded for a dataset, sorted by name; empty when none
    pub fn dataset_files(&self, uuid: &Uuid) -> StoreResult<Vec<DatasetFile>> {
        let dir = self.dataset_dir(uuid);
        let mut files = Vec::new();
        if dir.exists() {
            collect_files(&dir, &dir, &mut files)?;
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn persist_application(&self, form: &ApplicationForm) -> StoreResult<()> {
        write_json(&self.applications_dir().join(format!("{}.json", form.uuid)), form)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

/// Every parseable `*.json` file in `dir`; unreadable files are skipped
fn load_dir<T: DeserializeOwned>(dir: &Path) -> Vec<T> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };

    let mut loaded = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "json") {
            match fs::read_to_string(&path).map(|content| serde_json::from_str::<T>(&content)) {
                Ok(Ok(value)) => loaded.push(value),
                Ok(Err(e)) => tracing::warn!("Skipping {}: {}", path.display(), e),
                Err(e) => tracing::warn!("Cannot read {}: {}", path.display(), e),
            }
        }
    }
    loaded
}

fn collect_files(base: &Path, dir: &Path, files: &mut Vec<DatasetFile>) -> StoreResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;
        if metadata.is_dir() {
            collect_files(base, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            files.push(DatasetFile {
                name: relative.to_string_lossy().replace('\\', "/"),
                size: metadata.len(),
            });
        }
    }
    Ok(())
}
