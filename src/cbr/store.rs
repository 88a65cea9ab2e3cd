// src/cbr/store.rs

// Append-only case storage. Cases are immutable once written and identified by
// an auto-assigned id; the YAML store rewrites its file atomically on every
// append so a reader never observes a partially written case.

// Dependencies
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::scenario::Scenario;

/// Remembered avoidance decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Auto-assigned identity
    pub id: u64,
    /// Closest obstacle distance when the command was issued
    pub distance_to_obstacle: f64,
    /// Bearing of that obstacle (degrees)
    pub bearing_angle: f64,
    /// Scenario at the time
    pub scenario: Scenario,
    /// Issued linear velocity
    pub linear_velocity: f64,
    /// Issued angular velocity
    pub angular_velocity: f64,
}

/// Case waiting for its id
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewCase {
    /// Closest obstacle distance when the command was issued
    pub distance_to_obstacle: f64,
    /// Bearing of that obstacle (degrees)
    pub bearing_angle: f64,
    /// Scenario at the time
    pub scenario: Scenario,
    /// Issued linear velocity
    pub linear_velocity: f64,
    /// Issued angular velocity
    pub angular_velocity: f64,
}

impl NewCase {
    /// Seals the case under `id`
    pub fn with_id(self, id: u64) -> Case {
        Case {
            id,
            distance_to_obstacle: self.distance_to_obstacle,
            bearing_angle: self.bearing_angle,
            scenario: self.scenario,
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
        }
    }
}

/// Case storage error types
#[derive(Debug)]
pub enum CaseStoreError {
    /// Reading or writing the backing file failed
    Io(std::io::Error),
    /// The backing file could not be encoded or decoded
    Serialization(String),
    /// A writer panicked while holding a shared store
    Poisoned,
}

impl fmt::Display for CaseStoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaseStoreError::Io(err) => write!(f, "Case store I/O error: {}", err),
            CaseStoreError::Serialization(msg) => write!(f, "Case store format error: {}", msg),
            CaseStoreError::Poisoned => write!(f, "Case store lock poisoned"),
        }
    }
}

impl std::error::Error for CaseStoreError {}

impl From<std::io::Error> for CaseStoreError {
    fn from(err: std::io::Error) -> Self {
        CaseStoreError::Io(err)
    }
}

impl From<serde_yaml::Error> for CaseStoreError {
    fn from(err: serde_yaml::Error) -> Self {
        CaseStoreError::Serialization(err.to_string())
    }
}

/// Durable, append-only collection of cases
#[cfg_attr(test, mockall::automock)]
pub trait CaseStore {
    /// Appends a case and returns it with its id
    fn append(&mut self, case: NewCase) -> Result<Case, CaseStoreError>;

    /// Every stored case, in insertion order
    fn all_cases(&self) -> Result<Vec<Case>, CaseStoreError>;
}

fn next_id(cases: &[Case]) -> u64 {
    cases.iter().map(|c| c.id).max().map_or(1, |id| id + 1)
}

/// Volatile store for simulation and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCaseStore {
    cases: Vec<Case>,
}

impl MemoryCaseStore {
    /// Empty store
    pub fn new() -> Self {
        MemoryCaseStore { cases: Vec::new() }
    }

    /// Number of stored cases
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl CaseStore for MemoryCaseStore {
    fn append(&mut self, case: NewCase) -> Result<Case, CaseStoreError> {
        let case = case.with_id(next_id(&self.cases));
        self.cases.push(case.clone());
        Ok(case)
    }

    fn all_cases(&self) -> Result<Vec<Case>, CaseStoreError> {
        Ok(self.cases.clone())
    }
}

/// Store persisted as a YAML sequence of cases
#[derive(Debug)]
pub struct YamlCaseStore {
    path: PathBuf,
    cases: Vec<Case>,
}

impl YamlCaseStore {
    /// Opens the store at `path`, starting empty when the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaseStoreError> {
        let path = path.as_ref().to_path_buf();
        let cases: Vec<Case> = if path.exists() {
            let text = fs::read_to_string(&path)?;
            if text.trim().is_empty() {
                Vec::new()
            } else {
                serde_yaml::from_str(&text)?
            }
        } else {
            Vec::new()
        };
        info!("Opened case store {} with {} cases", path.display(), cases.len());
        Ok(YamlCaseStore { path, cases })
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temporary file the next snapshot is written to before the rename
    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("yaml.tmp")
    }

    fn persist(&self) -> Result<(), CaseStoreError> {
        let text = serde_yaml::to_string(&self.cases)?;
        let tmp = self.staging_path();
        let mut file = File::create(&tmp)?;
        file.write_all(text.as_bytes())?;
        // Contents must be durable before the rename can publish them
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CaseStore for YamlCaseStore {
    fn append(&mut self, case: NewCase) -> Result<Case, CaseStoreError> {
        let case = case.with_id(next_id(&self.cases));
        self.cases.push(case.clone());
        if let Err(err) = self.persist() {
            // Memory never runs ahead of the file
            self.cases.pop();
            return Err(err);
        }
        debug!("Persisted case {} to {}", case.id, self.path.display());
        Ok(case)
    }

    fn all_cases(&self) -> Result<Vec<Case>, CaseStoreError> {
        Ok(self.cases.clone())
    }
}

/// Store shared by several decision loops; writes are serialized by the lock
#[derive(Debug)]
pub struct SharedCaseStore<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> SharedCaseStore<S> {
    /// Wraps a store for sharing
    pub fn new(store: S) -> Self {
        SharedCaseStore {
            inner: Arc::new(Mutex::new(store)),
        }
    }
}

impl<S> Clone for SharedCaseStore<S> {
    fn clone(&self) -> Self {
        SharedCaseStore {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CaseStore> CaseStore for SharedCaseStore<S> {
    fn append(&mut self, case: NewCase) -> Result<Case, CaseStoreError> {
        let mut store = self.inner.lock().map_err(|_| CaseStoreError::Poisoned)?;
        store.append(case)
    }

    fn all_cases(&self) -> Result<Vec<Case>, CaseStoreError> {
        let store = self.inner.lock().map_err(|_| CaseStoreError::Poisoned)?;
        store.all_cases()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(distance: f64) -> NewCase {
        NewCase {
            distance_to_obstacle: distance,
            bearing_angle: 10.0,
            scenario: Scenario::IsolatedObstacle,
            linear_velocity: 0.5,
            angular_velocity: -0.2,
        }
    }

    #[test]
    fn memory_store_assigns_increasing_ids() {
        let mut store = MemoryCaseStore::new();
        assert_eq!(store.append(sample(1.0)).unwrap().id, 1);
        assert_eq!(store.append(sample(2.0)).unwrap().id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn shared_store_sees_every_writer() {
        let shared = SharedCaseStore::new(MemoryCaseStore::new());
        let mut a = shared.clone();
        let mut b = shared.clone();
        a.append(sample(1.0)).unwrap();
        b.append(sample(2.0)).unwrap();
        let ids: Vec<u64> = shared.all_cases().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn yaml_append_replaces_file_with_full_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.yaml");
        let mut store = YamlCaseStore::open(&path).unwrap();
        store.append(sample(1.0)).unwrap();
        store.append(sample(2.0)).unwrap();

        assert!(!store.staging_path().exists());
        let on_disk: Vec<Case> = serde_yaml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, store.all_cases().unwrap());
    }

    #[test]
    fn yaml_append_failure_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = YamlCaseStore::open(dir.path().join("missing").join("cases.yaml")).unwrap();
        assert!(matches!(store.append(sample(1.0)), Err(CaseStoreError::Io(_))));
        assert!(store.all_cases().unwrap().is_empty());
    }
}
