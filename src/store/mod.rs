//! Record Store
//!
//! Durable keyed storage for hospitals, patients and transfers.
//!
//! # Contract
//!
//! - Lookup by id, lookup of patients by MRN (unique key), filtered scan.
//! - Optimistic versioning: every stored record carries a version. `Insert`
//!   stores version 1; `Update`/`Delete` must carry the version the caller
//!   read, and a successful update bumps it. A mismatch means another writer
//!   got there first.
//! - `commit` is all-or-nothing: every mutation in the batch is checked
//!   before any is applied, and a record key may appear at most once.

pub mod memory;
pub mod unit_of_work;

pub use memory::MemoryStore;
pub use unit_of_work::UnitOfWork;

use std::fmt;

use thiserror::Error;

use crate::core_types::{EntityKind, HospitalId, PatientId};
use crate::models::{Hospital, Patient};
use crate::transfer::types::{Transfer, TransferId};

/// Store-managed record version
pub trait Versioned {
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
}

/// Primary key of any stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Hospital(HospitalId),
    Patient(PatientId),
    Transfer(TransferId),
}

impl RecordKey {
    pub fn entity(&self) -> EntityKind {
        match self {
            RecordKey::Hospital(_) => EntityKind::Hospital,
            RecordKey::Patient(_) => EntityKind::Patient,
            RecordKey::Transfer(_) => EntityKind::Transfer,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Hospital(id) => write!(f, "Hospital {id}"),
            RecordKey::Patient(id) => write!(f, "Patient {id}"),
            RecordKey::Transfer(id) => write!(f, "Transfer {id}"),
        }
    }
}

/// A whole record, as written by a mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Hospital(Hospital),
    Patient(Patient),
    Transfer(Transfer),
}

impl Record {
    pub fn key(&self) -> RecordKey {
        match self {
            Record::Hospital(h) => RecordKey::Hospital(h.id),
            Record::Patient(p) => RecordKey::Patient(p.id),
            Record::Transfer(t) => RecordKey::Transfer(t.id),
        }
    }

    pub fn version(&self) -> u64 {
        match self {
            Record::Hospital(h) => h.version(),
            Record::Patient(p) => p.version(),
            Record::Transfer(t) => t.version(),
        }
    }
}

/// One staged write
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create a new record (key must be unused)
    Insert(Record),
    /// Replace a record; its `version` is the expected stored version
    Update(Record),
    /// Remove a record read at `expected_version`
    Delete {
        key: RecordKey,
        expected_version: u64,
    },
}

impl Mutation {
    pub fn key(&self) -> RecordKey {
        match self {
            Mutation::Insert(r) | Mutation::Update(r) => r.key(),
            Mutation::Delete { key, .. } => *key,
        }
    }
}

/// Record store failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{key} already exists")]
    AlreadyExists { key: RecordKey },

    #[error("{key} does not exist")]
    Missing { key: RecordKey },

    #[error("{key} version conflict: expected {expected}, found {actual}")]
    VersionConflict {
        key: RecordKey,
        expected: u64,
        actual: u64,
    },

    #[error("{entity} with key '{key}' already exists")]
    DuplicateKey { entity: EntityKind, key: String },

    #[error("{key} appears more than once in a single commit")]
    DuplicateMutation { key: RecordKey },

    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Filter passed to scans
pub type Predicate<'a, T> = &'a dyn Fn(&T) -> bool;

/// Keyed storage consumed by the engine
///
/// Scans return records ordered by primary key.
pub trait RecordStore: Send + Sync {
    fn hospital(&self, id: HospitalId) -> StoreResult<Option<Hospital>>;

    fn patient(&self, id: PatientId) -> StoreResult<Option<Patient>>;

    /// Lookup by the unique medical record number
    fn patient_by_mrn(&self, mrn: &str) -> StoreResult<Option<Patient>>;

    fn transfer(&self, id: TransferId) -> StoreResult<Option<Transfer>>;

    fn scan_hospitals(&self, predicate: Predicate<'_, Hospital>) -> StoreResult<Vec<Hospital>>;

    fn scan_patients(&self, predicate: Predicate<'_, Patient>) -> StoreResult<Vec<Patient>>;

    fn scan_transfers(&self, predicate: Predicate<'_, Transfer>) -> StoreResult<Vec<Transfer>>;

    /// Reserve the next hospital id
    fn allocate_hospital_id(&self) -> StoreResult<HospitalId>;

    /// Reserve the next patient id
    fn allocate_patient_id(&self) -> StoreResult<PatientId>;

    /// Apply every mutation or none of them
    fn commit(&self, mutations: Vec<Mutation>) -> StoreResult<()>;
}
