//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.
//! They provide semantic meaning and enable future type evolution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hospital ID - assigned by the record store, never reused.
///
/// # Usage:
/// - Primary key for hospitals
/// - Foreign key on patients (current location) and transfers (origin/destination)
pub type HospitalId = u64;

/// Patient ID - assigned by the record store on admission.
///
/// The medical record number (MRN) is the patient's business identity;
/// this id is the storage key.
pub type PatientId = u64;

/// Wall-clock instant (UTC) used for every audit timestamp.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Entity families held by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Hospital,
    Patient,
    Transfer,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Hospital => "Hospital",
            EntityKind::Patient => "Patient",
            EntityKind::Transfer => "Transfer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
