//! Transfer Core Types
//!
//! Type definitions for the transfer workflow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::state::TransferStatus;
use crate::core_types::{HospitalId, PatientId, Timestamp};
use crate::store::Versioned;
use crate::triage::{DispatchKey, TriageLevel};

/// Transfer ID - ULID-based unique identifier
///
/// Using ULID provides:
/// - Monotonic, sortable IDs
/// - No coordination needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    /// Generate a new unique TransferId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// One append-only audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditNote {
    pub at: Timestamp,
    pub actor: String,
    pub text: String,
}

/// Transfer request record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transfer {
    pub id: TransferId,
    pub patient_id: PatientId,
    pub from_hospital_id: HospitalId,
    pub to_hospital_id: HospitalId,
    pub reason: String,
    pub(crate) status: TransferStatus,
    pub priority: TriageLevel,
    pub requested_by: String,
    pub approved_by: Option<String>,
    pub completed_by: Option<String>,
    pub requested_at: Timestamp,
    pub approved_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub documents_transferred: Option<String>,
    pub(crate) notes: Vec<AuditNote>,
    pub(crate) version: u64,
}

impl Transfer {
    /// Create a new transfer record in PENDING state
    pub(crate) fn new(request: &NewTransfer, priority: TriageLevel, now: Timestamp) -> Self {
        Self {
            id: TransferId::new(),
            patient_id: request.patient_id,
            from_hospital_id: request.from_hospital_id,
            to_hospital_id: request.to_hospital_id,
            reason: request.reason.trim().to_string(),
            status: TransferStatus::Pending,
            priority,
            requested_by: request.requested_by.trim().to_string(),
            approved_by: None,
            completed_by: None,
            requested_at: now,
            approved_at: None,
            completed_at: None,
            cancelled_at: None,
            documents_transferred: request.documents_transferred.clone(),
            notes: Vec::new(),
            version: 0,
        }
    }

    #[inline]
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Audit log, oldest first
    #[inline]
    pub fn notes(&self) -> &[AuditNote] {
        &self.notes
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// True if `hospital_id` is the origin or the destination
    #[inline]
    pub fn involves(&self, hospital_id: HospitalId) -> bool {
        self.from_hospital_id == hospital_id || self.to_hospital_id == hospital_id
    }

    pub fn dispatch_key(&self) -> DispatchKey {
        DispatchKey::new(self.priority, self.requested_at)
    }

    pub(crate) fn append_note(&mut self, at: Timestamp, actor: &str, text: impl Into<String>) {
        self.notes.push(AuditNote {
            at,
            actor: actor.to_string(),
            text: text.into(),
        });
    }
}

impl Versioned for Transfer {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] patient={} {} -> {} priority={} status={}",
            self.id,
            self.patient_id,
            self.from_hospital_id,
            self.to_hospital_id,
            self.priority,
            self.status
        )
    }
}

/// Transfer request from the service layer
///
/// `priority` stays a raw string: an unknown level is a validation
/// failure reported in its place in the check order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTransfer {
    pub patient_id: PatientId,
    pub from_hospital_id: HospitalId,
    pub to_hospital_id: HospitalId,
    #[serde(alias = "transfer_reason")]
    pub reason: String,
    pub priority: String,
    pub requested_by: String,
    #[serde(default)]
    pub documents_transferred: Option<String>,
    /// Optional first audit note
    #[serde(default)]
    pub notes: Option<String>,
}

/// Listing filter; `hospital_id` matches origin or destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferFilter {
    pub status: Option<TransferStatus>,
    pub hospital_id: Option<HospitalId>,
    pub patient_id: Option<PatientId>,
}

impl TransferFilter {
    pub fn matches(&self, transfer: &Transfer) -> bool {
        self.status.is_none_or(|s| transfer.status == s)
            && self.hospital_id.is_none_or(|h| transfer.involves(h))
            && self.patient_id.is_none_or(|p| transfer.patient_id == p)
    }
}
