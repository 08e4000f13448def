// models.rs - Hospital and patient records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::capacity::BedLedger;
use crate::core_types::{HospitalId, PatientId, Timestamp};
use crate::error::{CareError, CareResult};
use crate::store::Versioned;
use crate::triage::TriageLevel;

// ============================================================
// HOSPITAL
// ============================================================

/// Hospital record
///
/// Bed counts live in a private [`BedLedger`]; they change only through
/// the capacity ledger (admission, discharge, transfer completion, override).
/// Hospitals are never deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hospital {
    pub id: HospitalId,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    beds: BedLedger,
    pub created_at: Timestamp,
    pub(crate) version: u64,
}

impl Hospital {
    /// Build a hospital from validated registration input
    pub fn register(id: HospitalId, input: NewHospital, now: Timestamp) -> CareResult<Self> {
        let beds = input.validate()?;
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            address: input.address,
            city: input.city,
            state: input.state,
            zip_code: input.zip_code,
            phone: input.phone,
            email: input.email,
            beds,
            created_at: now,
            version: 0,
        })
    }

    /// Read-only bed counts
    #[inline]
    pub fn beds(&self) -> &BedLedger {
        &self.beds
    }

    #[inline]
    pub(crate) fn beds_mut(&mut self) -> &mut BedLedger {
        &mut self.beds
    }
}

impl Versioned for Hospital {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// Hospital registration input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHospital {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub capacity: u32,
    pub available_beds: u32,
}

impl NewHospital {
    fn validate(&self) -> CareResult<BedLedger> {
        if self.name.trim().is_empty() {
            return Err(CareError::InvalidInput("hospital name is required".into()));
        }
        BedLedger::new(self.capacity, self.available_beds).map_err(|_| {
            CareError::InvalidInput(format!(
                "available beds {} cannot exceed total capacity {}",
                self.available_beds, self.capacity
            ))
        })
    }
}

// ============================================================
// PATIENT
// ============================================================

/// Patient record
///
/// `mrn` is immutable identity; `hospital_id` changes only when a transfer
/// completes. Each stored patient holds one bed at `hospital_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patient {
    pub id: PatientId,
    mrn: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    hospital_id: HospitalId,
    pub triage_level: TriageLevel,
    pub current_diagnosis: Option<String>,
    pub attending_physician: Option<String>,
    pub admission_date: Timestamp,
    pub updated_at: Timestamp,
    pub(crate) version: u64,
}

impl Patient {
    /// Build a patient record from validated admission input
    pub(crate) fn admit(
        id: PatientId,
        input: NewPatient,
        triage_level: TriageLevel,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            mrn: input.mrn.trim().to_string(),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            date_of_birth: input.date_of_birth,
            gender: input.gender,
            phone: input.phone,
            email: input.email,
            blood_type: input.blood_type,
            allergies: input.allergies,
            hospital_id: input.hospital_id,
            triage_level,
            current_diagnosis: input.current_diagnosis,
            attending_physician: input.attending_physician,
            admission_date: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Medical record number (immutable)
    #[inline]
    pub fn mrn(&self) -> &str {
        &self.mrn
    }

    /// Hospital currently holding this patient's bed
    #[inline]
    pub fn hospital_id(&self) -> HospitalId {
        self.hospital_id
    }

    /// Move the patient; only a completing transfer calls this
    pub(crate) fn relocate(&mut self, to: HospitalId, now: Timestamp) {
        self.hospital_id = to;
        self.updated_at = now;
    }
}

impl Versioned for Patient {
    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// Patient admission input
///
/// `triage_level` stays a raw string so that unknown levels are reported
/// as `InvalidInput` rather than failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPatient {
    pub mrn: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub blood_type: Option<String>,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub current_diagnosis: Option<String>,
    #[serde(default)]
    pub attending_physician: Option<String>,
    /// Omitted when nested under a hospital in a seed file
    #[serde(default)]
    pub hospital_id: HospitalId,
    pub triage_level: String,
}
