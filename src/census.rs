//! Census - hospital registration, admissions and discharges
//!
//! Every bed-count change goes through [`CapacityLedger`] inside a
//! [`UnitOfWork`], committed together with the patient write that caused it.

use std::sync::Arc;

use chrono::Utc;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::capacity::CapacityLedger;
use crate::core_types::{EntityKind, HospitalId, PatientId, Timestamp};
use crate::error::{CareError, CareResult};
use crate::models::{Hospital, NewHospital, NewPatient, Patient};
use crate::store::{RecordStore, UnitOfWork};
use crate::transfer::ensure_no_active_transfer;
use crate::triage::TriageLevel;

/// Default page size for patient listings
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Patient listing filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatientFilter {
    pub hospital_id: Option<HospitalId>,
    pub triage_level: Option<TriageLevel>,
    pub skip: usize,
    pub limit: usize,
}

impl Default for PatientFilter {
    fn default() -> Self {
        Self {
            hospital_id: None,
            triage_level: None,
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PatientFilter {
    fn matches(&self, patient: &Patient) -> bool {
        self.hospital_id.is_none_or(|h| patient.hospital_id() == h)
            && self.triage_level.is_none_or(|t| patient.triage_level == t)
    }
}

/// Confirmation returned by a discharge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discharge {
    pub patient_id: PatientId,
    pub mrn: String,
    pub hospital_id: HospitalId,
    pub discharged_by: String,
    pub discharged_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalStats {
    pub hospital_id: HospitalId,
    pub hospital_name: String,
    pub total_capacity: u32,
    pub available_beds: u32,
    pub current_patients: usize,
    /// Located patients / capacity, percent, two decimals
    pub occupancy_rate: f64,
}

/// Occupied beds vs patients located at one hospital
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OccupancyAudit {
    pub hospital_id: HospitalId,
    pub capacity: u32,
    pub available_beds: u32,
    pub occupied_beds: u32,
    pub located_patients: u32,
    /// Occupied beds with no tracked patient (administrative overrides)
    pub untracked_beds: u32,
}

impl OccupancyAudit {
    /// More patients than occupied beds cannot be explained by an override
    pub fn is_consistent(&self) -> bool {
        self.located_patients <= self.occupied_beds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TriageCount {
    pub triage_level: TriageLevel,
    pub count: usize,
}

/// Census service over a record store
pub struct Census {
    store: Arc<dyn RecordStore>,
}

impl Census {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Hospitals
    // ========================================================================

    pub fn register_hospital(&self, input: NewHospital) -> CareResult<Hospital> {
        let id = self.store.allocate_hospital_id()?;
        let hospital = Hospital::register(id, input, Utc::now())?;

        let mut uow = UnitOfWork::new(self.store.as_ref());
        uow.insert_hospital(hospital);
        uow.commit()?;

        let hospital = self.hospital(id)?;
        info!(
            hospital_id = id,
            name = %hospital.name,
            capacity = hospital.beds().capacity(),
            available = hospital.beds().available(),
            "Hospital registered"
        );
        Ok(hospital)
    }

    pub fn hospital(&self, id: HospitalId) -> CareResult<Hospital> {
        self.store
            .hospital(id)?
            .ok_or_else(|| CareError::not_found(EntityKind::Hospital, id))
    }

    /// Hospitals in id order
    pub fn list_hospitals(&self, skip: usize, limit: usize) -> CareResult<Vec<Hospital>> {
        let hospitals = self.store.scan_hospitals(&|_: &Hospital| true)?;
        Ok(hospitals.into_iter().skip(skip).take(limit).collect())
    }

    pub fn patients_at(&self, hospital_id: HospitalId) -> CareResult<Vec<Patient>> {
        self.hospital(hospital_id)?;
        self.located_at(hospital_id)
    }

    /// Administrative override of the free-bed count
    pub fn set_available_beds(
        &self,
        hospital_id: HospitalId,
        available_beds: i64,
    ) -> CareResult<Hospital> {
        let mut uow = UnitOfWork::new(self.store.as_ref());
        CapacityLedger::set_available(&mut uow, hospital_id, available_beds)?;
        uow.commit()?;

        info!(hospital_id, available_beds, "Available beds overridden");
        self.hospital(hospital_id)
    }

    pub fn hospital_stats(&self, hospital_id: HospitalId) -> CareResult<HospitalStats> {
        let hospital = self.hospital(hospital_id)?;
        let current_patients = self.located_at(hospital_id)?.len();
        let capacity = hospital.beds().capacity();

        let occupancy_rate = if capacity > 0 {
            let rate = current_patients as f64 / f64::from(capacity) * 100.0;
            (rate * 100.0).round() / 100.0
        } else {
            0.0
        };

        Ok(HospitalStats {
            hospital_id,
            hospital_name: hospital.name.clone(),
            total_capacity: capacity,
            available_beds: hospital.beds().available(),
            current_patients,
            occupancy_rate,
        })
    }

    /// Occupancy of every hospital, in id order
    pub fn audit_occupancy(&self) -> CareResult<Vec<OccupancyAudit>> {
        let hospitals = self.store.scan_hospitals(&|_: &Hospital| true)?;
        let mut located: FxHashMap<HospitalId, u32> = FxHashMap::default();
        for patient in self.store.scan_patients(&|_: &Patient| true)? {
            *located.entry(patient.hospital_id()).or_default() += 1;
        }

        Ok(hospitals
            .iter()
            .map(|h| audit(h, located.get(&h.id).copied().unwrap_or(0)))
            .collect())
    }

    /// Audit one hospital, failing if its bed count cannot cover its patients
    pub fn verify_occupancy(&self, hospital_id: HospitalId) -> CareResult<OccupancyAudit> {
        let hospital = self.hospital(hospital_id)?;
        let located = u32::try_from(self.located_at(hospital_id)?.len()).unwrap_or(u32::MAX);
        let report = audit(&hospital, located);

        if !report.is_consistent() {
            error!(
                hospital_id,
                occupied = report.occupied_beds,
                located = report.located_patients,
                "Occupancy invariant violated"
            );
            return Err(CareError::InvariantViolation(format!(
                "hospital {hospital_id} has {} patients but only {} occupied beds",
                report.located_patients, report.occupied_beds
            )));
        }
        Ok(report)
    }

    // ========================================================================
    // Patients
    // ========================================================================

    /// Admit a patient, taking one bed at their hospital
    pub fn admit_patient(&self, input: NewPatient) -> CareResult<Patient> {
        if input.mrn.trim().is_empty() {
            return Err(CareError::InvalidInput("mrn is required".into()));
        }
        if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
            return Err(CareError::InvalidInput(
                "first_name and last_name are required".into(),
            ));
        }
        let triage_level = parse_triage(&input.triage_level)?;

        let mut uow = UnitOfWork::new(self.store.as_ref());
        uow.hospital(input.hospital_id)?;

        if self.store.patient_by_mrn(input.mrn.trim())?.is_some() {
            return Err(CareError::InvalidInput(format!(
                "patient with MRN '{}' already exists",
                input.mrn.trim()
            )));
        }

        CapacityLedger::reserve(&mut uow, input.hospital_id).inspect_err(|_| {
            warn!(hospital_id = input.hospital_id, "Admission rejected: no free bed");
        })?;

        let id = self.store.allocate_patient_id()?;
        let patient = Patient::admit(id, input, triage_level, Utc::now());
        let hospital_id = patient.hospital_id();
        uow.insert_patient(patient);
        uow.commit()?;

        info!(patient_id = id, hospital_id, triage = %triage_level, "Patient admitted");
        self.patient(id)
    }

    /// Discharge a patient, freeing their bed
    ///
    /// # Errors
    /// - `ConflictingTransfer` while the patient has an active transfer
    pub fn discharge_patient(&self, id: PatientId, actor: &str) -> CareResult<Discharge> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(CareError::InvalidInput("actor is required".into()));
        }
        let patient = self.patient(id)?;
        ensure_no_active_transfer(self.store.as_ref(), id, None)?;

        let mut uow = UnitOfWork::new(self.store.as_ref());
        CapacityLedger::release(&mut uow, patient.hospital_id())?;
        uow.delete_patient(&patient);
        uow.commit()?;

        let discharge = Discharge {
            patient_id: id,
            mrn: patient.mrn().to_string(),
            hospital_id: patient.hospital_id(),
            discharged_by: actor.to_string(),
            discharged_at: Utc::now(),
        };
        info!(
            patient_id = id,
            hospital_id = discharge.hospital_id,
            discharged_by = actor,
            "Patient discharged"
        );
        Ok(discharge)
    }

    pub fn patient(&self, id: PatientId) -> CareResult<Patient> {
        self.store
            .patient(id)?
            .ok_or_else(|| CareError::not_found(EntityKind::Patient, id))
    }

    pub fn patient_by_mrn(&self, mrn: &str) -> CareResult<Patient> {
        self.store
            .patient_by_mrn(mrn.trim())?
            .ok_or_else(|| CareError::not_found(EntityKind::Patient, mrn))
    }

    pub fn list_patients(&self, filter: PatientFilter) -> CareResult<Vec<Patient>> {
        let patients = self.store.scan_patients(&|p: &Patient| filter.matches(p))?;
        Ok(patients
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit)
            .collect())
    }

    pub fn update_triage(&self, id: PatientId, raw_level: &str) -> CareResult<Patient> {
        let level = parse_triage(raw_level)?;
        let mut patient = self.patient(id)?;
        let previous = patient.triage_level;
        patient.triage_level = level;
        patient.updated_at = Utc::now();

        let mut uow = UnitOfWork::new(self.store.as_ref());
        uow.update_patient(patient);
        uow.commit()?;

        info!(patient_id = id, from = %previous, to = %level, "Triage level updated");
        self.patient(id)
    }

    /// Patient count per level, most urgent first
    pub fn triage_distribution(&self) -> CareResult<Vec<TriageCount>> {
        let patients = self.store.scan_patients(&|_: &Patient| true)?;
        Ok(TriageLevel::ALL
            .iter()
            .map(|&level| TriageCount {
                triage_level: level,
                count: patients.iter().filter(|p| p.triage_level == level).count(),
            })
            .collect())
    }

    fn located_at(&self, hospital_id: HospitalId) -> CareResult<Vec<Patient>> {
        Ok(self
            .store
            .scan_patients(&|p: &Patient| p.hospital_id() == hospital_id)?)
    }
}

fn parse_triage(raw: &str) -> CareResult<TriageLevel> {
    TriageLevel::parse(raw)
        .ok_or_else(|| CareError::InvalidInput(format!("unknown triage level: {raw}")))
}

fn audit(hospital: &Hospital, located_patients: u32) -> OccupancyAudit {
    let beds = hospital.beds();
    OccupancyAudit {
        hospital_id: hospital.id,
        capacity: beds.capacity(),
        available_beds: beds.available(),
        occupied_beds: beds.occupied(),
        located_patients,
        untracked_beds: beds.occupied().saturating_sub(located_patients),
    }
}
