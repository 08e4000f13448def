//! Patient handlers (admission, discharge, triage)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CreatePatientRequest, DischargeQuery, PatientListQuery, TriageQuery,
    created, ok,
};
use crate::census::{Discharge, PatientFilter, TriageCount};
use crate::models::Patient;
use crate::triage::TriageLevel;

/// Admit a patient, taking one bed at their hospital
///
/// POST /api/patients
#[utoipa::path(
    post,
    path = "/api/patients",
    request_body = CreatePatientRequest,
    responses(
        (status = 201, description = "Patient admitted", content_type = "application/json"),
        (status = 400, description = "Invalid parameters or duplicate MRN"),
        (status = 404, description = "Hospital not found"),
        (status = 409, description = "Hospital has no available beds")
    ),
    tag = "Patients"
)]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePatientRequest>,
) -> ApiResult<Patient> {
    req.validate()?;
    created(state.census.admit_patient(req.into())?)
}

/// List patients, optionally by hospital and triage level
///
/// GET /api/patients?hospital_id=1&triage_level=CRITICAL
#[utoipa::path(
    get,
    path = "/api/patients",
    params(PatientListQuery),
    responses(
        (status = 200, description = "Patients in id order", content_type = "application/json"),
        (status = 400, description = "Unknown triage level")
    ),
    tag = "Patients"
)]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatientListQuery>,
) -> ApiResult<Vec<Patient>> {
    let triage_level = match query.triage_level.as_deref() {
        Some(raw) => Some(
            TriageLevel::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("Unknown triage level: {raw}")))?,
        ),
        None => None,
    };
    let filter = PatientFilter {
        hospital_id: query.hospital_id,
        triage_level,
        skip: query.skip,
        limit: query.limit,
    };
    ok(state.census.list_patients(filter)?)
}

#[utoipa::path(
    get,
    path = "/api/patients/{id}",
    params(("id" = u64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Patient details", content_type = "application/json"),
        (status = 404, description = "Patient not found")
    ),
    tag = "Patients"
)]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Patient> {
    ok(state.census.patient(id)?)
}

#[utoipa::path(
    get,
    path = "/api/patients/mrn/{mrn}",
    params(("mrn" = String, Path, description = "Medical record number")),
    responses(
        (status = 200, description = "Patient details", content_type = "application/json"),
        (status = 404, description = "Patient not found")
    ),
    tag = "Patients"
)]
pub async fn get_patient_by_mrn(
    State(state): State<Arc<AppState>>,
    Path(mrn): Path<String>,
) -> ApiResult<Patient> {
    ok(state.census.patient_by_mrn(&mrn)?)
}

/// Re-triage a patient
///
/// PUT /api/patients/{id}/triage?triage_level=URGENT
#[utoipa::path(
    put,
    path = "/api/patients/{id}/triage",
    params(("id" = u64, Path, description = "Patient ID"), TriageQuery),
    responses(
        (status = 200, description = "Updated patient", content_type = "application/json"),
        (status = 400, description = "Unknown triage level"),
        (status = 404, description = "Patient not found")
    ),
    tag = "Patients"
)]
pub async fn update_triage(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<TriageQuery>,
) -> ApiResult<Patient> {
    ok(state.census.update_triage(id, &query.triage_level)?)
}

/// Discharge a patient, freeing their bed
///
/// DELETE /api/patients/{id}?actor=dr.house
#[utoipa::path(
    delete,
    path = "/api/patients/{id}",
    params(("id" = u64, Path, description = "Patient ID"), DischargeQuery),
    responses(
        (status = 200, description = "Discharge confirmation", content_type = "application/json"),
        (status = 404, description = "Patient not found"),
        (status = 409, description = "Patient has an active transfer")
    ),
    tag = "Patients"
)]
pub async fn discharge_patient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<DischargeQuery>,
) -> ApiResult<Discharge> {
    ok(state.census.discharge_patient(id, &query.actor)?)
}

#[utoipa::path(
    get,
    path = "/api/patients/stats/triage-distribution",
    responses(
        (status = 200, description = "Patient count per triage level", content_type = "application/json")
    ),
    tag = "Patients"
)]
pub async fn triage_distribution(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<TriageCount>> {
    ok(state.census.triage_distribution()?)
}
