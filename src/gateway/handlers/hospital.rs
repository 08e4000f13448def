//! Hospital handlers (registration, bed counts, occupancy)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{
    ApiResult, CapacityQuery, CreateHospitalRequest, PageQuery, created, ok,
};
use crate::census::{HospitalStats, OccupancyAudit};
use crate::models::{Hospital, Patient};

/// Register a hospital
///
/// POST /api/hospitals
#[utoipa::path(
    post,
    path = "/api/hospitals",
    request_body = CreateHospitalRequest,
    responses(
        (status = 201, description = "Hospital registered", content_type = "application/json"),
        (status = 400, description = "Invalid parameters or available beds above capacity")
    ),
    tag = "Hospitals"
)]
pub async fn create_hospital(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateHospitalRequest>,
) -> ApiResult<Hospital> {
    req.validate()?;
    created(state.census.register_hospital(req.into())?)
}

/// List hospitals in id order
///
/// GET /api/hospitals?skip=0&limit=100
#[utoipa::path(
    get,
    path = "/api/hospitals",
    params(PageQuery),
    responses(
        (status = 200, description = "Hospitals", content_type = "application/json")
    ),
    tag = "Hospitals"
)]
pub async fn list_hospitals(
    State(state): State<Arc<AppState>>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Vec<Hospital>> {
    ok(state.census.list_hospitals(page.skip, page.limit)?)
}

#[utoipa::path(
    get,
    path = "/api/hospitals/{id}",
    params(("id" = u64, Path, description = "Hospital ID")),
    responses(
        (status = 200, description = "Hospital details", content_type = "application/json"),
        (status = 404, description = "Hospital not found")
    ),
    tag = "Hospitals"
)]
pub async fn get_hospital(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Hospital> {
    ok(state.census.hospital(id)?)
}

/// Patients currently located at a hospital
#[utoipa::path(
    get,
    path = "/api/hospitals/{id}/patients",
    params(("id" = u64, Path, description = "Hospital ID")),
    responses(
        (status = 200, description = "Patients at the hospital", content_type = "application/json"),
        (status = 404, description = "Hospital not found")
    ),
    tag = "Hospitals"
)]
pub async fn get_hospital_patients(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Vec<Patient>> {
    ok(state.census.patients_at(id)?)
}

/// Administrative override of the free-bed count
///
/// PUT /api/hospitals/{id}/capacity?available_beds=N
#[utoipa::path(
    put,
    path = "/api/hospitals/{id}/capacity",
    params(("id" = u64, Path, description = "Hospital ID"), CapacityQuery),
    responses(
        (status = 200, description = "Updated hospital", content_type = "application/json"),
        (status = 400, description = "Count outside 0..=capacity"),
        (status = 404, description = "Hospital not found")
    ),
    tag = "Hospitals"
)]
pub async fn update_capacity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<CapacityQuery>,
) -> ApiResult<Hospital> {
    ok(state.census.set_available_beds(id, query.available_beds)?)
}

#[utoipa::path(
    get,
    path = "/api/hospitals/{id}/stats",
    params(("id" = u64, Path, description = "Hospital ID")),
    responses(
        (status = 200, description = "Occupancy statistics", content_type = "application/json"),
        (status = 404, description = "Hospital not found")
    ),
    tag = "Hospitals"
)]
pub async fn get_hospital_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<HospitalStats> {
    ok(state.census.hospital_stats(id)?)
}

/// Bed counts against located patients, for every hospital
#[utoipa::path(
    get,
    path = "/api/hospitals/audit",
    responses(
        (status = 200, description = "Occupancy audit per hospital", content_type = "application/json")
    ),
    tag = "Hospitals"
)]
pub async fn audit_occupancy(State(state): State<Arc<AppState>>) -> ApiResult<Vec<OccupancyAudit>> {
    ok(state.census.audit_occupancy()?)
}
