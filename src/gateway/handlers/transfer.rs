//! Transfer handlers (state-machine driven)

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, CancelQuery, CreateTransferRequest, HospitalQuery, TransferListQuery,
    UpdateTransferStatusRequest, created, ok,
};
use crate::transfer::{Transfer, TransferFilter, TransferId, TransferStatus};

fn parse_transfer_id(raw: &str) -> Result<TransferId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid transfer id: {raw}")))
}

/// Request a transfer
///
/// POST /api/transfers
///
/// Records a PENDING transfer; no bed is held until completion.
#[utoipa::path(
    post,
    path = "/api/transfers",
    request_body = CreateTransferRequest,
    responses(
        (status = 201, description = "Transfer recorded as PENDING", content_type = "application/json"),
        (status = 400, description = "Invalid parameters or unknown priority"),
        (status = 404, description = "Patient or hospital not found"),
        (status = 409, description = "Location mismatch, no destination bed, or active transfer exists")
    ),
    tag = "Transfers"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTransferRequest>,
) -> ApiResult<Transfer> {
    req.validate()?;
    tracing::info!(
        patient_id = req.patient_id,
        from = req.from_hospital_id,
        to = req.to_hospital_id,
        "[TRACE] Transfer request received"
    );
    created(state.transfers.create(req.into())?)
}

/// List transfers, newest first
#[utoipa::path(
    get,
    path = "/api/transfers",
    params(TransferListQuery),
    responses(
        (status = 200, description = "Transfers", content_type = "application/json"),
        (status = 400, description = "Unknown status")
    ),
    tag = "Transfers"
)]
pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransferListQuery>,
) -> ApiResult<Vec<Transfer>> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(raw.parse::<TransferStatus>().map_err(ApiError::bad_request)?),
        None => None,
    };
    let filter = TransferFilter {
        status,
        hospital_id: query.hospital_id,
        patient_id: None,
    };
    ok(state.transfers.list(filter)?)
}

/// Dispatch queue: PENDING and IN_PROGRESS by urgency, then age
#[utoipa::path(
    get,
    path = "/api/transfers/active",
    params(HospitalQuery),
    responses(
        (status = 200, description = "Active transfers in dispatch order", content_type = "application/json")
    ),
    tag = "Transfers"
)]
pub async fn list_active_transfers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HospitalQuery>,
) -> ApiResult<Vec<Transfer>> {
    ok(state.transfers.list_active_by_priority(query.hospital_id)?)
}

#[utoipa::path(
    get,
    path = "/api/transfers/{id}",
    params(("id" = String, Path, description = "Transfer ID (ULID)")),
    responses(
        (status = 200, description = "Transfer details", content_type = "application/json"),
        (status = 400, description = "Malformed transfer id"),
        (status = 404, description = "Transfer not found")
    ),
    tag = "Transfers"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Transfer> {
    let id = parse_transfer_id(&id)?;
    ok(state.transfers.get(id)?)
}

/// Advance a transfer through its lifecycle
///
/// PUT /api/transfers/{id}/status
///
/// IN_PROGRESS approves, COMPLETED relocates the patient and moves the bed,
/// CANCELLED abandons with `notes` as the reason.
#[utoipa::path(
    put,
    path = "/api/transfers/{id}/status",
    params(("id" = String, Path, description = "Transfer ID (ULID)")),
    request_body = UpdateTransferStatusRequest,
    responses(
        (status = 200, description = "Updated transfer", content_type = "application/json"),
        (status = 400, description = "Unknown status or missing actor"),
        (status = 404, description = "Transfer, patient or hospital not found"),
        (status = 409, description = "Illegal transition or capacity/location check failed")
    ),
    tag = "Transfers"
)]
pub async fn update_transfer_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTransferStatusRequest>,
) -> ApiResult<Transfer> {
    req.validate()?;
    let id = parse_transfer_id(&id)?;
    ok(state
        .transfers
        .update_status(id, &req.status, &req.actor, req.notes.as_deref())?)
}

/// Transfer history of one patient, newest first
#[utoipa::path(
    get,
    path = "/api/transfers/patient/{patient_id}",
    params(("patient_id" = u64, Path, description = "Patient ID")),
    responses(
        (status = 200, description = "Transfers involving the patient", content_type = "application/json")
    ),
    tag = "Transfers"
)]
pub async fn get_patient_transfers(
    State(state): State<Arc<AppState>>,
    Path(patient_id): Path<u64>,
) -> ApiResult<Vec<Transfer>> {
    ok(state.transfers.for_patient(patient_id)?)
}

/// Cancel a transfer
///
/// DELETE /api/transfers/{id}?actor=...&reason=...
#[utoipa::path(
    delete,
    path = "/api/transfers/{id}",
    params(("id" = String, Path, description = "Transfer ID (ULID)"), CancelQuery),
    responses(
        (status = 200, description = "Cancelled transfer", content_type = "application/json"),
        (status = 404, description = "Transfer not found"),
        (status = 409, description = "Already cancelled or already completed")
    ),
    tag = "Transfers"
)]
pub async fn cancel_transfer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<CancelQuery>,
) -> ApiResult<Transfer> {
    let id = parse_transfer_id(&id)?;
    let reason = query.reason.unwrap_or_default();
    ok(state.transfers.cancel(id, &query.actor, &reason)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::error_codes;
    use crate::models::{NewHospital, NewPatient};
    use crate::store::MemoryStore;
    use axum::http::StatusCode;

    struct Fixture {
        state: Arc<AppState>,
        patient_id: u64,
        from: u64,
        to: u64,
    }

    fn fixture() -> Fixture {
        let state = Arc::new(AppState::new(Arc::new(MemoryStore::new())));
        let hospital = |name: &str| {
            state
                .census
                .register_hospital(NewHospital {
                    name: name.into(),
                    capacity: 4,
                    available_beds: 2,
                    ..Default::default()
                })
                .unwrap()
                .id
        };
        let from = hospital("County");
        let to = hospital("Regional");
        let patient_id = state
            .census
            .admit_patient(NewPatient {
                mrn: "MRN-9".into(),
                first_name: "Jane".into(),
                last_name: "Roe".into(),
                hospital_id: from,
                triage_level: "URGENT".into(),
                ..Default::default()
            })
            .unwrap()
            .id;
        Fixture {
            state,
            patient_id,
            from,
            to,
        }
    }

    fn transfer_request(f: &Fixture) -> CreateTransferRequest {
        serde_json::from_value(serde_json::json!({
            "patient_id": f.patient_id,
            "from_hospital_id": f.from,
            "to_hospital_id": f.to,
            "transfer_reason": "Needs cardiac surgery",
            "priority": "CRITICAL",
            "requested_by": "dr.grey",
        }))
        .unwrap()
    }

    fn status(status: &str, actor: &str) -> UpdateTransferStatusRequest {
        UpdateTransferStatusRequest {
            status: status.into(),
            actor: actor.into(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_transfer_lifecycle_over_handlers() {
        let f = fixture();
        let (code, Json(body)) = create_transfer(State(f.state.clone()), Json(transfer_request(&f)))
            .await
            .unwrap();
        assert_eq!(code, StatusCode::CREATED);
        let transfer = body.data.unwrap();
        assert_eq!(transfer.status(), TransferStatus::Pending);
        let id = transfer.id.to_string();

        let (code, Json(body)) = update_transfer_status(
            State(f.state.clone()),
            Path(id.clone()),
            Json(status("in_progress", "dr.white")),
        )
        .await
        .unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.data.unwrap().status(), TransferStatus::InProgress);
        let (_, Json(body)) = update_transfer_status(
            State(f.state.clone()),
            Path(id.clone()),
            Json(status("COMPLETED", "nurse.joy")),
        )
        .await
        .unwrap();
        let done = body.data.unwrap();
        assert_eq!(done.status(), TransferStatus::Completed);
        assert_eq!(done.approved_by.as_deref(), Some("dr.white"));

        let patient = f.state.census.patient(f.patient_id).unwrap();
        assert_eq!(patient.hospital_id(), f.to);
        assert_eq!(f.state.census.hospital(f.from).unwrap().beds().available(), 2);
        assert_eq!(f.state.census.hospital(f.to).unwrap().beds().available(), 1);

        let (_, Json(body)) = get_patient_transfers(State(f.state.clone()), Path(f.patient_id))
            .await
            .unwrap();
        assert_eq!(body.data.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_twice() {
        let f = fixture();
        let (_, Json(body)) = create_transfer(State(f.state.clone()), Json(transfer_request(&f)))
            .await
            .unwrap();
        let id = body.data.unwrap().id.to_string();
        let query = || CancelQuery {
            actor: "dr.grey".into(),
            reason: Some("Family declined".into()),
        };

        let (code, Json(body)) =
            cancel_transfer(State(f.state.clone()), Path(id.clone()), Query(query()))
                .await
                .unwrap();
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body.data.unwrap().status(), TransferStatus::Cancelled);
        let err = cancel_transfer(State(f.state.clone()), Path(id), Query(query()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, error_codes::ALREADY_CANCELLED);
    }

    #[tokio::test]
    async fn test_malformed_transfer_id() {
        let f = fixture();
        let err = get_transfer(State(f.state), Path("not-a-ulid".into()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_status_string() {
        let f = fixture();
        let (_, Json(body)) = create_transfer(State(f.state.clone()), Json(transfer_request(&f)))
            .await
            .unwrap();
        let id = body.data.unwrap().id.to_string();

        let err = update_transfer_status(
            State(f.state.clone()),
            Path(id),
            Json(status("TELEPORTED", "dr.white")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_PARAMETER);

        let query = TransferListQuery {
            status: Some("pending".into()),
            hospital_id: Some(f.to),
        };
        let (_, Json(body)) = list_transfers(State(f.state), Query(query)).await.unwrap();
        assert_eq!(body.data.unwrap().len(), 1);
    }
}
