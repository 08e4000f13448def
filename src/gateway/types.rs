//! Gateway boundary types
//!
//! - `ApiResponse<T>`: unified response envelope
//! - `ApiError`: any failure, rendered as an envelope with its HTTP status
//! - Request DTOs, validated with `validator` before they reach the engine

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CareError;
use crate::models::{NewHospital, NewPatient};
use crate::transfer::NewTransfer;
use crate::triage::TriageLevel;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload (success only)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Envelope error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4004;
    pub const LOCATION_MISMATCH: i32 = 4091;
    pub const CAPACITY_EXCEEDED: i32 = 4092;
    pub const CONFLICTING_TRANSFER: i32 = 4093;
    pub const INVALID_TRANSITION: i32 = 4094;
    pub const ALREADY_CANCELLED: i32 = 4095;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            error_codes::INVALID_PARAMETER,
            msg,
        )
    }

    pub fn into_err<T>(self) -> Result<T, Self> {
        Err(self)
    }
}

impl From<CareError> for ApiError {
    fn from(err: CareError) -> Self {
        let code = match &err {
            CareError::NotFound { .. } => error_codes::NOT_FOUND,
            CareError::InvalidInput(_) => error_codes::INVALID_PARAMETER,
            CareError::LocationMismatch { .. } => error_codes::LOCATION_MISMATCH,
            CareError::CapacityExceeded { .. } => error_codes::CAPACITY_EXCEEDED,
            CareError::ConflictingTransfer { .. } => error_codes::CONFLICTING_TRANSFER,
            CareError::InvalidTransition { .. } => error_codes::INVALID_TRANSITION,
            CareError::AlreadyCancelled(_) => error_codes::ALREADY_CANCELLED,
            CareError::InvariantViolation(_) => error_codes::INTERNAL_ERROR,
            CareError::Store(_) => error_codes::SERVICE_UNAVAILABLE,
        };
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }
        Self::new(status, code, err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::bad_request(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

pub fn created<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

// ============================================================================
// Request DTOs
// ============================================================================

fn validate_triage(level: &str) -> Result<(), ValidationError> {
    match TriageLevel::parse(level) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("unknown_triage_level")),
    }
}

/// Hospital registration
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateHospitalRequest {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Mercy General")]
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[schema(example = 50)]
    pub capacity: u32,
    #[schema(example = 12)]
    pub available_beds: u32,
}

impl From<CreateHospitalRequest> for NewHospital {
    fn from(req: CreateHospitalRequest) -> Self {
        NewHospital {
            name: req.name,
            address: req.address,
            city: req.city,
            state: req.state,
            zip_code: req.zip_code,
            phone: req.phone,
            email: req.email,
            capacity: req.capacity,
            available_beds: req.available_beds,
        }
    }
}

/// Patient admission
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "MRN12345")]
    pub mrn: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub blood_type: Option<String>,
    pub allergies: Option<String>,
    pub current_diagnosis: Option<String>,
    pub attending_physician: Option<String>,
    pub hospital_id: u64,
    #[validate(custom(function = "validate_triage"))]
    #[schema(example = "URGENT")]
    pub triage_level: String,
}

impl From<CreatePatientRequest> for NewPatient {
    fn from(req: CreatePatientRequest) -> Self {
        NewPatient {
            mrn: req.mrn,
            first_name: req.first_name,
            last_name: req.last_name,
            date_of_birth: req.date_of_birth,
            gender: req.gender,
            phone: req.phone,
            email: req.email,
            blood_type: req.blood_type,
            allergies: req.allergies,
            current_diagnosis: req.current_diagnosis,
            attending_physician: req.attending_physician,
            hospital_id: req.hospital_id,
            triage_level: req.triage_level,
        }
    }
}

/// Transfer request
///
/// Priority is checked by the engine, which reports it in its place in
/// the validation order.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTransferRequest {
    pub patient_id: u64,
    pub from_hospital_id: u64,
    pub to_hospital_id: u64,
    #[serde(alias = "transfer_reason")]
    #[validate(length(min = 1))]
    pub reason: String,
    #[schema(example = "CRITICAL")]
    pub priority: String,
    #[validate(length(min = 1, max = 100))]
    pub requested_by: String,
    pub documents_transferred: Option<String>,
    pub notes: Option<String>,
}

impl From<CreateTransferRequest> for NewTransfer {
    fn from(req: CreateTransferRequest) -> Self {
        NewTransfer {
            patient_id: req.patient_id,
            from_hospital_id: req.from_hospital_id,
            to_hospital_id: req.to_hospital_id,
            reason: req.reason,
            priority: req.priority,
            requested_by: req.requested_by,
            documents_transferred: req.documents_transferred,
            notes: req.notes,
        }
    }
}

/// Status change for an existing transfer
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTransferStatusRequest {
    #[schema(example = "IN_PROGRESS")]
    pub status: String,
    /// Approver / completer / canceller
    #[validate(length(min = 1, max = 100))]
    pub actor: String,
    pub notes: Option<String>,
}

// ============================================================================
// Query parameters
// ============================================================================

fn default_limit() -> usize {
    crate::census::DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientListQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub hospital_id: Option<u64>,
    pub triage_level: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CapacityQuery {
    pub available_beds: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TriageQuery {
    pub triage_level: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DischargeQuery {
    pub actor: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CancelQuery {
    pub actor: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HospitalQuery {
    pub hospital_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransferListQuery {
    pub status: Option<String>,
    pub hospital_id: Option<u64>,
}
