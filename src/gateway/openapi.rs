//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8000/docs`
//! - OpenAPI JSON: `http://localhost:8000/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    CreateHospitalRequest, CreatePatientRequest, CreateTransferRequest,
    UpdateTransferStatusRequest,
};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MedCare Transfer API",
        version = "1.0.0",
        description = "Inter-hospital patient transfers with bed-capacity accounting.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        // Hospitals
        crate::gateway::handlers::create_hospital,
        crate::gateway::handlers::list_hospitals,
        crate::gateway::handlers::get_hospital,
        crate::gateway::handlers::get_hospital_patients,
        crate::gateway::handlers::update_capacity,
        crate::gateway::handlers::get_hospital_stats,
        crate::gateway::handlers::audit_occupancy,
        // Patients
        crate::gateway::handlers::create_patient,
        crate::gateway::handlers::list_patients,
        crate::gateway::handlers::get_patient,
        crate::gateway::handlers::get_patient_by_mrn,
        crate::gateway::handlers::update_triage,
        crate::gateway::handlers::discharge_patient,
        crate::gateway::handlers::triage_distribution,
        // Transfers
        crate::gateway::handlers::create_transfer,
        crate::gateway::handlers::list_transfers,
        crate::gateway::handlers::list_active_transfers,
        crate::gateway::handlers::get_transfer,
        crate::gateway::handlers::update_transfer_status,
        crate::gateway::handlers::get_patient_transfers,
        crate::gateway::handlers::cancel_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            CreateHospitalRequest,
            CreatePatientRequest,
            CreateTransferRequest,
            UpdateTransferStatusRequest,
        )
    ),
    tags(
        (name = "Hospitals", description = "Registration, bed counts and occupancy"),
        (name = "Patients", description = "Admission, discharge and triage"),
        (name = "Transfers", description = "Transfer requests and their lifecycle"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
