//! MedCare - Hospital Capacity & Patient Transfers
//!
//! Tracks bed capacity across a network of hospitals and moves patients
//! between them through an auditable transfer workflow.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (HospitalId, PatientId, Timestamp)
//! - [`triage`] - Urgency levels and dispatch ordering
//! - [`capacity`] - Bed ledger and reserve/release rules
//! - [`models`] - Hospital and patient records
//! - [`store`] - Record store contract, in-memory store, unit of work
//! - [`transfer`] - Transfer state machine and coordinator
//! - [`census`] - Registration, admission, discharge, occupancy audit
//! - [`seed`] - Startup fixtures
//! - [`gateway`] - HTTP API

// Core types - must be first!
pub mod core_types;
pub mod error;

// Domain
pub mod capacity;
pub mod census;
pub mod models;
pub mod store;
pub mod transfer;
pub mod triage;

// Service plumbing
pub mod config;
pub mod gateway;
pub mod logging;
pub mod seed;

// Convenient re-exports at crate root
pub use census::{Census, Discharge, HospitalStats, OccupancyAudit, PatientFilter, TriageCount};
pub use core_types::{EntityKind, HospitalId, PatientId, Timestamp};
pub use error::{CareError, CareResult};
pub use models::{Hospital, NewHospital, NewPatient, Patient};
pub use store::{MemoryStore, RecordStore};
pub use transfer::{
    NewTransfer, Transfer, TransferCoordinator, TransferFilter, TransferId, TransferStatus,
};
pub use triage::TriageLevel;
