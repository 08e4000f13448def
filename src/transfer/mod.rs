//! Patient Transfer Workflow
//!
//! Moves a patient between hospitals through a validated, audited
//! lifecycle while keeping bed counts consistent with patient location.
//!
//! # State Machine
//!
//! ```text
//! PENDING → IN_PROGRESS → COMPLETED
//!    ↓           ↓
//! CANCELLED   CANCELLED
//! ```
//!
//! # Consistency Rules
//!
//! 1. **Check, don't hold**: a request checks the destination for a free bed
//!    but reserves nothing. Vacancy is re-checked at approval and again at
//!    completion.
//! 2. **One active transfer per patient**: re-checked at every forward step.
//! 3. **Atomic completion**: patient relocation, origin release and
//!    destination reserve commit together or not at all.
//! 4. **Cancellation is free**: a cancelled transfer never held a bed, so
//!    cancelling only appends to the audit log.

pub mod coordinator;
pub mod state;
pub mod types;

#[cfg(test)]
mod integration_tests;

pub use coordinator::TransferCoordinator;
pub(crate) use coordinator::ensure_no_active_transfer;
pub use state::TransferStatus;
pub use types::{AuditNote, NewTransfer, Transfer, TransferFilter, TransferId};
