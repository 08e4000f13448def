//! Transfer Coordinator
//!
//! Drives the transfer lifecycle against the record store.
//! Every transition validates first, stages its writes in one
//! [`UnitOfWork`], and commits them together.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::state::TransferStatus;
use super::types::{NewTransfer, Transfer, TransferFilter, TransferId};
use crate::capacity::CapacityLedger;
use crate::core_types::{EntityKind, HospitalId, PatientId, Timestamp};
use crate::error::{CareError, CareResult};
use crate::models::{Hospital, Patient};
use crate::store::{RecordStore, UnitOfWork};
use crate::triage::TriageLevel;

/// Transfer Coordinator - validates and commits status transitions
pub struct TransferCoordinator {
    store: Arc<dyn RecordStore>,
}

impl TransferCoordinator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create a PENDING transfer
    ///
    /// # Validation order
    /// 1. patient exists
    /// 2. patient is at `from_hospital_id`
    /// 3. both hospitals exist
    /// 4. origin and destination differ
    /// 5. destination has a free bed (checked, not held)
    /// 6. patient has no other active transfer
    /// 7. priority is a known triage level
    pub fn create(&self, request: NewTransfer) -> CareResult<Transfer> {
        self.create_at(request, Utc::now())
    }

    pub(crate) fn create_at(&self, request: NewTransfer, now: Timestamp) -> CareResult<Transfer> {
        let patient = self.load_patient(request.patient_id)?;

        if patient.hospital_id() != request.from_hospital_id {
            warn!(
                patient_id = patient.id,
                expected = request.from_hospital_id,
                actual = patient.hospital_id(),
                "Transfer rejected: patient not at origin"
            );
            return Err(CareError::LocationMismatch {
                patient_id: patient.id,
                expected: request.from_hospital_id,
                actual: patient.hospital_id(),
            });
        }

        self.load_hospital(request.from_hospital_id)?;
        let destination = self.load_hospital(request.to_hospital_id)?;

        if request.from_hospital_id == request.to_hospital_id {
            return Err(CareError::InvalidInput(format!(
                "cannot transfer patient to the same hospital ({})",
                request.to_hospital_id
            )));
        }

        CapacityLedger::ensure_vacancy(&destination).inspect_err(|_| {
            warn!(
                patient_id = patient.id,
                to = destination.id,
                "Transfer rejected: destination full"
            );
        })?;

        ensure_no_active_transfer(self.store.as_ref(), patient.id, None)?;

        let priority = TriageLevel::parse(&request.priority).ok_or_else(|| {
            CareError::InvalidInput(format!("unknown triage level: {}", request.priority))
        })?;

        if request.reason.trim().is_empty() {
            return Err(CareError::InvalidInput("transfer reason is required".into()));
        }
        if request.requested_by.trim().is_empty() {
            return Err(CareError::InvalidInput("requested_by is required".into()));
        }

        let mut transfer = Transfer::new(&request, priority, now);
        if let Some(note) = non_blank(request.notes.as_deref()) {
            let actor = transfer.requested_by.clone();
            transfer.append_note(now, &actor, note);
        }
        let id = transfer.id;

        let mut uow = UnitOfWork::new(self.store.as_ref());
        uow.insert_transfer(transfer);
        // Rewriting the patient bumps its version, so two creates racing
        // for the same patient cannot both commit.
        uow.update_patient(patient);
        uow.commit()?;

        info!(
            transfer_id = %id,
            patient_id = request.patient_id,
            from = request.from_hospital_id,
            to = request.to_hospital_id,
            priority = %priority,
            "Transfer requested"
        );
        self.get(id)
    }

    /// Move a transfer to `target`
    ///
    /// The legal-transition table is consulted before anything else is read.
    /// A CANCELLED target routes to cancellation with `notes` as the reason.
    pub fn advance(
        &self,
        id: TransferId,
        target: TransferStatus,
        actor: &str,
        notes: Option<&str>,
    ) -> CareResult<Transfer> {
        self.advance_at(id, target, actor, notes, Utc::now())
    }

    pub(crate) fn advance_at(
        &self,
        id: TransferId,
        target: TransferStatus,
        actor: &str,
        notes: Option<&str>,
        now: Timestamp,
    ) -> CareResult<Transfer> {
        let transfer = self.get(id)?;
        check_transition(&transfer, target)?;
        let actor = required_actor(actor)?;

        match target {
            TransferStatus::InProgress => self.start(transfer, actor, notes, now),
            TransferStatus::Completed => self.finish(transfer, actor, notes, now),
            TransferStatus::Cancelled => {
                self.abandon(transfer, actor, notes.unwrap_or_default(), now)
            }
            // Never a legal target; check_transition already refused it
            TransferStatus::Pending => Err(CareError::InvalidTransition {
                from: transfer.status,
                to: target,
            }),
        }
    }

    /// PENDING -> IN_PROGRESS
    pub fn approve(&self, id: TransferId, actor: &str, notes: Option<&str>) -> CareResult<Transfer> {
        self.advance(id, TransferStatus::InProgress, actor, notes)
    }

    /// IN_PROGRESS -> COMPLETED
    pub fn complete(&self, id: TransferId, actor: &str, notes: Option<&str>) -> CareResult<Transfer> {
        self.advance(id, TransferStatus::Completed, actor, notes)
    }

    /// Cancel a PENDING or IN_PROGRESS transfer
    ///
    /// # Errors
    /// - `AlreadyCancelled` if it is already CANCELLED
    /// - `InvalidTransition` if it is COMPLETED
    pub fn cancel(&self, id: TransferId, actor: &str, reason: &str) -> CareResult<Transfer> {
        self.advance(id, TransferStatus::Cancelled, actor, Some(reason))
    }

    /// Generic status update from a raw status string
    pub fn update_status(
        &self,
        id: TransferId,
        raw_status: &str,
        actor: &str,
        notes: Option<&str>,
    ) -> CareResult<Transfer> {
        let target: TransferStatus = raw_status.parse().map_err(CareError::InvalidInput)?;
        self.advance(id, target, actor, notes)
    }

    pub fn get(&self, id: TransferId) -> CareResult<Transfer> {
        self.store
            .transfer(id)?
            .ok_or_else(|| CareError::not_found(EntityKind::Transfer, id))
    }

    /// Active transfers in dispatch order: most urgent first, then oldest
    ///
    /// With `hospital_id`, only transfers leaving or entering that hospital.
    pub fn list_active_by_priority(
        &self,
        hospital_id: Option<HospitalId>,
    ) -> CareResult<Vec<Transfer>> {
        let filter = |t: &Transfer| t.is_active() && hospital_id.is_none_or(|h| t.involves(h));
        let mut active = self.store.scan_transfers(&filter)?;
        active.sort_by(|a, b| {
            a.dispatch_key()
                .cmp(&b.dispatch_key())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(active)
    }

    /// Filtered listing, newest request first
    pub fn list(&self, filter: TransferFilter) -> CareResult<Vec<Transfer>> {
        let mut transfers = self.store.scan_transfers(&|t: &Transfer| filter.matches(t))?;
        transfers.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(transfers)
    }

    /// Transfer history of one patient, newest first
    ///
    /// History outlives discharge, so an unknown patient is an empty list.
    pub fn for_patient(&self, patient_id: PatientId) -> CareResult<Vec<Transfer>> {
        self.list(TransferFilter {
            patient_id: Some(patient_id),
            ..Default::default()
        })
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn start(
        &self,
        mut transfer: Transfer,
        actor: &str,
        notes: Option<&str>,
        now: Timestamp,
    ) -> CareResult<Transfer> {
        let destination = self.load_hospital(transfer.to_hospital_id)?;
        CapacityLedger::ensure_vacancy(&destination).inspect_err(|_| {
            warn!(
                transfer_id = %transfer.id,
                to = destination.id,
                "Approval rejected: destination full"
            );
        })?;
        ensure_no_active_transfer(self.store.as_ref(), transfer.patient_id, Some(transfer.id))?;

        transfer.status = TransferStatus::InProgress;
        transfer.approved_by = Some(actor.to_string());
        transfer.approved_at = Some(now);
        if let Some(note) = non_blank(notes) {
            transfer.append_note(now, actor, note);
        }

        let id = transfer.id;
        let mut uow = UnitOfWork::new(self.store.as_ref());
        uow.update_transfer(transfer);
        uow.commit()?;

        info!(transfer_id = %id, approved_by = actor, "Transfer approved");
        self.get(id)
    }

    fn finish(
        &self,
        mut transfer: Transfer,
        actor: &str,
        notes: Option<&str>,
        now: Timestamp,
    ) -> CareResult<Transfer> {
        let (from, to) = (transfer.from_hospital_id, transfer.to_hospital_id);

        let mut patient = self.load_patient(transfer.patient_id)?;
        if patient.hospital_id() != from {
            warn!(
                transfer_id = %transfer.id,
                patient_id = patient.id,
                expected = from,
                actual = patient.hospital_id(),
                "Completion rejected: patient moved since request"
            );
            return Err(CareError::LocationMismatch {
                patient_id: patient.id,
                expected: from,
                actual: patient.hospital_id(),
            });
        }

        let mut uow = UnitOfWork::new(self.store.as_ref());
        CapacityLedger::ensure_vacancy(uow.hospital(to)?).inspect_err(|_| {
            warn!(transfer_id = %transfer.id, to, "Completion rejected: destination full");
        })?;
        ensure_no_active_transfer(self.store.as_ref(), patient.id, Some(transfer.id))?;

        CapacityLedger::release(&mut uow, from)?;
        CapacityLedger::reserve(&mut uow, to)?;
        patient.relocate(to, now);
        uow.update_patient(patient);

        transfer.status = TransferStatus::Completed;
        transfer.completed_by = Some(actor.to_string());
        transfer.completed_at = Some(now);
        if let Some(note) = non_blank(notes) {
            transfer.append_note(now, actor, note);
        }
        let id = transfer.id;
        let patient_id = transfer.patient_id;
        uow.update_transfer(transfer);
        uow.commit()?;

        info!(
            transfer_id = %id,
            patient_id,
            from,
            to,
            completed_by = actor,
            "Transfer completed"
        );
        self.get(id)
    }

    fn abandon(
        &self,
        mut transfer: Transfer,
        actor: &str,
        reason: &str,
        now: Timestamp,
    ) -> CareResult<Transfer> {
        let previous = transfer.status;
        transfer.status = TransferStatus::Cancelled;
        transfer.cancelled_at = Some(now);
        let text = match non_blank(Some(reason)) {
            Some(reason) => format!("Cancelled: {reason}"),
            None => "Cancelled".to_string(),
        };
        transfer.append_note(now, actor, text);

        let id = transfer.id;
        let mut uow = UnitOfWork::new(self.store.as_ref());
        uow.update_transfer(transfer);
        uow.commit()?;

        info!(transfer_id = %id, from = %previous, cancelled_by = actor, "Transfer cancelled");
        self.get(id)
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    fn load_patient(&self, id: PatientId) -> CareResult<Patient> {
        self.store
            .patient(id)?
            .ok_or_else(|| CareError::not_found(EntityKind::Patient, id))
    }

    fn load_hospital(&self, id: HospitalId) -> CareResult<Hospital> {
        self.store
            .hospital(id)?
            .ok_or_else(|| CareError::not_found(EntityKind::Hospital, id))
    }
}

/// Fail with `ConflictingTransfer` if the patient has an active transfer
/// other than `except`
pub(crate) fn ensure_no_active_transfer(
    store: &dyn RecordStore,
    patient_id: PatientId,
    except: Option<TransferId>,
) -> CareResult<()> {
    let active = store.scan_transfers(&|t: &Transfer| {
        t.patient_id == patient_id && t.is_active() && Some(t.id) != except
    })?;
    match active.first() {
        Some(existing) => {
            warn!(
                patient_id,
                existing = %existing.id,
                status = %existing.status,
                "Patient already has an active transfer"
            );
            Err(CareError::ConflictingTransfer {
                patient_id,
                existing: existing.id,
                status: existing.status,
            })
        }
        None => Ok(()),
    }
}

fn check_transition(transfer: &Transfer, target: TransferStatus) -> CareResult<()> {
    let from = transfer.status;
    if from.can_transition_to(target) {
        return Ok(());
    }
    warn!(
        transfer_id = %transfer.id,
        from = %from,
        to = %target,
        "Illegal status transition"
    );
    if from == TransferStatus::Cancelled && target == TransferStatus::Cancelled {
        Err(CareError::AlreadyCancelled(transfer.id))
    } else {
        Err(CareError::InvalidTransition { from, to: target })
    }
}

fn required_actor(actor: &str) -> CareResult<&str> {
    let actor = actor.trim();
    if actor.is_empty() {
        return Err(CareError::InvalidInput("actor is required".into()));
    }
    Ok(actor)
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}
