//! Scenario tests for the transfer workflow
//!
//! Drive the coordinator and census together against `MemoryStore` and
//! check the bed/location invariants after every step.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::census::Census;
use crate::core_types::{HospitalId, PatientId};
use crate::error::CareError;
use crate::models::{NewHospital, NewPatient};
use crate::store::{MemoryStore, Mutation, Record, RecordStore};
use crate::transfer::{NewTransfer, TransferCoordinator, TransferFilter, TransferStatus};
use crate::triage::TriageLevel;

struct TestHarness {
    store: Arc<MemoryStore>,
    census: Census,
    coordinator: TransferCoordinator,
}

impl TestHarness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn RecordStore> = store.clone();
        Self {
            census: Census::new(shared.clone()),
            coordinator: TransferCoordinator::new(shared),
            store,
        }
    }

    fn hospital(&self, name: &str, capacity: u32, available_beds: u32) -> HospitalId {
        self.census
            .register_hospital(NewHospital {
                name: name.into(),
                capacity,
                available_beds,
                ..Default::default()
            })
            .unwrap()
            .id
    }

    fn admit(&self, mrn: &str, hospital_id: HospitalId) -> PatientId {
        self.census
            .admit_patient(NewPatient {
                mrn: mrn.into(),
                first_name: "Pat".into(),
                last_name: mrn.into(),
                hospital_id,
                triage_level: "URGENT".into(),
                ..Default::default()
            })
            .unwrap()
            .id
    }

    fn available(&self, hospital_id: HospitalId) -> u32 {
        self.census.hospital(hospital_id).unwrap().beds().available()
    }

    fn location(&self, patient_id: PatientId) -> HospitalId {
        self.census.patient(patient_id).unwrap().hospital_id()
    }

    /// Invariants that must hold after every committed operation
    fn assert_consistent(&self) {
        for report in self.census.audit_occupancy().unwrap() {
            assert!(report.available_beds <= report.capacity);
            assert!(report.is_consistent(), "{report:?}");
        }
        let active = self
            .store
            .scan_transfers(&|t: &crate::transfer::Transfer| t.is_active())
            .unwrap();
        let mut patients: Vec<PatientId> = active.iter().map(|t| t.patient_id).collect();
        patients.sort_unstable();
        patients.dedup();
        assert_eq!(patients.len(), active.len(), "patient with two active transfers");
    }
}

fn request(patient_id: PatientId, from: HospitalId, to: HospitalId, priority: &str) -> NewTransfer {
    NewTransfer {
        patient_id,
        from_hospital_id: from,
        to_hospital_id: to,
        reason: "Requires cardiac surgery".into(),
        priority: priority.into(),
        requested_by: "dr.smith".into(),
        ..Default::default()
    }
}

// ========================================================================
// End-to-end
// ========================================================================

/// Full lifecycle: blocked by a full destination, retried after a bed frees
#[test]
fn test_full_lifecycle_after_bed_frees() {
    let h = TestHarness::new();
    let a = h.hospital("A", 10, 2);
    let b = h.hospital("B", 5, 0);
    let p = h.admit("MRN-P", a);
    assert_eq!(h.available(a), 1);

    assert!(matches!(
        h.coordinator.create(request(p, a, b, "URGENT")),
        Err(CareError::CapacityExceeded { hospital_id, .. }) if hospital_id == b
    ));
    assert!(h.coordinator.for_patient(p).unwrap().is_empty());

    h.census.set_available_beds(b, 1).unwrap();
    let transfer = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();
    assert_eq!(transfer.status(), TransferStatus::Pending);
    // Requesting holds nothing
    assert_eq!(h.available(b), 1);

    let transfer = h.coordinator.approve(transfer.id, "dr.jones", None).unwrap();
    assert_eq!(transfer.status(), TransferStatus::InProgress);
    assert!(transfer.approved_at.is_some());
    assert_eq!(transfer.approved_by.as_deref(), Some("dr.jones"));

    let transfer = h
        .coordinator
        .complete(transfer.id, "nurse.ratched", Some("Arrived by ambulance"))
        .unwrap();
    assert_eq!(transfer.status(), TransferStatus::Completed);
    assert!(transfer.completed_at.is_some());
    assert_eq!(transfer.notes().len(), 1);

    assert_eq!(h.location(p), b);
    assert_eq!(h.available(a), 2);
    assert_eq!(h.available(b), 0);
    h.assert_consistent();
}

#[test]
fn test_second_completion_is_rejected() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 4);
    let p = h.admit("MRN-P", a);

    let t = h.coordinator.create(request(p, a, b, "CRITICAL")).unwrap();
    h.coordinator.approve(t.id, "dr.jones", None).unwrap();
    h.coordinator.complete(t.id, "dr.jones", None).unwrap();
    let (avail_a, avail_b) = (h.available(a), h.available(b));

    assert_eq!(
        h.coordinator.complete(t.id, "dr.jones", None).unwrap_err(),
        CareError::InvalidTransition {
            from: TransferStatus::Completed,
            to: TransferStatus::Completed
        }
    );
    assert_eq!((h.available(a), h.available(b)), (avail_a, avail_b));
    h.assert_consistent();
}

#[test]
fn test_cancel_rules() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 4);
    let p = h.admit("MRN-P", a);
    let q = h.admit("MRN-Q", a);

    // Completed transfers cannot be cancelled
    let done = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();
    h.coordinator.approve(done.id, "dr.jones", None).unwrap();
    h.coordinator.complete(done.id, "dr.jones", None).unwrap();
    assert!(matches!(
        h.coordinator.cancel(done.id, "dr.jones", "changed mind"),
        Err(CareError::InvalidTransition {
            from: TransferStatus::Completed,
            to: TransferStatus::Cancelled
        })
    ));

    // In-progress cancel: note appended, beds untouched
    let before = (h.available(a), h.available(b));
    let t = h.coordinator.create(request(q, a, b, "URGENT")).unwrap();
    h.coordinator.approve(t.id, "dr.jones", None).unwrap();
    let cancelled = h
        .coordinator
        .cancel(t.id, "dr.house", "Patient stabilised")
        .unwrap();
    assert_eq!(cancelled.status(), TransferStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    let note = cancelled.notes().last().unwrap();
    assert_eq!(note.actor, "dr.house");
    assert!(note.text.contains("Patient stabilised"));
    assert_eq!((h.available(a), h.available(b)), before);

    assert_eq!(
        h.coordinator.cancel(t.id, "dr.house", "again").unwrap_err(),
        CareError::AlreadyCancelled(t.id)
    );
    h.assert_consistent();
}

#[test]
fn test_dispatch_order() {
    let h = TestHarness::new();
    let a = h.hospital("A", 10, 10);
    let b = h.hospital("B", 10, 10);
    let c = h.hospital("C", 10, 10);
    let p1 = h.admit("MRN-1", a);
    let p2 = h.admit("MRN-2", a);
    let p3 = h.admit("MRN-3", c);

    let t1 = Utc::now();
    let t2 = t1 + Duration::seconds(10);
    let t3 = t1 + Duration::seconds(20);
    let non_urgent = h
        .coordinator
        .create_at(request(p1, a, b, "NON_URGENT"), t1)
        .unwrap();
    let critical = h
        .coordinator
        .create_at(request(p2, a, b, "CRITICAL"), t2)
        .unwrap();
    let urgent = h
        .coordinator
        .create_at(request(p3, c, a, "urgent"), t3)
        .unwrap();

    let order: Vec<_> = h
        .coordinator
        .list_active_by_priority(None)
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(order, vec![critical.id, urgent.id, non_urgent.id]);

    // Hospital filter matches origin or destination
    let at_c: Vec<_> = h
        .coordinator
        .list_active_by_priority(Some(c))
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(at_c, vec![urgent.id]);

    // Terminal transfers leave the queue
    h.coordinator.cancel(critical.id, "dr.jones", "").unwrap();
    assert_eq!(h.coordinator.list_active_by_priority(None).unwrap().len(), 2);
}

// ========================================================================
// Validation
// ========================================================================

#[test]
fn test_create_validation_order() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 0);
    let p = h.admit("MRN-P", a);

    // 1. unknown patient wins over everything else
    assert!(matches!(
        h.coordinator.create(request(999, 77, 77, "bogus")),
        Err(CareError::NotFound { .. })
    ));
    // 2. location checked before hospitals exist
    assert!(matches!(
        h.coordinator.create(request(p, b, 77, "bogus")),
        Err(CareError::LocationMismatch { expected, actual, .. }) if expected == b && actual == a
    ));
    // 3. destination must exist
    assert!(matches!(
        h.coordinator.create(request(p, a, 77, "bogus")),
        Err(CareError::NotFound { .. })
    ));
    // 4. no self-transfer, even with a bad priority
    assert!(matches!(
        h.coordinator.create(request(p, a, a, "bogus")),
        Err(CareError::InvalidInput(msg)) if msg.contains("same hospital")
    ));
    // 5. full destination before the priority check
    assert!(matches!(
        h.coordinator.create(request(p, a, b, "bogus")),
        Err(CareError::CapacityExceeded { .. })
    ));
    // 7. unknown priority
    h.census.set_available_beds(b, 4).unwrap();
    assert!(matches!(
        h.coordinator.create(request(p, a, b, "bogus")),
        Err(CareError::InvalidInput(msg)) if msg.contains("triage")
    ));

    // 6. an active transfer blocks a second one
    let first = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();
    assert_eq!(
        h.coordinator.create(request(p, a, b, "bogus")).unwrap_err(),
        CareError::ConflictingTransfer {
            patient_id: p,
            existing: first.id,
            status: TransferStatus::Pending
        }
    );
    h.assert_consistent();
}

#[test]
fn test_illegal_transition_rejected_before_other_checks() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 4);
    let p = h.admit("MRN-P", a);
    let t = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();
    h.census.set_available_beds(b, 0).unwrap();

    // Skipping approval reports the transition, not the full destination
    assert!(matches!(
        h.coordinator.complete(t.id, "", None),
        Err(CareError::InvalidTransition {
            from: TransferStatus::Pending,
            to: TransferStatus::Completed
        })
    ));
    assert!(matches!(
        h.coordinator.advance(t.id, TransferStatus::Pending, "dr.jones", None),
        Err(CareError::InvalidTransition { .. })
    ));
}

#[test]
fn test_update_status_parses_raw_status() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 4);
    let p = h.admit("MRN-P", a);
    let t = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();

    assert!(matches!(
        h.coordinator.update_status(t.id, "approved", "dr.jones", None),
        Err(CareError::InvalidInput(_))
    ));
    let t = h
        .coordinator
        .update_status(t.id, "in-progress", "dr.jones", Some("Bed confirmed"))
        .unwrap();
    assert_eq!(t.status(), TransferStatus::InProgress);
    let t = h
        .coordinator
        .update_status(t.id, "CANCELLED", "dr.jones", Some("Weather"))
        .unwrap();
    assert_eq!(t.status(), TransferStatus::Cancelled);
    assert_eq!(t.notes().len(), 2);
}

// ========================================================================
// Re-validation at later transitions
// ========================================================================

#[test]
fn test_approval_revalidates_capacity() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 1);
    let p = h.admit("MRN-P", a);
    let t = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();

    // Last bed at B taken by an admission in the meantime
    h.admit("MRN-WALKIN", b);
    assert!(matches!(
        h.coordinator.approve(t.id, "dr.jones", None),
        Err(CareError::CapacityExceeded { .. })
    ));
    let unchanged = h.coordinator.get(t.id).unwrap();
    assert_eq!(unchanged.status(), TransferStatus::Pending);
    assert!(unchanged.approved_at.is_none());
    h.assert_consistent();
}

#[test]
fn test_completion_revalidates_capacity() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 1);
    let p = h.admit("MRN-P", a);
    let t = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();
    h.coordinator.approve(t.id, "dr.jones", None).unwrap();

    h.admit("MRN-WALKIN", b);
    let before = (h.available(a), h.available(b));
    assert!(matches!(
        h.coordinator.complete(t.id, "dr.jones", None),
        Err(CareError::CapacityExceeded { .. })
    ));
    assert_eq!((h.available(a), h.available(b)), before);
    assert_eq!(h.location(p), a);
    assert_eq!(
        h.coordinator.get(t.id).unwrap().status(),
        TransferStatus::InProgress
    );
    h.assert_consistent();
}

#[test]
fn test_completion_detects_manual_relocation() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 4);
    let c = h.hospital("C", 4, 4);
    let p = h.admit("MRN-P", a);
    let t = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();
    h.coordinator.approve(t.id, "dr.jones", None).unwrap();

    // Out-of-band move that raced the transfer
    let mut patient = h.census.patient(p).unwrap();
    patient.relocate(c, Utc::now());
    h.store
        .commit(vec![Mutation::Update(Record::Patient(patient))])
        .unwrap();

    let before = (h.available(a), h.available(b), h.available(c));
    assert!(matches!(
        h.coordinator.complete(t.id, "dr.jones", None),
        Err(CareError::LocationMismatch { expected, actual, .. }) if expected == a && actual == c
    ));
    assert_eq!((h.available(a), h.available(b), h.available(c)), before);
    assert_eq!(
        h.coordinator.get(t.id).unwrap().status(),
        TransferStatus::InProgress
    );
}

#[test]
fn test_completion_fails_if_patient_discharged_out_of_band() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 4);
    let p = h.admit("MRN-P", a);
    let t = h.coordinator.create(request(p, a, b, "URGENT")).unwrap();
    h.coordinator.approve(t.id, "dr.jones", None).unwrap();

    let patient = h.census.patient(p).unwrap();
    h.store
        .commit(vec![Mutation::Delete {
            key: crate::store::RecordKey::Patient(p),
            expected_version: crate::store::Versioned::version(&patient),
        }])
        .unwrap();

    assert!(matches!(
        h.coordinator.complete(t.id, "dr.jones", None),
        Err(CareError::NotFound { .. })
    ));
    assert_eq!(h.available(b), 4);
}

// ========================================================================
// Races and sequences
// ========================================================================

#[test]
fn test_racing_creates_for_one_patient() {
    let h = TestHarness::new();
    let a = h.hospital("A", 10, 10);
    let b = h.hospital("B", 10, 10);
    let c = h.hospital("C", 10, 10);
    let p = h.admit("MRN-P", a);

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = [b, c, b, c]
            .into_iter()
            .map(|to| {
                let coordinator = &h.coordinator;
                s.spawn(move || coordinator.create(request(p, a, to, "URGENT")))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert!(matches!(
            err,
            CareError::ConflictingTransfer { .. } | CareError::InvariantViolation(_)
        ));
    }
    h.assert_consistent();
}

#[test]
fn test_ping_pong_keeps_beds_consistent() {
    let h = TestHarness::new();
    let a = h.hospital("A", 3, 3);
    let b = h.hospital("B", 2, 2);
    let patients: Vec<_> = (0..3).map(|i| h.admit(&format!("MRN-{i}"), a)).collect();
    assert_eq!(h.available(a), 0);

    for round in 0..6 {
        for &p in &patients {
            let from = h.location(p);
            let to = if from == a { b } else { a };
            match h.coordinator.create(request(p, from, to, "SEMI_URGENT")) {
                Ok(t) => {
                    if round % 3 == 2 {
                        h.coordinator.cancel(t.id, "dr.jones", "hold").unwrap();
                    } else {
                        h.coordinator.approve(t.id, "dr.jones", None).unwrap();
                        h.coordinator.complete(t.id, "dr.jones", None).unwrap();
                    }
                }
                Err(CareError::CapacityExceeded { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
            h.assert_consistent();
        }
    }

    let at_a = h.census.patients_at(a).unwrap().len() as u32;
    let at_b = h.census.patients_at(b).unwrap().len() as u32;
    assert_eq!(at_a + at_b, 3);
    assert_eq!(h.available(a), 3 - at_a);
    assert_eq!(h.available(b), 2 - at_b);

    let completed = h
        .coordinator
        .list(TransferFilter {
            status: Some(TransferStatus::Completed),
            ..Default::default()
        })
        .unwrap();
    assert!(!completed.is_empty());
    assert!(completed.iter().all(|t| t.completed_by.is_some()));
}

#[test]
fn test_history_survives_discharge() {
    let h = TestHarness::new();
    let a = h.hospital("A", 4, 4);
    let b = h.hospital("B", 4, 4);
    let p = h.admit("MRN-P", a);
    let t = h.coordinator.create(request(p, a, b, "CRITICAL")).unwrap();
    h.coordinator.approve(t.id, "dr.jones", None).unwrap();
    h.coordinator.complete(t.id, "dr.jones", None).unwrap();

    h.census.discharge_patient(p, "nurse.joy").unwrap();
    assert_eq!(h.available(b), 4);

    let history = h.coordinator.for_patient(p).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].priority, TriageLevel::Critical);
}
