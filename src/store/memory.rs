//! In-process Record Store
//!
//! Mutex-guarded hash tables with an MRN index. Commits run the full
//! check pass under the lock before the first write, which gives the
//! all-or-nothing and compare-and-swap semantics of the store contract.

use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use rustc_hash::{FxHashMap, FxHashSet};

use super::{Mutation, Predicate, Record, RecordKey, RecordStore, StoreError, StoreResult, Versioned};
use crate::core_types::{EntityKind, HospitalId, PatientId};
use crate::models::{Hospital, Patient};
use crate::transfer::types::{Transfer, TransferId};

#[derive(Default)]
struct Tables {
    hospitals: FxHashMap<HospitalId, Hospital>,
    patients: FxHashMap<PatientId, Patient>,
    mrn_index: FxHashMap<String, PatientId>,
    transfers: FxHashMap<TransferId, Transfer>,
    last_hospital_id: HospitalId,
    last_patient_id: PatientId,
}

/// In-memory [`RecordStore`]
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn check_current<K, T>(
    table: &FxHashMap<K, T>,
    id: &K,
    key: RecordKey,
    expected: u64,
) -> StoreResult<()>
where
    K: Hash + Eq,
    T: Versioned,
{
    match table.get(id) {
        None => Err(StoreError::Missing { key }),
        Some(stored) if stored.version() != expected => Err(StoreError::VersionConflict {
            key,
            expected,
            actual: stored.version(),
        }),
        Some(_) => Ok(()),
    }
}

fn check_absent<K: Hash + Eq, T>(
    table: &FxHashMap<K, T>,
    id: &K,
    key: RecordKey,
) -> StoreResult<()> {
    if table.contains_key(id) {
        Err(StoreError::AlreadyExists { key })
    } else {
        Ok(())
    }
}

fn sorted_scan<K: Ord + Copy, T: Clone>(
    table: &FxHashMap<K, T>,
    predicate: Predicate<'_, T>,
) -> Vec<T> {
    let mut hits: Vec<(K, T)> = table
        .iter()
        .filter(|(_, record)| predicate(*record))
        .map(|(id, record)| (*id, record.clone()))
        .collect();
    hits.sort_by_key(|(id, _)| *id);
    hits.into_iter().map(|(_, record)| record).collect()
}

impl Tables {
    /// Validate one mutation against current state (no writes)
    fn check(&self, mutation: &Mutation, new_mrns: &mut FxHashSet<String>) -> StoreResult<()> {
        let key = mutation.key();
        match mutation {
            Mutation::Insert(record) => match record {
                Record::Hospital(h) => check_absent(&self.hospitals, &h.id, key),
                Record::Patient(p) => {
                    check_absent(&self.patients, &p.id, key)?;
                    if self.mrn_index.contains_key(p.mrn()) || !new_mrns.insert(p.mrn().to_string())
                    {
                        return Err(StoreError::DuplicateKey {
                            entity: EntityKind::Patient,
                            key: p.mrn().to_string(),
                        });
                    }
                    Ok(())
                }
                Record::Transfer(t) => check_absent(&self.transfers, &t.id, key),
            },
            Mutation::Update(record) => match record {
                Record::Hospital(h) => check_current(&self.hospitals, &h.id, key, h.version()),
                Record::Patient(p) => {
                    check_current(&self.patients, &p.id, key, p.version())?;
                    // MRN is immutable; a changed MRN means a corrupted record
                    match self.patients.get(&p.id) {
                        Some(stored) if stored.mrn() != p.mrn() => Err(StoreError::DuplicateKey {
                            entity: EntityKind::Patient,
                            key: p.mrn().to_string(),
                        }),
                        _ => Ok(()),
                    }
                }
                Record::Transfer(t) => check_current(&self.transfers, &t.id, key, t.version()),
            },
            Mutation::Delete {
                key,
                expected_version,
            } => match key {
                RecordKey::Hospital(id) => {
                    check_current(&self.hospitals, id, *key, *expected_version)
                }
                RecordKey::Patient(id) => check_current(&self.patients, id, *key, *expected_version),
                RecordKey::Transfer(id) => {
                    check_current(&self.transfers, id, *key, *expected_version)
                }
            },
        }
    }

    /// Apply a mutation that already passed `check`
    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Insert(record) => match record {
                Record::Hospital(mut h) => {
                    h.set_version(1);
                    self.last_hospital_id = self.last_hospital_id.max(h.id);
                    self.hospitals.insert(h.id, h);
                }
                Record::Patient(mut p) => {
                    p.set_version(1);
                    self.last_patient_id = self.last_patient_id.max(p.id);
                    self.mrn_index.insert(p.mrn().to_string(), p.id);
                    self.patients.insert(p.id, p);
                }
                Record::Transfer(mut t) => {
                    t.set_version(1);
                    self.transfers.insert(t.id, t);
                }
            },
            Mutation::Update(record) => match record {
                Record::Hospital(mut h) => {
                    h.set_version(h.version() + 1);
                    self.hospitals.insert(h.id, h);
                }
                Record::Patient(mut p) => {
                    p.set_version(p.version() + 1);
                    self.patients.insert(p.id, p);
                }
                Record::Transfer(mut t) => {
                    t.set_version(t.version() + 1);
                    self.transfers.insert(t.id, t);
                }
            },
            Mutation::Delete { key, .. } => match key {
                RecordKey::Hospital(id) => {
                    self.hospitals.remove(&id);
                }
                RecordKey::Patient(id) => {
                    if let Some(p) = self.patients.remove(&id) {
                        self.mrn_index.remove(p.mrn());
                    }
                }
                RecordKey::Transfer(id) => {
                    self.transfers.remove(&id);
                }
            },
        }
    }
}

impl RecordStore for MemoryStore {
    fn hospital(&self, id: HospitalId) -> StoreResult<Option<Hospital>> {
        Ok(self.lock()?.hospitals.get(&id).cloned())
    }

    fn patient(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        Ok(self.lock()?.patients.get(&id).cloned())
    }

    fn patient_by_mrn(&self, mrn: &str) -> StoreResult<Option<Patient>> {
        let tables = self.lock()?;
        Ok(tables
            .mrn_index
            .get(mrn)
            .and_then(|id| tables.patients.get(id))
            .cloned())
    }

    fn transfer(&self, id: TransferId) -> StoreResult<Option<Transfer>> {
        Ok(self.lock()?.transfers.get(&id).cloned())
    }

    fn scan_hospitals(&self, predicate: Predicate<'_, Hospital>) -> StoreResult<Vec<Hospital>> {
        Ok(sorted_scan(&self.lock()?.hospitals, predicate))
    }

    fn scan_patients(&self, predicate: Predicate<'_, Patient>) -> StoreResult<Vec<Patient>> {
        Ok(sorted_scan(&self.lock()?.patients, predicate))
    }

    fn scan_transfers(&self, predicate: Predicate<'_, Transfer>) -> StoreResult<Vec<Transfer>> {
        Ok(sorted_scan(&self.lock()?.transfers, predicate))
    }

    fn allocate_hospital_id(&self) -> StoreResult<HospitalId> {
        let mut tables = self.lock()?;
        tables.last_hospital_id += 1;
        Ok(tables.last_hospital_id)
    }

    fn allocate_patient_id(&self) -> StoreResult<PatientId> {
        let mut tables = self.lock()?;
        tables.last_patient_id += 1;
        Ok(tables.last_patient_id)
    }

    fn commit(&self, mutations: Vec<Mutation>) -> StoreResult<()> {
        let mut tables = self.lock()?;

        // Phase 1: check everything, write nothing
        let mut seen = FxHashSet::default();
        let mut new_mrns = FxHashSet::default();
        for mutation in &mutations {
            let key = mutation.key();
            if !seen.insert(key) {
                return Err(StoreError::DuplicateMutation { key });
            }
            tables.check(mutation, &mut new_mrns)?;
        }

        // Phase 2: apply
        for mutation in mutations {
            tables.apply(mutation);
        }
        Ok(())
    }
}
