//! Unit of Work
//!
//! Stages every write of one engine operation and hands them to the store
//! as a single atomic commit. Hospitals are loaded into a staged cache on
//! first touch so capacity changes accumulate on one copy per hospital.
//! Dropping a unit of work without committing discards everything.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::{Mutation, Record, RecordKey, RecordStore, Versioned};
use crate::core_types::{EntityKind, HospitalId};
use crate::error::{CareError, CareResult};
use crate::models::{Hospital, Patient};
use crate::transfer::types::Transfer;

pub struct UnitOfWork<'s> {
    store: &'s dyn RecordStore,
    /// Existing hospitals staged for update
    hospitals: BTreeMap<HospitalId, Hospital>,
    mutations: Vec<Mutation>,
}

impl<'s> UnitOfWork<'s> {
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self {
            store,
            hospitals: BTreeMap::new(),
            mutations: Vec::new(),
        }
    }

    /// Staged copy of a stored hospital, loading it on first use
    pub fn hospital_mut(&mut self, id: HospitalId) -> CareResult<&mut Hospital> {
        match self.hospitals.entry(id) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let hospital = self
                    .store
                    .hospital(id)?
                    .ok_or_else(|| CareError::not_found(EntityKind::Hospital, id))?;
                Ok(entry.insert(hospital))
            }
        }
    }

    /// Staged view of a hospital (read-only)
    pub fn hospital(&mut self, id: HospitalId) -> CareResult<&Hospital> {
        self.hospital_mut(id).map(|h| &*h)
    }

    pub fn insert_hospital(&mut self, hospital: Hospital) {
        self.mutations
            .push(Mutation::Insert(Record::Hospital(hospital)));
    }

    pub fn insert_patient(&mut self, patient: Patient) {
        self.mutations.push(Mutation::Insert(Record::Patient(patient)));
    }

    pub fn update_patient(&mut self, patient: Patient) {
        self.mutations.push(Mutation::Update(Record::Patient(patient)));
    }

    pub fn delete_patient(&mut self, patient: &Patient) {
        self.mutations.push(Mutation::Delete {
            key: RecordKey::Patient(patient.id),
            expected_version: patient.version(),
        });
    }

    pub fn insert_transfer(&mut self, transfer: Transfer) {
        self.mutations
            .push(Mutation::Insert(Record::Transfer(transfer)));
    }

    pub fn update_transfer(&mut self, transfer: Transfer) {
        self.mutations
            .push(Mutation::Update(Record::Transfer(transfer)));
    }

    /// Number of writes this unit would commit
    pub fn len(&self) -> usize {
        self.mutations.len() + self.hospitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand all staged writes to the store in one commit
    pub fn commit(self) -> CareResult<()> {
        let UnitOfWork {
            store,
            hospitals,
            mut mutations,
        } = self;

        mutations.extend(
            hospitals
                .into_values()
                .map(|h| Mutation::Update(Record::Hospital(h))),
        );
        if mutations.is_empty() {
            return Ok(());
        }
        store.commit(mutations)?;
        Ok(())
    }
}
