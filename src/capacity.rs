//! Capacity Ledger
//!
//! ENFORCED BED COUNT TYPE - the single source of truth for `available_beds`.
//! ALL bed mutations MUST go through these methods.
//!
//! # Enforcement Strategy:
//! 1. Fields are PRIVATE - no direct access
//! 2. All mutations return Result - errors are explicit
//! 3. `0 <= available <= capacity` is checked on every mutation
//! 4. Mutations happen on staged copies inside a [`UnitOfWork`], so they
//!    commit together with the patient/transfer changes that caused them

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::core_types::{EntityKind, HospitalId};
use crate::error::{CareError, CareResult};
use crate::models::Hospital;
use crate::store::UnitOfWork;

/// Ledger-local failures, mapped to [`CareError`] with the hospital id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BedError {
    #[error("no available beds (capacity {capacity})")]
    NoVacancy { capacity: u32 },

    #[error("release would exceed capacity {capacity}")]
    OverRelease { capacity: u32 },

    #[error("available beds {requested} outside 0..={capacity}")]
    OutOfRange { requested: i64, capacity: u32 },
}

/// Bed counts for a single hospital
///
/// # Invariants (ENFORCED by private fields):
/// - available <= capacity
/// - occupied = capacity - available
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BedLedger {
    capacity: u32,
    #[serde(rename = "available_beds")]
    available: u32,
}

impl BedLedger {
    /// Create a ledger, validating `available <= capacity`
    pub fn new(capacity: u32, available: u32) -> Result<Self, BedError> {
        if available > capacity {
            return Err(BedError::OutOfRange {
                requested: i64::from(available),
                capacity,
            });
        }
        Ok(Self {
            capacity,
            available,
        })
    }

    #[inline(always)]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline(always)]
    pub const fn available(&self) -> u32 {
        self.available
    }

    #[inline(always)]
    pub const fn occupied(&self) -> u32 {
        self.capacity - self.available
    }

    #[inline(always)]
    pub const fn has_vacancy(&self) -> bool {
        self.available > 0
    }

    /// Take one bed
    ///
    /// # Errors
    /// - `NoVacancy` if `available == 0`
    pub fn reserve(&mut self) -> Result<(), BedError> {
        if self.available == 0 {
            return Err(BedError::NoVacancy {
                capacity: self.capacity,
            });
        }
        self.available -= 1;
        Ok(())
    }

    /// Give one bed back
    ///
    /// # Errors
    /// - `OverRelease` if every bed is already free (double release)
    pub fn release(&mut self) -> Result<(), BedError> {
        if self.available >= self.capacity {
            return Err(BedError::OverRelease {
                capacity: self.capacity,
            });
        }
        self.available += 1;
        Ok(())
    }

    /// Administrative override of the free-bed count
    ///
    /// # Errors
    /// - `OutOfRange` if `new_available < 0` or `> capacity`
    pub fn set_available(&mut self, new_available: i64) -> Result<(), BedError> {
        let out_of_range = BedError::OutOfRange {
            requested: new_available,
            capacity: self.capacity,
        };
        let value = u32::try_from(new_available).map_err(|_| out_of_range.clone())?;
        if value > self.capacity {
            return Err(out_of_range);
        }
        self.available = value;
        Ok(())
    }
}

/// Reserve / release / override against hospitals staged in a unit of work
pub struct CapacityLedger;

impl CapacityLedger {
    /// Fail with `CapacityExceeded` unless the hospital has a free bed
    pub fn ensure_vacancy(hospital: &Hospital) -> CareResult<()> {
        if hospital.beds().has_vacancy() {
            Ok(())
        } else {
            Err(CareError::CapacityExceeded {
                hospital_id: hospital.id,
                capacity: hospital.beds().capacity(),
            })
        }
    }

    /// Decrement `available_beds` by one
    pub fn reserve(uow: &mut UnitOfWork<'_>, hospital_id: HospitalId) -> CareResult<()> {
        let hospital = uow.hospital_mut(hospital_id)?;
        hospital
            .beds_mut()
            .reserve()
            .map_err(|e| bed_error(hospital_id, e))
    }

    /// Increment `available_beds` by one
    pub fn release(uow: &mut UnitOfWork<'_>, hospital_id: HospitalId) -> CareResult<()> {
        let hospital = uow.hospital_mut(hospital_id)?;
        hospital
            .beds_mut()
            .release()
            .map_err(|e| bed_error(hospital_id, e))
    }

    /// Direct administrative override of `available_beds`
    pub fn set_available(
        uow: &mut UnitOfWork<'_>,
        hospital_id: HospitalId,
        new_available: i64,
    ) -> CareResult<()> {
        let hospital = uow.hospital_mut(hospital_id)?;
        hospital
            .beds_mut()
            .set_available(new_available)
            .map_err(|e| bed_error(hospital_id, e))
    }
}

fn bed_error(hospital_id: HospitalId, err: BedError) -> CareError {
    match err {
        BedError::NoVacancy { capacity } => CareError::CapacityExceeded {
            hospital_id,
            capacity,
        },
        BedError::OverRelease { capacity } => {
            error!(
                hospital_id,
                capacity, "Bed release would exceed capacity (double release?)"
            );
            CareError::InvariantViolation(format!(
                "{} {hospital_id}: release would exceed capacity {capacity}",
                EntityKind::Hospital
            ))
        }
        BedError::OutOfRange {
            requested,
            capacity,
        } => CareError::InvalidInput(format!(
            "available beds {requested} must be between 0 and capacity {capacity}"
        )),
    }
}

// ============================================================
// TESTS - Prove enforcement works
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_available_above_capacity() {
        assert!(BedLedger::new(5, 5).is_ok());
        assert_eq!(
            BedLedger::new(5, 6),
            Err(BedError::OutOfRange {
                requested: 6,
                capacity: 5
            })
        );
    }

    #[test]
    fn test_reserve() {
        let mut beds = BedLedger::new(2, 2).unwrap();
        beds.reserve().unwrap();
        assert_eq!(beds.available(), 1);
        assert_eq!(beds.occupied(), 1);

        beds.reserve().unwrap();
        assert_eq!(beds.available(), 0);
        assert!(!beds.has_vacancy());
    }

    #[test]
    fn test_reserve_when_full() {
        let mut beds = BedLedger::new(3, 0).unwrap();
        assert_eq!(beds.reserve(), Err(BedError::NoVacancy { capacity: 3 }));
        assert_eq!(beds.available(), 0); // Unchanged
    }

    #[test]
    fn test_release() {
        let mut beds = BedLedger::new(3, 1).unwrap();
        beds.release().unwrap();
        assert_eq!(beds.available(), 2);
    }

    #[test]
    fn test_double_release_rejected() {
        let mut beds = BedLedger::new(3, 2).unwrap();
        beds.release().unwrap();
        assert_eq!(beds.release(), Err(BedError::OverRelease { capacity: 3 }));
        assert_eq!(beds.available(), 3); // Unchanged
    }

    #[test]
    fn test_set_available_bounds() {
        let mut beds = BedLedger::new(10, 4).unwrap();
        beds.set_available(10).unwrap();
        assert_eq!(beds.available(), 10);
        beds.set_available(0).unwrap();
        assert_eq!(beds.available(), 0);

        assert!(beds.set_available(11).is_err());
        assert!(beds.set_available(-1).is_err());
        assert_eq!(beds.available(), 0); // Unchanged
    }

    #[test]
    fn test_zero_capacity_hospital() {
        let mut beds = BedLedger::new(0, 0).unwrap();
        assert!(beds.reserve().is_err());
        assert!(beds.release().is_err());
        assert_eq!(beds.occupied(), 0);
    }

    #[test]
    fn test_bed_error_mapping() {
        assert_eq!(
            bed_error(4, BedError::NoVacancy { capacity: 5 }),
            CareError::CapacityExceeded {
                hospital_id: 4,
                capacity: 5
            }
        );
        assert!(matches!(
            bed_error(4, BedError::OverRelease { capacity: 5 }),
            CareError::InvariantViolation(_)
        ));
        assert!(matches!(
            bed_error(
                4,
                BedError::OutOfRange {
                    requested: -1,
                    capacity: 5
                }
            ),
            CareError::InvalidInput(_)
        ));
    }
}
