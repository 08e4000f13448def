//! Startup fixtures
//!
//! A seed file lists hospitals with their current patients nested under
//! them. `available_beds` is the count before the nested patients are
//! admitted; each admission takes one more bed.
//!
//! ```yaml
//! hospitals:
//!   - name: Mercy General
//!     capacity: 50
//!     available_beds: 20
//!     patients:
//!       - mrn: MRN-0001
//!         first_name: John
//!         last_name: Doe
//!         triage_level: URGENT
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::census::Census;
use crate::error::CareResult;
use crate::models::{NewHospital, NewPatient};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub hospitals: Vec<SeedHospital>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedHospital {
    #[serde(flatten)]
    pub hospital: NewHospital,
    #[serde(default)]
    pub patients: Vec<NewPatient>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub hospitals: usize,
    pub patients: usize,
}

impl SeedFile {
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse seed yaml")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Register every hospital and admit its patients, in file order
    pub fn apply(self, census: &Census) -> CareResult<SeedSummary> {
        let mut summary = SeedSummary::default();
        for entry in self.hospitals {
            let hospital = census.register_hospital(entry.hospital)?;
            summary.hospitals += 1;
            for mut patient in entry.patients {
                patient.hospital_id = hospital.id;
                census.admit_patient(patient)?;
                summary.patients += 1;
            }
        }
        info!(
            hospitals = summary.hospitals,
            patients = summary.patients,
            "Seed data loaded"
        );
        Ok(summary)
    }
}
