//! Triage Ranking
//!
//! Total order over urgency levels for dispatch and display.
//!
//! ```text
//! CRITICAL(1) < URGENT(2) < SEMI_URGENT(3) < NON_URGENT(4) < unknown(5)
//! ```
//!
//! Lower rank sorts first. Equal ranks are served first-requested first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_types::Timestamp;

/// Rank given to any level outside the enumerated set
///
/// Stored records always carry a parsed [`TriageLevel`], so this only
/// applies to raw strings from outside the engine.
pub(crate) const UNRANKED: u8 = 5;

/// Patient / transfer urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TriageLevel {
    Critical,
    Urgent,
    SemiUrgent,
    NonUrgent,
}

impl TriageLevel {
    /// All levels, most urgent first
    pub const ALL: [TriageLevel; 4] = [
        TriageLevel::Critical,
        TriageLevel::Urgent,
        TriageLevel::SemiUrgent,
        TriageLevel::NonUrgent,
    ];

    /// Dispatch rank (1 = most urgent)
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            TriageLevel::Critical => 1,
            TriageLevel::Urgent => 2,
            TriageLevel::SemiUrgent => 3,
            TriageLevel::NonUrgent => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriageLevel::Critical => "CRITICAL",
            TriageLevel::Urgent => "URGENT",
            TriageLevel::SemiUrgent => "SEMI_URGENT",
            TriageLevel::NonUrgent => "NON_URGENT",
        }
    }

    /// Lenient parse: case-insensitive, `-` and `_` interchangeable
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "CRITICAL" => Some(TriageLevel::Critical),
            "URGENT" => Some(TriageLevel::Urgent),
            "SEMI_URGENT" => Some(TriageLevel::SemiUrgent),
            "NON_URGENT" => Some(TriageLevel::NonUrgent),
            _ => None,
        }
    }
}

/// Rank of a raw level string; unknown levels sort after NON_URGENT
#[allow(dead_code)]
pub(crate) fn rank_of(raw: &str) -> u8 {
    TriageLevel::parse(raw).map_or(UNRANKED, |level| level.rank())
}

impl fmt::Display for TriageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TriageLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TriageLevel::parse(s).ok_or_else(|| format!("unknown triage level: {s}"))
    }
}

impl TryFrom<String> for TriageLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TriageLevel> for String {
    fn from(level: TriageLevel) -> Self {
        level.as_str().to_string()
    }
}

/// Sort key for dispatch queues: rank, then request time
///
/// Derived `Ord` compares fields in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DispatchKey {
    rank: u8,
    requested_at: Timestamp,
}

impl DispatchKey {
    pub fn new(level: TriageLevel, requested_at: Timestamp) -> Self {
        Self {
            rank: level.rank(),
            requested_at,
        }
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }
}
