//! Transfer Status Definitions
//!
//! The legal-transition table lives here so it stays exhaustive:
//! adding a status forces every `match` below to be revisited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transfer lifecycle status
///
/// ```text
/// PENDING → IN_PROGRESS → COMPLETED
///    ↓           ↓
/// CANCELLED   CANCELLED
/// ```
///
/// Terminal states: COMPLETED, CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// Initial state - request validated and recorded, no bed held
    Pending,

    /// Approved and under way
    InProgress,

    /// Terminal: patient relocated, beds moved
    Completed,

    /// Terminal: abandoned, no capacity side effects
    Cancelled,
}

impl TransferStatus {
    /// Statuses reachable from `self` in one step
    pub fn legal_targets(&self) -> &'static [TransferStatus] {
        match self {
            TransferStatus::Pending => &[TransferStatus::InProgress, TransferStatus::Cancelled],
            TransferStatus::InProgress => &[TransferStatus::Completed, TransferStatus::Cancelled],
            TransferStatus::Completed | TransferStatus::Cancelled => &[],
        }
    }

    #[inline]
    pub fn can_transition_to(&self, next: TransferStatus) -> bool {
        self.legal_targets().contains(&next)
    }

    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Cancelled)
    }

    /// PENDING or IN_PROGRESS: counts toward the one-active-transfer rule
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "PENDING",
            TransferStatus::InProgress => "IN_PROGRESS",
            TransferStatus::Completed => "COMPLETED",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = String;

    /// Case-insensitive; accepts `in_progress`, `IN-PROGRESS`, `in progress`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "PENDING" => Ok(TransferStatus::Pending),
            "IN_PROGRESS" => Ok(TransferStatus::InProgress),
            "COMPLETED" => Ok(TransferStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(TransferStatus::Cancelled),
            _ => Err(format!("unknown transfer status: {s}")),
        }
    }
}
