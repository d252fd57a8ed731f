//! Enrollment lifecycle states
//!
//! One canonical status vocabulary for the whole system. Dashboards,
//! the engine, and storage all speak these names; there is no second
//! status string anywhere.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The lifecycle state of an enrollment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EnrollmentStatus {
    /// Awaiting fee assessment by registrar or admin
    #[default]
    PendingAssessment,
    /// Fees assessed; awaiting document clearance by the dean
    Assessed,
    /// Student may pick subjects and schedules
    ForSubjectSelection,
    /// Subject load submitted; awaiting dean approval
    ForDeanApproval,
    /// Approved; awaiting the student's payment submission
    ForPayment,
    /// Payment submitted; awaiting registrar verification
    ForRegistrarVerification,
    /// Terminal: enrollment finished, COR may be generated downstream
    Completed,
    /// Terminal: turned down at registrar or admin discretion
    Rejected,
}

impl EnrollmentStatus {
    /// The forward chain from initial to completed, in order.
    /// `Rejected` sits outside the chain as a terminal side branch.
    pub const CANONICAL_ORDER: [EnrollmentStatus; 7] = [
        EnrollmentStatus::PendingAssessment,
        EnrollmentStatus::Assessed,
        EnrollmentStatus::ForSubjectSelection,
        EnrollmentStatus::ForDeanApproval,
        EnrollmentStatus::ForPayment,
        EnrollmentStatus::ForRegistrarVerification,
        EnrollmentStatus::Completed,
    ];

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Position in the forward chain; `None` for `Rejected`
    pub fn ordinal(&self) -> Option<usize> {
        Self::CANONICAL_ORDER.iter().position(|s| s == self)
    }

    /// Wire name, stable across serialization and display
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingAssessment => "PendingAssessment",
            Self::Assessed => "Assessed",
            Self::ForSubjectSelection => "ForSubjectSelection",
            Self::ForDeanApproval => "ForDeanApproval",
            Self::ForPayment => "ForPayment",
            Self::ForRegistrarVerification => "ForRegistrarVerification",
            Self::Completed => "Completed",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PendingAssessment" => Ok(Self::PendingAssessment),
            "Assessed" => Ok(Self::Assessed),
            "ForSubjectSelection" => Ok(Self::ForSubjectSelection),
            "ForDeanApproval" => Ok(Self::ForDeanApproval),
            "ForPayment" => Ok(Self::ForPayment),
            "ForRegistrarVerification" => Ok(Self::ForRegistrarVerification),
            "Completed" => Ok(Self::Completed),
            "Rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown enrollment status '{}'", other)),
        }
    }
}
