//! The Enrollment entity: one student's attempt to register for a
//! school year and semester
//!
//! `status` is the single source of truth for where the enrollment
//! stands; it is only ever moved by the engine's compare-and-swap
//! commit, never written directly by callers.

use crate::{EnrollmentId, SectionId, StudentId, SubjectId, WorkflowError, WorkflowResult};
use crate::EnrollmentStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// School term within a school year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    First,
    Second,
    Summer,
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::First => "1st",
            Self::Second => "2nd",
            Self::Summer => "summer",
        };
        write!(f, "{}", name)
    }
}

/// One chosen subject and the schedule slot it was picked under
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectSelection {
    pub subject_id: SubjectId,
    pub schedule_ref: String,
}

impl SubjectSelection {
    pub fn new(subject_id: impl Into<String>, schedule_ref: impl Into<String>) -> Self {
        Self {
            subject_id: SubjectId::new(subject_id),
            schedule_ref: schedule_ref.into(),
        }
    }
}

/// How the student paid: method plus the reference number they supplied
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReference {
    pub method: String,
    pub reference_no: String,
}

impl PaymentReference {
    pub fn new(method: impl Into<String>, reference_no: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            reference_no: reference_no.into(),
        }
    }
}

/// One student's enrollment cycle for a (school year, semester) period
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Unique identifier
    pub id: EnrollmentId,
    /// The student who owns this cycle
    pub student_id: StudentId,
    /// School year, e.g. "2024-2025"
    pub school_year: String,
    /// Semester within the school year
    pub semester: Semester,
    /// Current lifecycle state
    pub status: EnrollmentStatus,
    /// Chosen subjects; a subject id appears at most once
    pub subjects: Vec<SubjectSelection>,
    /// Fee Ledger reference, present from `Assessed` onward
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_ref: Option<String>,
    /// Section assigned by the registrar after subject approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<SectionId>,
    /// Payment reference attached at payment submission
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentReference>,
    /// Annotation from the actor behind the most recent transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// When the cycle was opened (immutable)
    pub created_at: DateTime<Utc>,
    /// Set on every transition
    pub updated_at: DateTime<Utc>,
}

impl Enrollment {
    /// Open a new enrollment cycle at `PendingAssessment`
    pub fn new(student_id: StudentId, school_year: impl Into<String>, semester: Semester) -> Self {
        let now = Utc::now();
        Self {
            id: EnrollmentId::generate(),
            student_id,
            school_year: school_year.into(),
            semester,
            status: EnrollmentStatus::PendingAssessment,
            subjects: Vec::new(),
            assessment_ref: None,
            section: None,
            payment: None,
            remarks: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The key under which the one-open-cycle-per-period invariant holds
    pub fn period(&self) -> (&StudentId, &str, Semester) {
        (&self.student_id, &self.school_year, self.semester)
    }

    /// Replace the subject set, rejecting duplicate subject ids
    pub fn set_subjects(&mut self, subjects: Vec<SubjectSelection>) -> WorkflowResult<()> {
        let mut seen = HashSet::new();
        for selection in &subjects {
            if !seen.insert(&selection.subject_id) {
                return Err(WorkflowError::PreconditionFailed {
                    condition: format!("duplicate subject: {}", selection.subject_id),
                });
            }
        }
        self.subjects = subjects;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Check if no further transitions are legal
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
