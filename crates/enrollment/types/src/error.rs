//! The workflow error taxonomy
//!
//! Every engine failure is one of these kinds, carrying enough context
//! (current state, attempted edge, missing condition) for the caller to
//! decide remediation. `CollaboratorUnavailable` is the only kind a
//! caller may retry without changing its input.

use crate::{ActorRole, EnrollmentId, EnrollmentStatus, Semester, StudentId};
use thiserror::Error;

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Why a workflow operation was refused
#[derive(Clone, Debug, Error, PartialEq)]
pub enum WorkflowError {
    /// The requested edge does not exist from the current state
    #[error("no transition from {from} to {to}")]
    InvalidTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },

    /// The actor's role (or identity, on self-only edges) is not in
    /// the edge's allowed set
    #[error("role {role} is not allowed to {action}")]
    UnauthorizedActor { role: ActorRole, action: String },

    /// The edge exists and the actor is authorized, but a required
    /// condition is unmet; the message names which one
    #[error("precondition failed: {condition}")]
    PreconditionFailed { condition: String },

    /// The enrollment's state no longer matches what the caller
    /// expected: it lost a race, or is retrying an applied transition
    #[error("stale state: expected {expected}, found {actual}")]
    StaleState {
        expected: EnrollmentStatus,
        actual: EnrollmentStatus,
    },

    /// The enrollment is in a terminal state; nothing may follow
    #[error("enrollment is terminal in state {0}")]
    TerminalState(EnrollmentStatus),

    /// A collaborator could not be reached to evaluate a precondition
    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: String,
        reason: String,
    },

    /// No enrollment with this id
    #[error("enrollment {0} not found")]
    NotFound(EnrollmentId),

    /// The student already has an open cycle for this period
    #[error("student {student_id} already has an open enrollment for {school_year} {semester} semester")]
    DuplicateEnrollment {
        student_id: StudentId,
        school_year: String,
        semester: Semester,
    },
}

impl WorkflowError {
    /// Stable kind name surfaced on the wire, matching what dashboards
    /// key their messages on
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "InvalidTransitionError",
            Self::UnauthorizedActor { .. } => "UnauthorizedActorError",
            Self::PreconditionFailed { .. } => "PreconditionFailedError",
            Self::StaleState { .. } => "StaleStateError",
            Self::TerminalState(_) => "TerminalStateError",
            Self::CollaboratorUnavailable { .. } => "CollaboratorUnavailableError",
            Self::NotFound(_) => "NotFoundError",
            Self::DuplicateEnrollment { .. } => "DuplicateEnrollmentError",
        }
    }

    /// Whether a caller may retry with the same input
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::CollaboratorUnavailable { .. })
    }
}
