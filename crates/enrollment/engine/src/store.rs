//! The persistence seam
//!
//! A store owns the durable Enrollment records and their append-only
//! transition history. `commit_transition` is the atomic unit the
//! whole discipline rests on: swap the status and append the record
//! only if the stored status still equals what the caller read;
//! otherwise refuse with `StaleState` and change nothing.

use async_trait::async_trait;
use enrollment_types::{
    Enrollment, EnrollmentId, EnrollmentStatus, Semester, StudentId, TransitionRecord,
    WorkflowError,
};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Storage-level failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("enrollment {0} not found")]
    NotFound(EnrollmentId),

    #[error("student {student_id} already has an open enrollment for {school_year} {semester} semester")]
    DuplicateEnrollment {
        student_id: StudentId,
        school_year: String,
        semester: Semester,
    },

    #[error("stale state: expected {expected}, found {actual}")]
    StaleState {
        expected: EnrollmentStatus,
        actual: EnrollmentStatus,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WorkflowError::NotFound(id),
            StoreError::DuplicateEnrollment {
                student_id,
                school_year,
                semester,
            } => WorkflowError::DuplicateEnrollment {
                student_id,
                school_year,
                semester,
            },
            StoreError::StaleState { expected, actual } => {
                WorkflowError::StaleState { expected, actual }
            }
            StoreError::Unavailable(reason) => WorkflowError::CollaboratorUnavailable {
                collaborator: "enrollment store".to_string(),
                reason,
            },
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable home of enrollments and their histories
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Insert a freshly opened enrollment. Fails if the student
    /// already has a non-terminal cycle for the same period.
    async fn insert(&self, enrollment: Enrollment) -> StoreResult<()>;

    /// Fetch one enrollment
    async fn get(&self, id: &EnrollmentId) -> StoreResult<Enrollment>;

    /// Transition records in append order
    async fn history(&self, id: &EnrollmentId) -> StoreResult<Vec<TransitionRecord>>;

    /// Persist `updated` and append `record` in one atomic step, but
    /// only if the stored status still equals `expected_from`. The
    /// store assigns the record's sequence number. Readers never see
    /// the new status without its record or vice versa.
    async fn commit_transition(
        &self,
        expected_from: EnrollmentStatus,
        updated: Enrollment,
        record: TransitionRecord,
    ) -> StoreResult<Enrollment>;

    /// Compare-and-swap update that does not move the status and
    /// appends no record (subject selection, section assignment)
    async fn update_in_state(
        &self,
        expected_status: EnrollmentStatus,
        updated: Enrollment,
    ) -> StoreResult<Enrollment>;
}

// ── In-memory store ──────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryStoreInner {
    enrollments: HashMap<EnrollmentId, Enrollment>,
    history: HashMap<EnrollmentId, Vec<TransitionRecord>>,
}

/// In-memory enrollment store for development and testing.
///
/// One lock over records and history together, so a commit is a single
/// critical section and reads are consistent snapshots.
#[derive(Debug, Default)]
pub struct MemoryEnrollmentStore {
    inner: RwLock<MemoryStoreInner>,
}

impl MemoryEnrollmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EnrollmentStore for MemoryEnrollmentStore {
    async fn insert(&self, enrollment: Enrollment) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let open_for_period = inner
            .enrollments
            .values()
            .any(|e| e.period() == enrollment.period() && !e.is_terminal());
        if open_for_period {
            return Err(StoreError::DuplicateEnrollment {
                student_id: enrollment.student_id.clone(),
                school_year: enrollment.school_year.clone(),
                semester: enrollment.semester,
            });
        }
        inner.enrollments.insert(enrollment.id, enrollment);
        Ok(())
    }

    async fn get(&self, id: &EnrollmentId) -> StoreResult<Enrollment> {
        let inner = self.inner.read().await;
        inner
            .enrollments
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound(*id))
    }

    async fn history(&self, id: &EnrollmentId) -> StoreResult<Vec<TransitionRecord>> {
        let inner = self.inner.read().await;
        if !inner.enrollments.contains_key(id) {
            return Err(StoreError::NotFound(*id));
        }
        Ok(inner.history.get(id).cloned().unwrap_or_default())
    }

    async fn commit_transition(
        &self,
        expected_from: EnrollmentStatus,
        updated: Enrollment,
        mut record: TransitionRecord,
    ) -> StoreResult<Enrollment> {
        let mut inner = self.inner.write().await;
        let current = inner
            .enrollments
            .get(&updated.id)
            .ok_or(StoreError::NotFound(updated.id))?;
        if current.status != expected_from {
            return Err(StoreError::StaleState {
                expected: expected_from,
                actual: current.status,
            });
        }
        let history = inner.history.entry(updated.id).or_default();
        record.sequence = history.len() as u64;
        history.push(record);
        inner.enrollments.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn update_in_state(
        &self,
        expected_status: EnrollmentStatus,
        updated: Enrollment,
    ) -> StoreResult<Enrollment> {
        let mut inner = self.inner.write().await;
        let current = inner
            .enrollments
            .get(&updated.id)
            .ok_or(StoreError::NotFound(updated.id))?;
        if current.status != expected_status {
            return Err(StoreError::StaleState {
                expected: expected_status,
                actual: current.status,
            });
        }
        inner.enrollments.insert(updated.id, updated.clone());
        Ok(updated)
    }
}
