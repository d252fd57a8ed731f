//! Collaborator seams: the Fee Ledger and the Document Reference Store
//!
//! The engine never computes fee formulas and never touches document
//! storage paths. It reads both collaborators at precondition-check
//! time through these traits, and writing the reassessed total is the
//! single ledger write it performs. Transport failure surfaces as
//! [`CollaboratorError`], which callers may retry.

use async_trait::async_trait;
use enrollment_types::{EnrollmentId, StudentId, SubjectSelection, WorkflowError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::RwLock;

/// Document type the payment-attached precondition accepts in place of
/// an inline payment reference
pub const RECEIPT_DOCUMENT: &str = "receipt";

/// A collaborator could not be reached
#[derive(Debug, Error)]
#[error("{collaborator} unavailable: {reason}")]
pub struct CollaboratorError {
    pub collaborator: String,
    pub reason: String,
}

impl CollaboratorError {
    pub fn new(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }
}

impl From<CollaboratorError> for WorkflowError {
    fn from(err: CollaboratorError) -> Self {
        WorkflowError::CollaboratorUnavailable {
            collaborator: err.collaborator,
            reason: err.reason,
        }
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Assessment summary as the ledger reports it.
/// Amounts are in centavos; the engine never does fee arithmetic
/// beyond comparisons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerAssessment {
    pub line_item_count: usize,
    pub total: i64,
    pub fully_paid: bool,
}

/// Read/write seam onto the Fee Ledger
#[async_trait]
pub trait FeeLedger: Send + Sync {
    /// The current assessment for an enrollment, if one was recorded
    async fn assessment(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> CollaboratorResult<Option<LedgerAssessment>>;

    /// Recompute the total from the selected subjects' unit counts and
    /// re-set the stored assessment. Returns the new total.
    async fn reassess(
        &self,
        enrollment_id: &EnrollmentId,
        subjects: &[SubjectSelection],
    ) -> CollaboratorResult<i64>;
}

/// Read-only seam onto the Document Reference Store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Document types this student must have on file. The student-type
    /// to required-documents mapping is the collaborator's, not ours.
    async fn required_documents(&self, student: &StudentId) -> CollaboratorResult<Vec<String>>;

    /// Whether a reference of this type exists for the enrollment
    async fn has_document(
        &self,
        enrollment_id: &EnrollmentId,
        doc_type: &str,
    ) -> CollaboratorResult<bool>;
}

// ── In-memory collaborators ──────────────────────────────────────────

const LEDGER_NAME: &str = "fee ledger";
const DOCUMENTS_NAME: &str = "document store";

/// Per-subject unit price the in-memory ledger reassesses with, in
/// centavos
const DEFAULT_UNIT_PRICE: i64 = 1_750_00;

#[derive(Debug)]
struct MemoryLedgerInner {
    assessments: HashMap<EnrollmentId, LedgerAssessment>,
    unit_price: i64,
    available: bool,
}

/// In-memory fee ledger for development and testing
#[derive(Debug)]
pub struct MemoryFeeLedger {
    inner: RwLock<MemoryLedgerInner>,
}

impl Default for MemoryFeeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFeeLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryLedgerInner {
                assessments: HashMap::new(),
                unit_price: DEFAULT_UNIT_PRICE,
                available: true,
            }),
        }
    }

    /// Record an assessment the way a registrar dashboard would
    pub async fn record_assessment(
        &self,
        enrollment_id: &EnrollmentId,
        line_item_count: usize,
        total: i64,
    ) {
        let mut inner = self.inner.write().await;
        inner.assessments.insert(
            *enrollment_id,
            LedgerAssessment {
                line_item_count,
                total,
                fully_paid: false,
            },
        );
    }

    /// Mark the balance settled, the way a cashier posting would
    pub async fn mark_paid(&self, enrollment_id: &EnrollmentId) {
        let mut inner = self.inner.write().await;
        if let Some(assessment) = inner.assessments.get_mut(enrollment_id) {
            assessment.fully_paid = true;
        }
    }

    /// Simulate the ledger going down
    pub async fn set_available(&self, available: bool) {
        self.inner.write().await.available = available;
    }
}

#[async_trait]
impl FeeLedger for MemoryFeeLedger {
    async fn assessment(
        &self,
        enrollment_id: &EnrollmentId,
    ) -> CollaboratorResult<Option<LedgerAssessment>> {
        let inner = self.inner.read().await;
        if !inner.available {
            return Err(CollaboratorError::new(LEDGER_NAME, "connection refused"));
        }
        Ok(inner.assessments.get(enrollment_id).cloned())
    }

    async fn reassess(
        &self,
        enrollment_id: &EnrollmentId,
        subjects: &[SubjectSelection],
    ) -> CollaboratorResult<i64> {
        let mut inner = self.inner.write().await;
        if !inner.available {
            return Err(CollaboratorError::new(LEDGER_NAME, "connection refused"));
        }
        let total = inner.unit_price * subjects.len() as i64;
        let fully_paid = inner
            .assessments
            .get(enrollment_id)
            .map(|a| a.fully_paid)
            .unwrap_or(false);
        inner.assessments.insert(
            *enrollment_id,
            LedgerAssessment {
                line_item_count: subjects.len(),
                total,
                fully_paid,
            },
        );
        Ok(total)
    }
}

#[derive(Debug)]
struct MemoryDocumentsInner {
    required: HashMap<StudentId, Vec<String>>,
    default_required: Vec<String>,
    documents: HashSet<(EnrollmentId, String)>,
    available: bool,
}

/// In-memory document reference store for development and testing
#[derive(Debug)]
pub struct MemoryDocumentStore {
    inner: RwLock<MemoryDocumentsInner>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryDocumentsInner {
                required: HashMap::new(),
                default_required: vec![
                    "form137".to_string(),
                    "psa_birth_certificate".to_string(),
                    "good_moral".to_string(),
                ],
                documents: HashSet::new(),
                available: true,
            }),
        }
    }

    /// Override the required set for a specific student type
    pub async fn set_required(&self, student: &StudentId, required: Vec<String>) {
        let mut inner = self.inner.write().await;
        inner.required.insert(student.clone(), required);
    }

    /// Record that a document reference exists
    pub async fn attach(&self, enrollment_id: &EnrollmentId, doc_type: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.documents.insert((*enrollment_id, doc_type.into()));
    }

    /// Simulate the store going down
    pub async fn set_available(&self, available: bool) {
        self.inner.write().await.available = available;
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn required_documents(&self, student: &StudentId) -> CollaboratorResult<Vec<String>> {
        let inner = self.inner.read().await;
        if !inner.available {
            return Err(CollaboratorError::new(DOCUMENTS_NAME, "connection refused"));
        }
        Ok(inner
            .required
            .get(student)
            .unwrap_or(&inner.default_required)
            .clone())
    }

    async fn has_document(
        &self,
        enrollment_id: &EnrollmentId,
        doc_type: &str,
    ) -> CollaboratorResult<bool> {
        let inner = self.inner.read().await;
        if !inner.available {
            return Err(CollaboratorError::new(DOCUMENTS_NAME, "connection refused"));
        }
        Ok(inner
            .documents
            .contains(&(*enrollment_id, doc_type.to_string())))
    }
}
