//! Precondition validators
//!
//! Evaluated against live collaborator state when a transition is
//! requested. The engine does not hold any lock across these calls and
//! its own storage; a condition that changes between check and commit
//! is caught by the commit's compare-and-swap on the status field.

use crate::collaborators::{DocumentStore, FeeLedger, RECEIPT_DOCUMENT};
use crate::transition_table::Precondition;
use enrollment_types::{Enrollment, TransitionPayload, WorkflowError, WorkflowResult};
use std::collections::HashSet;

fn failed(condition: impl Into<String>) -> WorkflowError {
    WorkflowError::PreconditionFailed {
        condition: condition.into(),
    }
}

/// Check one precondition for one enrollment
pub async fn check(
    precondition: Precondition,
    enrollment: &Enrollment,
    payload: &TransitionPayload,
    ledger: &dyn FeeLedger,
    documents: &dyn DocumentStore,
) -> WorkflowResult<()> {
    match precondition {
        Precondition::None => Ok(()),

        Precondition::AssessmentRecorded => {
            match ledger.assessment(&enrollment.id).await? {
                None => Err(failed("no assessment recorded")),
                Some(a) if a.line_item_count == 0 => Err(failed("assessment has no line items")),
                Some(a) if a.total < 0 => Err(failed("assessment total is negative")),
                Some(_) => Ok(()),
            }
        }

        Precondition::RequiredDocumentsPresent => {
            let required = documents.required_documents(&enrollment.student_id).await?;
            for doc_type in &required {
                if !documents.has_document(&enrollment.id, doc_type).await? {
                    return Err(failed(format!("missing document: {}", doc_type)));
                }
            }
            Ok(())
        }

        Precondition::SubjectsSelected => {
            if enrollment.subjects.is_empty() {
                return Err(failed("no subjects selected"));
            }
            let mut seen = HashSet::new();
            for selection in &enrollment.subjects {
                if !seen.insert(&selection.subject_id) {
                    return Err(failed(format!(
                        "duplicate subject: {}",
                        selection.subject_id
                    )));
                }
            }
            Ok(())
        }

        Precondition::TotalReconciled => {
            if enrollment.subjects.is_empty() {
                return Err(failed("no subjects selected"));
            }
            // Re-set the ledger total from the approved subject load;
            // the ledger owns the unit-count arithmetic.
            let total = ledger.reassess(&enrollment.id, &enrollment.subjects).await?;
            if total < 0 {
                return Err(failed("reassessed total is negative"));
            }
            Ok(())
        }

        Precondition::PaymentAttached => {
            if payload.payment.is_some() {
                return Ok(());
            }
            if documents
                .has_document(&enrollment.id, RECEIPT_DOCUMENT)
                .await?
            {
                return Ok(());
            }
            Err(failed("no payment reference or receipt attached"))
        }

        Precondition::FullyPaid => match ledger.assessment(&enrollment.id).await? {
            None => Err(failed("no assessment recorded")),
            Some(a) if !a.fully_paid => Err(failed("balance not fully paid")),
            Some(_) => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MemoryDocumentStore, MemoryFeeLedger};
    use enrollment_types::{PaymentReference, Semester, StudentId, SubjectSelection};

    fn make_enrollment() -> Enrollment {
        Enrollment::new(StudentId::new("stu-1"), "2024-2025", Semester::First)
    }

    #[tokio::test]
    async fn test_assessment_recorded() {
        let ledger = MemoryFeeLedger::new();
        let documents = MemoryDocumentStore::new();
        let enrollment = make_enrollment();
        let payload = TransitionPayload::new();

        let err = check(
            Precondition::AssessmentRecorded,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no assessment recorded"));

        ledger.record_assessment(&enrollment.id, 0, 0).await;
        let err = check(
            Precondition::AssessmentRecorded,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no line items"));

        ledger.record_assessment(&enrollment.id, 5, 14_000_00).await;
        check(
            Precondition::AssessmentRecorded,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_missing_document_named() {
        let ledger = MemoryFeeLedger::new();
        let documents = MemoryDocumentStore::new();
        let enrollment = make_enrollment();

        let err = check(
            Precondition::RequiredDocumentsPresent,
            &enrollment,
            &TransitionPayload::new(),
            &ledger,
            &documents,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "precondition failed: missing document: form137"
        );

        documents.attach(&enrollment.id, "form137").await;
        documents.attach(&enrollment.id, "psa_birth_certificate").await;
        documents.attach(&enrollment.id, "good_moral").await;
        check(
            Precondition::RequiredDocumentsPresent,
            &enrollment,
            &TransitionPayload::new(),
            &ledger,
            &documents,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_subjects_selected() {
        let ledger = MemoryFeeLedger::new();
        let documents = MemoryDocumentStore::new();
        let mut enrollment = make_enrollment();
        let payload = TransitionPayload::new();

        let err = check(
            Precondition::SubjectsSelected,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no subjects selected"));

        enrollment
            .set_subjects(vec![SubjectSelection::new("CS101", "MWF 8:00")])
            .unwrap();
        check(
            Precondition::SubjectsSelected,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_payment_attached_accepts_reference_or_receipt() {
        let ledger = MemoryFeeLedger::new();
        let documents = MemoryDocumentStore::new();
        let enrollment = make_enrollment();

        let err = check(
            Precondition::PaymentAttached,
            &enrollment,
            &TransitionPayload::new(),
            &ledger,
            &documents,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::PreconditionFailed { .. }));

        // Inline payment reference satisfies the gate
        let payload =
            TransitionPayload::new().with_payment(PaymentReference::new("gcash", "REF-1"));
        check(
            Precondition::PaymentAttached,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap();

        // So does an uploaded receipt document
        documents.attach(&enrollment.id, RECEIPT_DOCUMENT).await;
        check(
            Precondition::PaymentAttached,
            &enrollment,
            &TransitionPayload::new(),
            &ledger,
            &documents,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_fully_paid() {
        let ledger = MemoryFeeLedger::new();
        let documents = MemoryDocumentStore::new();
        let enrollment = make_enrollment();
        let payload = TransitionPayload::new();

        ledger.record_assessment(&enrollment.id, 5, 14_000_00).await;
        let err = check(
            Precondition::FullyPaid,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("not fully paid"));

        ledger.mark_paid(&enrollment.id).await;
        check(
            Precondition::FullyPaid,
            &enrollment,
            &payload,
            &ledger,
            &documents,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_unavailable_collaborator_surfaces_as_retriable() {
        let ledger = MemoryFeeLedger::new();
        let documents = MemoryDocumentStore::new();
        let enrollment = make_enrollment();
        ledger.set_available(false).await;

        let err = check(
            Precondition::AssessmentRecorded,
            &enrollment,
            &TransitionPayload::new(),
            &ledger,
            &documents,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::CollaboratorUnavailable { .. }));
        assert!(err.is_retriable());
    }
}
