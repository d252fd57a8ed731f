//! The workflow engine: the one component allowed to move an
//! enrollment's status
//!
//! Every mutation follows the same shape: load a snapshot, resolve the
//! requested edge against the transition table, authorize the actor,
//! validate the precondition against live collaborator state, then
//! commit through the store's compare-and-swap. A snapshot that went
//! stale between load and commit loses the race and surfaces as
//! `StaleState`; nothing is partially applied.

use crate::authorization::{authorize, permits};
use crate::collaborators::{DocumentStore, FeeLedger};
use crate::preconditions;
use crate::store::EnrollmentStore;
use crate::transition_table::{rules_from, rules_to, TransitionRule};
use chrono::Utc;
use enrollment_types::{
    Actor, ActorRole, Enrollment, EnrollmentEvent, EnrollmentId, EnrollmentStatus, SectionId,
    Semester, StudentId, SubjectSelection, TransitionPayload, TransitionRecord, WorkflowError,
    WorkflowResult,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Event channel depth; slow subscribers lag rather than block commits
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Resolve the edge a caller is asking for.
///
/// A request names only the target state. If an edge into the target
/// leaves the current state, that edge is the one. Otherwise we
/// distinguish a replayed request (some edge into the target leaves a
/// state the enrollment already moved past) from a request for an edge
/// that simply does not exist.
fn resolve_rule(
    current: EnrollmentStatus,
    target: EnrollmentStatus,
) -> WorkflowResult<&'static TransitionRule> {
    let candidates = rules_to(target);
    if let Some(rule) = candidates.iter().find(|rule| rule.from == current) {
        return Ok(rule);
    }
    if let Some(current_ord) = current.ordinal() {
        for rule in &candidates {
            match rule.from.ordinal() {
                Some(from_ord) if from_ord < current_ord => {
                    return Err(WorkflowError::StaleState {
                        expected: rule.from,
                        actual: current,
                    });
                }
                _ => {}
            }
        }
    }
    Err(WorkflowError::InvalidTransition {
        from: current,
        to: target,
    })
}

/// The Enrollment Workflow Engine
pub struct WorkflowEngine {
    store: Arc<dyn EnrollmentStore>,
    ledger: Arc<dyn FeeLedger>,
    documents: Arc<dyn DocumentStore>,
    events: broadcast::Sender<EnrollmentEvent>,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn EnrollmentStore>,
        ledger: Arc<dyn FeeLedger>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            ledger,
            documents,
            events,
        }
    }

    /// Subscribe to domain events emitted after successful commits
    pub fn subscribe(&self) -> broadcast::Receiver<EnrollmentEvent> {
        self.events.subscribe()
    }

    /// Open a new enrollment cycle at `PendingAssessment`.
    ///
    /// At most one non-terminal cycle may exist per (student, school
    /// year, semester); a completed or rejected cycle frees the period.
    pub async fn open_enrollment(
        &self,
        student_id: StudentId,
        school_year: impl Into<String>,
        semester: Semester,
    ) -> WorkflowResult<Enrollment> {
        let enrollment = Enrollment::new(student_id, school_year, semester);
        self.store.insert(enrollment.clone()).await?;

        info!(
            enrollment_id = %enrollment.id,
            student_id = %enrollment.student_id,
            school_year = %enrollment.school_year,
            semester = %enrollment.semester,
            "enrollment opened"
        );
        self.emit(EnrollmentEvent::Opened {
            enrollment_id: enrollment.id,
            student_id: enrollment.student_id.clone(),
        });
        Ok(enrollment)
    }

    /// Fetch one enrollment
    pub async fn get_enrollment(&self, id: &EnrollmentId) -> WorkflowResult<Enrollment> {
        Ok(self.store.get(id).await?)
    }

    /// The enrollment's transition history in append order
    pub async fn get_history(&self, id: &EnrollmentId) -> WorkflowResult<Vec<TransitionRecord>> {
        Ok(self.store.history(id).await?)
    }

    /// Target states this actor may currently request.
    ///
    /// Filtered by state and authorization only; preconditions are not
    /// evaluated here, so a listed target can still fail with
    /// `PreconditionFailed` when actually requested.
    pub async fn legal_actions(
        &self,
        id: &EnrollmentId,
        actor: &Actor,
    ) -> WorkflowResult<Vec<EnrollmentStatus>> {
        let enrollment = self.store.get(id).await?;
        Ok(rules_from(enrollment.status)
            .into_iter()
            .filter(|rule| permits(rule, actor, &enrollment))
            .map(|rule| rule.to)
            .collect())
    }

    /// Request a transition to `target`.
    ///
    /// Check order is fixed: terminal state, edge resolution,
    /// authorization, precondition, then the compare-and-swap commit.
    /// An unauthorized caller never learns whether the precondition
    /// would have held.
    pub async fn request_transition(
        &self,
        id: &EnrollmentId,
        actor: &Actor,
        target: EnrollmentStatus,
        payload: &TransitionPayload,
    ) -> WorkflowResult<Enrollment> {
        let enrollment = self.store.get(id).await?;

        if enrollment.is_terminal() {
            return Err(WorkflowError::TerminalState(enrollment.status));
        }
        let rule = resolve_rule(enrollment.status, target)?;
        authorize(rule, actor, &enrollment)?;
        preconditions::check(
            rule.precondition,
            &enrollment,
            payload,
            self.ledger.as_ref(),
            self.documents.as_ref(),
        )
        .await?;

        let mut updated = enrollment.clone();
        updated.status = target;
        updated.remarks = payload.remarks.clone();
        updated.updated_at = Utc::now();
        if target == EnrollmentStatus::Assessed {
            updated.assessment_ref = Some(format!("ledger:{}", updated.id));
        }
        if let Some(payment) = &payload.payment {
            if target == EnrollmentStatus::ForRegistrarVerification {
                updated.payment = Some(payment.clone());
            }
        }

        let record = TransitionRecord::new(
            enrollment.id,
            enrollment.status,
            target,
            actor,
            payload.remarks.clone(),
        );
        let committed = match self
            .store
            .commit_transition(enrollment.status, updated, record)
            .await
        {
            Ok(committed) => committed,
            Err(err) => {
                warn!(
                    enrollment_id = %id,
                    from = %enrollment.status,
                    to = %target,
                    error = %err,
                    "transition commit refused"
                );
                return Err(err.into());
            }
        };

        info!(
            enrollment_id = %id,
            from = %enrollment.status,
            to = %target,
            actor_role = %actor.role,
            actor_id = %actor.id,
            "enrollment transitioned"
        );
        self.emit(EnrollmentEvent::Transitioned {
            enrollment_id: committed.id,
            from_state: enrollment.status,
            to_state: target,
            actor_role: actor.role,
            actor_id: actor.id.clone(),
        });
        Ok(committed)
    }

    /// Replace the subject list while the enrollment sits at
    /// `ForSubjectSelection`. No status change, no history entry.
    pub async fn select_subjects(
        &self,
        id: &EnrollmentId,
        actor: &Actor,
        subjects: Vec<SubjectSelection>,
    ) -> WorkflowResult<Enrollment> {
        let enrollment = self.store.get(id).await?;

        let owner = actor.id.as_str() == enrollment.student_id.as_str();
        let allowed = match actor.role {
            ActorRole::Student => owner,
            role => role.acts_as_admin(),
        };
        if !allowed {
            return Err(WorkflowError::UnauthorizedActor {
                role: actor.role,
                action: "select subjects".to_string(),
            });
        }
        if enrollment.status != EnrollmentStatus::ForSubjectSelection {
            return Err(WorkflowError::PreconditionFailed {
                condition: format!(
                    "subjects may only be edited in {}, not {}",
                    EnrollmentStatus::ForSubjectSelection,
                    enrollment.status
                ),
            });
        }

        let mut updated = enrollment.clone();
        updated.set_subjects(subjects)?;
        let committed = self
            .store
            .update_in_state(EnrollmentStatus::ForSubjectSelection, updated)
            .await?;

        info!(
            enrollment_id = %id,
            count = committed.subjects.len(),
            actor_id = %actor.id,
            "subjects selected"
        );
        self.emit(EnrollmentEvent::SubjectsSelected {
            enrollment_id: committed.id,
            count: committed.subjects.len(),
        });
        Ok(committed)
    }

    /// Assign or reassign the student's section.
    ///
    /// Registrar and admin only, and only once subjects are approved
    /// (from `ForPayment` onward, before the cycle closes).
    pub async fn assign_section(
        &self,
        id: &EnrollmentId,
        actor: &Actor,
        section: SectionId,
    ) -> WorkflowResult<Enrollment> {
        let enrollment = self.store.get(id).await?;

        let allowed = actor.role == ActorRole::Registrar || actor.role.acts_as_admin();
        if !allowed {
            return Err(WorkflowError::UnauthorizedActor {
                role: actor.role,
                action: "assign section".to_string(),
            });
        }
        if !matches!(
            enrollment.status,
            EnrollmentStatus::ForPayment | EnrollmentStatus::ForRegistrarVerification
        ) {
            return Err(WorkflowError::PreconditionFailed {
                condition: format!("section cannot be assigned in {}", enrollment.status),
            });
        }

        let mut updated = enrollment.clone();
        updated.section = Some(section.clone());
        updated.updated_at = Utc::now();
        let committed = self.store.update_in_state(enrollment.status, updated).await?;

        info!(
            enrollment_id = %id,
            section = %section,
            actor_id = %actor.id,
            "section assigned"
        );
        self.emit(EnrollmentEvent::SectionAssigned {
            enrollment_id: committed.id,
            section: section.to_string(),
        });
        Ok(committed)
    }

    fn emit(&self, event: EnrollmentEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }
}
