//! Per-edge authorization policy
//!
//! Checked before preconditions, so an unauthorized caller always sees
//! `UnauthorizedActor` regardless of collaborator state.

use crate::transition_table::TransitionRule;
use enrollment_types::{Actor, ActorRole, Enrollment, WorkflowError, WorkflowResult};

/// Whether a role is in the rule's allowed set.
/// Superadmin inherits every edge admin holds.
pub fn role_allowed(rule: &TransitionRule, role: ActorRole) -> bool {
    rule.roles.contains(&role)
        || (role == ActorRole::Superadmin && rule.roles.contains(&ActorRole::Admin))
}

/// Whether this actor may take this edge on this enrollment
pub fn permits(rule: &TransitionRule, actor: &Actor, enrollment: &Enrollment) -> bool {
    role_allowed(rule, actor.role)
        && (!rule.self_only || actor.id.as_str() == enrollment.student_id.as_str())
}

/// Authorize or return the typed refusal
pub fn authorize(
    rule: &TransitionRule,
    actor: &Actor,
    enrollment: &Enrollment,
) -> WorkflowResult<()> {
    if !role_allowed(rule, actor.role) {
        return Err(WorkflowError::UnauthorizedActor {
            role: actor.role,
            action: format!("transition {} to {}", rule.from, rule.to),
        });
    }
    if rule.self_only && actor.id.as_str() != enrollment.student_id.as_str() {
        return Err(WorkflowError::UnauthorizedActor {
            role: actor.role,
            action: format!(
                "transition {} to {} on another student's enrollment",
                rule.from, rule.to
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transition_table::find_rule;
    use enrollment_types::{EnrollmentStatus, Semester, StudentId};

    fn make_enrollment() -> Enrollment {
        Enrollment::new(StudentId::new("stu-1"), "2024-2025", Semester::First)
    }

    #[test]
    fn test_allowed_roles_pass() {
        let rule = find_rule(
            EnrollmentStatus::PendingAssessment,
            EnrollmentStatus::Assessed,
        )
        .unwrap();
        let enrollment = make_enrollment();
        assert!(authorize(rule, &Actor::new(ActorRole::Registrar, "reg-1"), &enrollment).is_ok());
        assert!(authorize(rule, &Actor::new(ActorRole::Admin, "adm-1"), &enrollment).is_ok());
    }

    #[test]
    fn test_superadmin_inherits_admin_edges() {
        let rule = find_rule(
            EnrollmentStatus::Assessed,
            EnrollmentStatus::ForSubjectSelection,
        )
        .unwrap();
        let enrollment = make_enrollment();
        assert!(authorize(rule, &Actor::new(ActorRole::Superadmin, "root"), &enrollment).is_ok());
    }

    #[test]
    fn test_wrong_role_refused() {
        let rule = find_rule(
            EnrollmentStatus::PendingAssessment,
            EnrollmentStatus::Assessed,
        )
        .unwrap();
        let enrollment = make_enrollment();
        let err =
            authorize(rule, &Actor::new(ActorRole::Student, "stu-1"), &enrollment).unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedActor { .. }));

        let err =
            authorize(rule, &Actor::new(ActorRole::Cashier, "cash-1"), &enrollment).unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedActor { .. }));
    }

    #[test]
    fn test_self_only_edge_requires_owner() {
        let rule = find_rule(
            EnrollmentStatus::ForSubjectSelection,
            EnrollmentStatus::ForDeanApproval,
        )
        .unwrap();
        let enrollment = make_enrollment();

        assert!(authorize(rule, &Actor::new(ActorRole::Student, "stu-1"), &enrollment).is_ok());

        let err =
            authorize(rule, &Actor::new(ActorRole::Student, "stu-2"), &enrollment).unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedActor { .. }));

        // Admin does not inherit student-only edges
        let err =
            authorize(rule, &Actor::new(ActorRole::Admin, "adm-1"), &enrollment).unwrap_err();
        assert!(matches!(err, WorkflowError::UnauthorizedActor { .. }));
    }
}
