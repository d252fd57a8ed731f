//! The transition table: the single source of truth for the state graph
//!
//! Each row names an edge, the roles allowed to take it, and the
//! precondition guarding it. Anything not in this table is not a legal
//! transition, and no dashboard holds a second opinion.

use enrollment_types::{ActorRole, EnrollmentStatus};

/// What must hold before an edge may be taken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    /// No condition beyond state and role
    None,
    /// Fee Ledger holds line items and a non-negative total
    AssessmentRecorded,
    /// Every document the student's type requires has a reference
    RequiredDocumentsPresent,
    /// Subject set is non-empty with no duplicate subject ids
    SubjectsSelected,
    /// Ledger total re-derived from the selected subjects' unit counts
    TotalReconciled,
    /// A payment reference or receipt document is attached
    PaymentAttached,
    /// Fee Ledger marks the enrollment fully paid
    FullyPaid,
}

/// One edge of the enrollment state graph
#[derive(Clone, Copy, Debug)]
pub struct TransitionRule {
    pub from: EnrollmentStatus,
    pub to: EnrollmentStatus,
    /// Roles that may take this edge (superadmin inherits admin)
    pub roles: &'static [ActorRole],
    /// Students may only act on their own enrollment
    pub self_only: bool,
    pub precondition: Precondition,
}

/// The complete legal state graph
pub const TRANSITION_TABLE: &[TransitionRule] = &[
    TransitionRule {
        from: EnrollmentStatus::PendingAssessment,
        to: EnrollmentStatus::Assessed,
        roles: &[ActorRole::Registrar, ActorRole::Admin],
        self_only: false,
        precondition: Precondition::AssessmentRecorded,
    },
    TransitionRule {
        from: EnrollmentStatus::PendingAssessment,
        to: EnrollmentStatus::Rejected,
        roles: &[ActorRole::Registrar, ActorRole::Admin],
        self_only: false,
        precondition: Precondition::None,
    },
    TransitionRule {
        from: EnrollmentStatus::Assessed,
        to: EnrollmentStatus::Rejected,
        roles: &[ActorRole::Registrar, ActorRole::Admin],
        self_only: false,
        precondition: Precondition::None,
    },
    TransitionRule {
        from: EnrollmentStatus::Assessed,
        to: EnrollmentStatus::ForSubjectSelection,
        roles: &[ActorRole::Dean, ActorRole::Admin],
        self_only: false,
        precondition: Precondition::RequiredDocumentsPresent,
    },
    TransitionRule {
        from: EnrollmentStatus::ForSubjectSelection,
        to: EnrollmentStatus::ForDeanApproval,
        roles: &[ActorRole::Student],
        self_only: true,
        precondition: Precondition::SubjectsSelected,
    },
    TransitionRule {
        from: EnrollmentStatus::ForDeanApproval,
        to: EnrollmentStatus::ForPayment,
        roles: &[ActorRole::Dean],
        self_only: false,
        precondition: Precondition::TotalReconciled,
    },
    TransitionRule {
        from: EnrollmentStatus::ForPayment,
        to: EnrollmentStatus::ForRegistrarVerification,
        roles: &[ActorRole::Student],
        self_only: true,
        precondition: Precondition::PaymentAttached,
    },
    TransitionRule {
        from: EnrollmentStatus::ForRegistrarVerification,
        to: EnrollmentStatus::Completed,
        roles: &[ActorRole::Registrar],
        self_only: false,
        precondition: Precondition::FullyPaid,
    },
];

/// Look up the edge between two states, if one exists
pub fn find_rule(
    from: EnrollmentStatus,
    to: EnrollmentStatus,
) -> Option<&'static TransitionRule> {
    TRANSITION_TABLE
        .iter()
        .find(|rule| rule.from == from && rule.to == to)
}

/// All edges leaving a state, in table (canonical) order
pub fn rules_from(from: EnrollmentStatus) -> Vec<&'static TransitionRule> {
    TRANSITION_TABLE
        .iter()
        .filter(|rule| rule.from == from)
        .collect()
}

/// All edges arriving at a state
pub fn rules_to(to: EnrollmentStatus) -> Vec<&'static TransitionRule> {
    TRANSITION_TABLE
        .iter()
        .filter(|rule| rule.to == to)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_edges_out_of_terminal_states() {
        assert!(rules_from(EnrollmentStatus::Completed).is_empty());
        assert!(rules_from(EnrollmentStatus::Rejected).is_empty());
    }

    #[test]
    fn test_forward_edges_never_skip() {
        for rule in TRANSITION_TABLE {
            if rule.to == EnrollmentStatus::Rejected {
                continue;
            }
            let from = rule.from.ordinal().expect("from is on the chain");
            let to = rule.to.ordinal().expect("to is on the chain");
            assert_eq!(to, from + 1, "edge {} -> {} skips a state", rule.from, rule.to);
        }
    }

    #[test]
    fn test_rejection_only_before_subject_selection() {
        let rejectable: Vec<_> = rules_to(EnrollmentStatus::Rejected)
            .iter()
            .map(|r| r.from)
            .collect();
        assert_eq!(
            rejectable,
            vec![
                EnrollmentStatus::PendingAssessment,
                EnrollmentStatus::Assessed
            ]
        );
    }

    #[test]
    fn test_every_chain_state_is_reachable() {
        for window in EnrollmentStatus::CANONICAL_ORDER.windows(2) {
            assert!(
                find_rule(window[0], window[1]).is_some(),
                "missing edge {} -> {}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn test_find_rule_misses_nonexistent_edges() {
        assert!(find_rule(
            EnrollmentStatus::ForPayment,
            EnrollmentStatus::Completed
        )
        .is_none());
        assert!(find_rule(
            EnrollmentStatus::Assessed,
            EnrollmentStatus::PendingAssessment
        )
        .is_none());
    }

    #[test]
    fn test_self_only_edges_belong_to_students() {
        for rule in TRANSITION_TABLE {
            if rule.self_only {
                assert_eq!(rule.roles, &[ActorRole::Student]);
            } else {
                assert!(!rule.roles.contains(&ActorRole::Student));
            }
        }
    }
}
