//! Domain events emitted by the engine on successful commits

use crate::{ActorId, ActorRole, EnrollmentId, EnrollmentStatus, StudentId};
use serde::{Deserialize, Serialize};

/// What just happened to an enrollment.
///
/// Broadcast after the corresponding store commit succeeds, so a
/// subscriber never observes an event for a transition that lost its
/// compare-and-swap race.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EnrollmentEvent {
    Opened {
        enrollment_id: EnrollmentId,
        student_id: StudentId,
    },
    Transitioned {
        enrollment_id: EnrollmentId,
        from_state: EnrollmentStatus,
        to_state: EnrollmentStatus,
        actor_role: ActorRole,
        actor_id: ActorId,
    },
    SubjectsSelected {
        enrollment_id: EnrollmentId,
        count: usize,
    },
    SectionAssigned {
        enrollment_id: EnrollmentId,
        section: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let event = EnrollmentEvent::Transitioned {
            enrollment_id: EnrollmentId::generate(),
            from_state: EnrollmentStatus::ForPayment,
            to_state: EnrollmentStatus::ForRegistrarVerification,
            actor_role: ActorRole::Student,
            actor_id: ActorId::new("2024-00123"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "transitioned");
        assert_eq!(json["to_state"], "ForRegistrarVerification");
    }
}
