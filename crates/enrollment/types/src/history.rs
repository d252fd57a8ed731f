//! Transition records: the append-only audit trail
//!
//! Records are never mutated or deleted. They are the durable history
//! of an enrollment independent of its mutable `status` field; the
//! current status always equals the `to_state` of the latest record
//! (or the initial state when the history is empty).

use crate::{Actor, ActorId, ActorRole, EnrollmentId, EnrollmentStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One edge taken by one actor at one point in time
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// The enrollment this record belongs to
    pub enrollment_id: EnrollmentId,
    /// Per-enrollment sequence number, assigned by the store on append
    pub sequence: u64,
    /// State the enrollment left
    pub from_state: EnrollmentStatus,
    /// State the enrollment entered
    pub to_state: EnrollmentStatus,
    /// Role of the actor who took the edge
    pub actor_role: ActorRole,
    /// Identity of the actor who took the edge
    pub actor_id: ActorId,
    /// When the transition committed
    pub timestamp: DateTime<Utc>,
    /// Free-text annotation supplied with the transition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

impl TransitionRecord {
    /// Build a record for an edge about to be committed. The store
    /// assigns the authoritative sequence number on append.
    pub fn new(
        enrollment_id: EnrollmentId,
        from_state: EnrollmentStatus,
        to_state: EnrollmentStatus,
        actor: &Actor,
        remarks: Option<String>,
    ) -> Self {
        Self {
            enrollment_id,
            sequence: 0,
            from_state,
            to_state,
            actor_role: actor.role,
            actor_id: actor.id.clone(),
            timestamp: Utc::now(),
            remarks,
        }
    }
}
