//! Enrollment domain types
//!
//! The vocabulary shared by the workflow engine and its callers:
//! enrollment entities, the canonical status set, actors and roles,
//! append-only transition records, transition payloads, domain events,
//! and the workflow error taxonomy.
//!
//! These types carry the data model invariants (duplicate-free subject
//! sets, immutable creation timestamps, a single status vocabulary);
//! the transition rules themselves live in `enrollment-engine`.

#![deny(unsafe_code)]

pub mod actor;
pub mod enrollment;
pub mod error;
pub mod events;
pub mod history;
pub mod ids;
pub mod payload;
pub mod status;

pub use actor::{Actor, ActorRole};
pub use enrollment::{Enrollment, PaymentReference, Semester, SubjectSelection};
pub use error::{WorkflowError, WorkflowResult};
pub use events::EnrollmentEvent;
pub use history::TransitionRecord;
pub use ids::{ActorId, EnrollmentId, SectionId, StudentId, SubjectId};
pub use payload::TransitionPayload;
pub use status::EnrollmentStatus;
