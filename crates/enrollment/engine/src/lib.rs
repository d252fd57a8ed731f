//! Enrollment Workflow Engine
//!
//! The engine owns the enrollment status workflow: the transition
//! table, per-edge authorization, precondition validators, and the
//! compare-and-swap commit discipline that keeps concurrent actors
//! from both advancing the same enrollment out of the same state.
//!
//! # Key Principle
//!
//! **No dashboard decides what is legal.** Callers ask the engine for
//! a transition and surface whatever typed error comes back; the legal
//! state graph lives in exactly one place.
//!
//! # Architecture
//!
//! The [`WorkflowEngine`] composes specialized pieces:
//!
//! - [`transition_table`] - the static state graph: edges, allowed
//!   roles, and the precondition guarding each edge
//! - [`authorization`] - role and self-ownership checks per edge
//! - [`preconditions`] - validators evaluated against collaborator
//!   state at request time
//! - [`collaborators`] - trait seams for the Fee Ledger and Document
//!   Reference Store
//! - [`store`] - the persistence seam whose `commit_transition` is the
//!   atomic unit: status swap + transition record append, or neither
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use enrollment_engine::{
//!     MemoryDocumentStore, MemoryEnrollmentStore, MemoryFeeLedger, WorkflowEngine,
//! };
//! use enrollment_types::{Actor, ActorRole, EnrollmentStatus, Semester, StudentId, TransitionPayload};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let ledger = Arc::new(MemoryFeeLedger::new());
//! let engine = WorkflowEngine::new(
//!     Arc::new(MemoryEnrollmentStore::new()),
//!     ledger.clone(),
//!     Arc::new(MemoryDocumentStore::new()),
//! );
//!
//! let enrollment = engine
//!     .open_enrollment(StudentId::new("2024-00123"), "2024-2025", Semester::First)
//!     .await
//!     .unwrap();
//! assert_eq!(enrollment.status, EnrollmentStatus::PendingAssessment);
//!
//! ledger.record_assessment(&enrollment.id, 5, 14_000_00).await;
//! let registrar = Actor::new(ActorRole::Registrar, "reg-1");
//! let assessed = engine
//!     .request_transition(
//!         &enrollment.id,
//!         &registrar,
//!         EnrollmentStatus::Assessed,
//!         &TransitionPayload::new(),
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(assessed.status, EnrollmentStatus::Assessed);
//! # });
//! ```

#![deny(unsafe_code)]

pub mod authorization;
pub mod collaborators;
pub mod engine;
pub mod preconditions;
pub mod store;
pub mod transition_table;

pub use collaborators::{
    CollaboratorError, CollaboratorResult, DocumentStore, FeeLedger, LedgerAssessment,
    MemoryDocumentStore, MemoryFeeLedger, RECEIPT_DOCUMENT,
};
pub use engine::WorkflowEngine;
pub use store::{EnrollmentStore, MemoryEnrollmentStore, StoreError, StoreResult};
pub use transition_table::{find_rule, rules_from, Precondition, TransitionRule, TRANSITION_TABLE};
