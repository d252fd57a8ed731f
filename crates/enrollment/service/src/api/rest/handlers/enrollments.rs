//! Enrollment handlers: the HTTP face of the workflow engine
//!
//! Handlers translate between the wire and the engine; no workflow
//! decision is made here. Whatever the engine refuses comes back as
//! the typed error envelope.

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use enrollment_types::{
    Actor, ActorRole, Enrollment, EnrollmentId, EnrollmentStatus, SectionId, Semester, StudentId,
    SubjectSelection, TransitionPayload, TransitionRecord,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn parse_enrollment_id(raw: &str) -> Result<EnrollmentId, ApiError> {
    Uuid::parse_str(raw)
        .map(EnrollmentId::from_uuid)
        .map_err(|_| ApiError::BadRequest(format!("invalid enrollment id: {}", raw)))
}

/// Success envelope around an enrollment
#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub status: &'static str,
    pub enrollment: Enrollment,
}

impl EnrollmentResponse {
    fn ok(enrollment: Enrollment) -> Json<Self> {
        Json(Self {
            status: "ok",
            enrollment,
        })
    }
}

/// Open enrollment request
#[derive(Debug, Deserialize)]
pub struct OpenEnrollmentRequest {
    pub student_id: String,
    pub school_year: String,
    pub semester: Semester,
}

/// Open a new enrollment cycle
pub async fn open_enrollment(
    State(state): State<AppState>,
    Json(request): Json<OpenEnrollmentRequest>,
) -> ApiResult<(StatusCode, Json<EnrollmentResponse>)> {
    let enrollment = state
        .engine
        .open_enrollment(
            StudentId::new(request.student_id),
            request.school_year,
            request.semester,
        )
        .await?;
    Ok((StatusCode::CREATED, EnrollmentResponse::ok(enrollment)))
}

/// Fetch one enrollment
pub async fn get_enrollment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<EnrollmentResponse>> {
    let id = parse_enrollment_id(&id)?;
    let enrollment = state.engine.get_enrollment(&id).await?;
    Ok(EnrollmentResponse::ok(enrollment))
}

/// Transition request body
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub actor_role: ActorRole,
    pub actor_id: String,
    pub target_state: EnrollmentStatus,
    #[serde(default)]
    pub payload: TransitionPayload,
}

/// Request a status transition
pub async fn request_transition(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Json<EnrollmentResponse>> {
    let id = parse_enrollment_id(&id)?;
    let actor = Actor::new(request.actor_role, request.actor_id);
    let enrollment = state
        .engine
        .request_transition(&id, &actor, request.target_state, &request.payload)
        .await?;
    Ok(EnrollmentResponse::ok(enrollment))
}

/// Subject selection body
#[derive(Debug, Deserialize)]
pub struct SelectSubjectsRequest {
    pub actor_role: ActorRole,
    pub actor_id: String,
    pub subjects: Vec<SubjectSelectionBody>,
}

/// One subject in a selection request
#[derive(Debug, Deserialize)]
pub struct SubjectSelectionBody {
    pub subject_id: String,
    pub schedule_ref: String,
}

/// Replace the enrollment's subject list
pub async fn select_subjects(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SelectSubjectsRequest>,
) -> ApiResult<Json<EnrollmentResponse>> {
    let id = parse_enrollment_id(&id)?;
    let actor = Actor::new(request.actor_role, request.actor_id);
    let subjects = request
        .subjects
        .into_iter()
        .map(|s| SubjectSelection::new(s.subject_id, s.schedule_ref))
        .collect();
    let enrollment = state.engine.select_subjects(&id, &actor, subjects).await?;
    Ok(EnrollmentResponse::ok(enrollment))
}

/// Section assignment body
#[derive(Debug, Deserialize)]
pub struct AssignSectionRequest {
    pub actor_role: ActorRole,
    pub actor_id: String,
    pub section: String,
}

/// Assign the student's section
pub async fn assign_section(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AssignSectionRequest>,
) -> ApiResult<Json<EnrollmentResponse>> {
    let id = parse_enrollment_id(&id)?;
    let actor = Actor::new(request.actor_role, request.actor_id);
    let enrollment = state
        .engine
        .assign_section(&id, &actor, SectionId::new(request.section))
        .await?;
    Ok(EnrollmentResponse::ok(enrollment))
}

/// Legal actions query params
#[derive(Debug, Deserialize)]
pub struct LegalActionsQuery {
    pub role: String,
    pub actor_id: String,
}

/// Legal actions response
#[derive(Debug, Serialize)]
pub struct LegalActionsResponse {
    pub status: &'static str,
    pub actions: Vec<EnrollmentStatus>,
}

/// Target states the given actor may currently request
pub async fn legal_actions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LegalActionsQuery>,
) -> ApiResult<Json<LegalActionsResponse>> {
    let id = parse_enrollment_id(&id)?;
    let role: ActorRole = query
        .role
        .parse()
        .map_err(|e: String| ApiError::BadRequest(e))?;
    let actor = Actor::new(role, query.actor_id);
    let actions = state.engine.legal_actions(&id, &actor).await?;
    Ok(Json(LegalActionsResponse {
        status: "ok",
        actions,
    }))
}

/// History response
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub status: &'static str,
    pub history: Vec<TransitionRecord>,
}

/// The enrollment's transition records in append order
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let id = parse_enrollment_id(&id)?;
    let history = state.engine.get_history(&id).await?;
    Ok(Json(HistoryResponse {
        status: "ok",
        history,
    }))
}
