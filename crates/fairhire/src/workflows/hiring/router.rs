use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, JobDraft, JobId, NotificationId, Role, UserId};
use super::error::HiringError;
use super::matching;
use super::service::HiringService;
use super::store::{EntityStore, EventRepository, NotificationRepository};
use super::transition::{StatusUpdateRequest, TransitionCommand};

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

type SharedService<S, E, N> = Arc<HiringService<S, E, N>>;

/// Authenticated caller resolved from gateway headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    /// 403 response unless the caller holds `role`.
    pub fn require(&self, role: Role) -> Result<(), Response> {
        if self.role == role {
            return Ok(());
        }
        Err(error_response(HiringError::Forbidden(format!(
            "{} access required",
            role.label()
        ))))
    }
}

#[derive(Debug, Deserialize)]
pub struct MatchScoreRequest {
    #[serde(default)]
    pub job_skills: Vec<String>,
    #[serde(default)]
    pub candidate_skills: Vec<String>,
}

/// Router builder exposing the hiring lifecycle over HTTP.
pub fn hiring_router<S, E, N>(service: SharedService<S, E, N>) -> Router
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    Router::new()
        .route("/api/v1/jobs", post(create_job_handler::<S, E, N>))
        .route(
            "/api/v1/jobs/:job_id",
            put(update_job_handler::<S, E, N>).delete(delete_job_handler::<S, E, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications",
            get(job_applications_handler::<S, E, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/applications/blind",
            get(blind_applicants_handler::<S, E, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/apply",
            post(apply_handler::<S, E, N>).delete(withdraw_handler::<S, E, N>),
        )
        .route("/api/v1/jobs/:job_id/save", post(save_job_handler::<S, E, N>))
        .route("/api/v1/saved-jobs", get(saved_jobs_handler::<S, E, N>))
        .route("/api/v1/applications", get(my_applications_handler::<S, E, N>))
        .route(
            "/api/v1/applications/status/:applicant_id",
            get(application_status_handler::<S, E, N>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(status_handler::<S, E, N>),
        )
        .route(
            "/api/v1/applicants/:user_id",
            get(applicant_profile_handler::<S, E, N>),
        )
        .route("/api/v1/events", get(timeline_handler::<S, E, N>))
        .route("/api/v1/notifications", get(inbox_handler::<S, E, N>))
        .route(
            "/api/v1/notifications/:notification_id/read",
            put(mark_read_handler::<S, E, N>),
        )
        .route(
            "/api/v1/notifications/:notification_id",
            delete(delete_notification_handler::<S, E, N>),
        )
        .route(
            "/api/v1/dashboard/employer",
            get(employer_dashboard_handler::<S, E, N>),
        )
        .route(
            "/api/v1/dashboard/candidate",
            get(candidate_dashboard_handler::<S, E, N>),
        )
        .route("/api/v1/matching-jobs", get(matching_jobs_handler::<S, E, N>))
        .route("/api/v1/match-score", post(match_score_handler))
        .with_state(service)
}

/// Resolves the caller from the gateway headers; 401 when absent or malformed.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let user_id = header(USER_ID_HEADER);
    let role = header(USER_ROLE_HEADER).and_then(Role::parse);

    match (user_id, role) {
        (Some(user_id), Some(role)) => Ok(Actor {
            user_id: UserId::new(user_id),
            role,
        }),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({
                "error": "authentication required",
                "code": "unauthenticated",
            })),
        )
            .into_response()),
    }
}

/// Maps workflow errors onto HTTP responses.
pub fn error_response(error: HiringError) -> Response {
    let status = match &error {
        HiringError::NotFound { .. } => StatusCode::NOT_FOUND,
        HiringError::DuplicateApplication { .. } => {
            let payload = json!({
                "error": "already applied",
                "code": error.code(),
            });
            return (StatusCode::CONFLICT, axum::Json(payload)).into_response();
        }
        HiringError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        HiringError::Forbidden(_) => StatusCode::FORBIDDEN,
        HiringError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        HiringError::PartiallyApplied { application, .. } => {
            let payload = json!({
                "application": application,
                "event_recorded": false,
                "error": error.to_string(),
                "code": error.code(),
            });
            return (StatusCode::MULTI_STATUS, axum::Json(payload)).into_response();
        }
    };

    let payload = json!({
        "error": error.to_string(),
        "code": error.code(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_job_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Employer) {
        return response;
    }

    match service.create_job(&actor.user_id, draft) {
        Ok(job) => (StatusCode::CREATED, axum::Json(job)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_job_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.update_job(&actor.user_id, &JobId(job_id), draft) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_job_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.delete_job(&actor.user_id, &JobId(job_id)) {
        Ok(deletion) => (StatusCode::OK, axum::Json(deletion)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn job_applications_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let job_id = JobId(job_id);

    let job = match service.job(&job_id) {
        Ok(job) => job,
        Err(error) => return error_response(error),
    };
    if job.employer_id != actor.user_id {
        return error_response(HiringError::Forbidden(format!(
            "job '{job_id}' belongs to another employer"
        )));
    }

    match service.applications_for_job(&job_id) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn blind_applicants_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.blind_applicants(&actor.user_id, &JobId(job_id)) {
        Ok(applicants) => (StatusCode::OK, axum::Json(applicants)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn apply_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Jobseeker) {
        return response;
    }

    match service.create_application(&actor.user_id, &JobId(job_id)) {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn withdraw_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.cancel_application(&actor.user_id, &JobId(job_id)) {
        Ok(withdrawn) => {
            (StatusCode::OK, axum::Json(json!({ "withdrawn": withdrawn }))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn save_job_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(job_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Jobseeker) {
        return response;
    }
    let job_id = JobId(job_id);

    match service.toggle_saved_job(&actor.user_id, &job_id) {
        Ok(true) => (
            StatusCode::CREATED,
            axum::Json(json!({ "job_id": job_id, "saved": true })),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::OK,
            axum::Json(json!({ "job_id": job_id, "saved": false })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn saved_jobs_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Jobseeker) {
        return response;
    }

    match service.saved_jobs(&actor.user_id) {
        Ok(postings) => (StatusCode::OK, axum::Json(postings)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn my_applications_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Jobseeker) {
        return response;
    }

    match service.applications_for_user(&actor.user_id) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(error) => error_response(error),
    }
}

/// `status` is `"unknown"` when the applicant has no application with this employer.
pub(crate) async fn application_status_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(applicant_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Employer) {
        return response;
    }
    let applicant_id = UserId(applicant_id);

    match service.application_status_between(&actor.user_id, &applicant_id) {
        Ok(status) => {
            let payload = json!({
                "applicant_id": applicant_id,
                "status": status.map_or("unknown", |status| status.label()),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn applicant_profile_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Employer) {
        return response;
    }

    match service.applicant_profile(&actor.user_id, &UserId(user_id)) {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Employer) {
        return response;
    }

    let command = match TransitionCommand::try_from(request) {
        Ok(command) => command,
        Err(error) => return error_response(error),
    };

    let application_id = ApplicationId(application_id);
    let owner = service
        .application(&application_id)
        .and_then(|application| service.job(&application.job_id));
    match owner {
        Ok(job) if job.employer_id == actor.user_id => {}
        Ok(_) => {
            return error_response(HiringError::Forbidden(format!(
                "application '{application_id}' belongs to another employer's job"
            )))
        }
        Err(error) => return error_response(error),
    }

    match service.transition_status(&application_id, command) {
        Ok(outcome) => {
            let payload = json!({
                "application": outcome.application,
                "event": outcome.event,
                "event_recorded": true,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn timeline_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.timeline(&actor.user_id) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn inbox_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.notifications().inbox(&actor.user_id) {
        Ok(inbox) => (StatusCode::OK, axum::Json(inbox)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mark_read_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(notification_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let id = NotificationId(notification_id);

    match service.notifications().mark_read(&actor.user_id, &id) {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "id": id, "read": true }))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_notification_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
    Path(notification_id): Path<String>,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service
        .notifications()
        .delete(&actor.user_id, &NotificationId(notification_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn employer_dashboard_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Employer) {
        return response;
    }

    match service.employer_stats(&actor.user_id) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn candidate_dashboard_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    if let Err(response) = actor.require(Role::Jobseeker) {
        return response;
    }

    match service.candidate_stats(&actor.user_id) {
        Ok(stats) => (StatusCode::OK, axum::Json(stats)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn matching_jobs_handler<S, E, N>(
    State(service): State<SharedService<S, E, N>>,
    headers: HeaderMap,
) -> Response
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.matching_jobs(&actor.user_id) {
        Ok(jobs) => (StatusCode::OK, axum::Json(jobs)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn match_score_handler(
    axum::Json(request): axum::Json<MatchScoreRequest>,
) -> Response {
    let payload = json!({
        "match_score": matching::score(&request.job_skills, &request.candidate_skills),
        "matched_skills": matching::matched_skills(&request.job_skills, &request.candidate_skills),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
