use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::workflows::hiring::domain::{
    Event, Job, JobDraft, JobId, Notification, NotificationId, RequirementsInput, Role, User,
    UserId,
};
use crate::workflows::hiring::memory::MemoryStore;
use crate::workflows::hiring::router::{USER_ID_HEADER, USER_ROLE_HEADER};
use crate::workflows::hiring::store::{
    EventRepository, NotificationRepository, StoreError, UserRepository,
};
use crate::workflows::hiring::{HiringService, LifecycleConfig};

pub(super) type MemoryService = HiringService<MemoryStore, MemoryStore, MemoryStore>;

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Clock pinned to a settable instant.
#[derive(Clone)]
pub(super) struct FixedClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub(super) fn at(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    pub(super) fn advance(&self, by: Duration) {
        let mut guard = self.instant.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.instant.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn employer_id() -> UserId {
    UserId::new("usr-employer")
}

pub(super) fn candidate_id() -> UserId {
    UserId::new("usr-candidate")
}

pub(super) fn seed_users(store: &MemoryStore) {
    store
        .insert_user(User::new(
            employer_id(),
            "Northwind Labs",
            "hiring@northwind.example",
            Role::Employer,
            now(),
        ))
        .expect("seed employer");
    store
        .insert_user(User::new(
            candidate_id(),
            "Asha Rao",
            "asha@example.com",
            Role::Jobseeker,
            now(),
        ))
        .expect("seed candidate");
}

pub(super) fn draft(title: &str, requirements: &[&str]) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: "Build and run the platform".to_string(),
        location: "Remote".to_string(),
        job_type: Some("Full-time".to_string()),
        salary: None,
        requirements: RequirementsInput::List(
            requirements.iter().map(|skill| skill.to_string()).collect(),
        ),
    }
}

pub(super) fn build_service_with(
    config: LifecycleConfig,
) -> (MemoryService, Arc<MemoryStore>, FixedClock) {
    let store = Arc::new(MemoryStore::new());
    seed_users(&store);
    let clock = FixedClock::at(now());
    let service = HiringService::with_clock(
        store.clone(),
        store.clone(),
        store.clone(),
        config,
        Arc::new(clock.clone()),
    );
    (service, store, clock)
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryStore>, FixedClock) {
    build_service_with(LifecycleConfig::default())
}

/// Service with one posted job, returned alongside it.
pub(super) fn service_with_job() -> (MemoryService, Arc<MemoryStore>, FixedClock, Job) {
    let (service, store, clock) = build_service();
    let job = service
        .create_job(&employer_id(), draft("Backend Engineer", &["Rust", "SQL"]))
        .expect("job created");
    (service, store, clock, job)
}

/// Event storage whose writes always fail. Reads see an empty log.
pub(super) struct UnavailableEvents;

impl EventRepository for UnavailableEvents {
    fn append_event(&self, _event: Event) -> Result<Event, StoreError> {
        Err(StoreError::Unavailable("event store offline".to_string()))
    }

    fn events_for_user(&self, _user_id: &UserId) -> Result<Vec<Event>, StoreError> {
        Ok(Vec::new())
    }

    fn delete_events_for_job(&self, _job_id: &JobId) -> Result<usize, StoreError> {
        Ok(0)
    }
}

/// Notification storage that rejects every write and counts the attempts.
#[derive(Default)]
pub(super) struct UnavailableNotifications {
    attempts: Mutex<usize>,
}

impl UnavailableNotifications {
    pub(super) fn attempts(&self) -> usize {
        *self.attempts.lock().expect("attempt mutex poisoned")
    }
}

impl NotificationRepository for UnavailableNotifications {
    fn insert_notification(
        &self,
        _notification: Notification,
    ) -> Result<Notification, StoreError> {
        *self.attempts.lock().expect("attempt mutex poisoned") += 1;
        Err(StoreError::Unavailable("notification store offline".to_string()))
    }

    fn notification(&self, _id: &NotificationId) -> Result<Option<Notification>, StoreError> {
        Ok(None)
    }

    fn notifications_for_user(&self, _user_id: &UserId) -> Result<Vec<Notification>, StoreError> {
        Ok(Vec::new())
    }

    fn mark_notification_read(&self, _id: &NotificationId) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn delete_notification(&self, _id: &NotificationId) -> Result<bool, StoreError> {
        Ok(false)
    }
}

pub(super) fn authed_request(
    method: Method,
    uri: &str,
    user: &UserId,
    role: Role,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_ID_HEADER, user.as_str())
        .header(USER_ROLE_HEADER, role.label());

    match body {
        Some(json) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).expect("serialize body")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
