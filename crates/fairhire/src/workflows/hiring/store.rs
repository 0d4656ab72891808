use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateProfile, Event, Job, JobId, MatchList,
    Notification, NotificationId, Role, SavedJob, User, UserId,
};

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait UserRepository: Send + Sync {
    fn insert_user(&self, user: User) -> Result<User, StoreError>;
    fn user(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    fn users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError>;
}

pub trait JobRepository: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, StoreError>;
    fn job(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    /// Replaces an existing posting; `NotFound` when it does not exist.
    fn update_job(&self, job: Job) -> Result<(), StoreError>;
    fn delete_job(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    fn jobs_by_employer(&self, employer_id: &UserId) -> Result<Vec<Job>, StoreError>;
}

/// Application persistence. Implementations own the `(user_id, job_id)` uniqueness
/// constraint and must report a violation as [`StoreError::Conflict`] atomically with
/// the insert.
pub trait ApplicationRepository: Send + Sync {
    fn insert_application(&self, application: Application) -> Result<Application, StoreError>;
    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    /// Single-field status write. Returns the updated record or `None` when absent.
    fn set_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Application>, StoreError>;
    fn delete_application(&self, user_id: &UserId, job_id: &JobId) -> Result<bool, StoreError>;
    fn applications_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError>;
    fn applications_for_user(&self, user_id: &UserId) -> Result<Vec<Application>, StoreError>;
    fn delete_applications_for_job(&self, job_id: &JobId) -> Result<usize, StoreError>;
}

pub trait ProfileRepository: Send + Sync {
    fn candidate_profile(&self, user_id: &UserId) -> Result<Option<CandidateProfile>, StoreError>;
    fn upsert_candidate_profile(
        &self,
        user_id: &UserId,
        profile: CandidateProfile,
    ) -> Result<(), StoreError>;
}

pub trait MatchRepository: Send + Sync {
    fn match_list(&self, user_id: &UserId) -> Result<Option<MatchList>, StoreError>;
    fn replace_match_list(&self, list: MatchList) -> Result<(), StoreError>;
}

/// Bookmarked postings. Like applications, at most one record per `(user_id, job_id)`.
pub trait SavedJobRepository: Send + Sync {
    /// Saves the posting, or removes the existing bookmark for the same pair.
    /// Returns `true` when the pair is saved afterwards.
    fn toggle_saved_job(&self, saved: SavedJob) -> Result<bool, StoreError>;
    fn saved_jobs_for_user(&self, user_id: &UserId) -> Result<Vec<SavedJob>, StoreError>;
    fn delete_saved_jobs_for_job(&self, job_id: &JobId) -> Result<usize, StoreError>;
}

/// Append-only event storage. Job deletion is the only removal path.
pub trait EventRepository: Send + Sync {
    fn append_event(&self, event: Event) -> Result<Event, StoreError>;
    fn events_for_user(&self, user_id: &UserId) -> Result<Vec<Event>, StoreError>;
    fn delete_events_for_job(&self, job_id: &JobId) -> Result<usize, StoreError>;
}

pub trait NotificationRepository: Send + Sync {
    fn insert_notification(&self, notification: Notification)
        -> Result<Notification, StoreError>;
    fn notification(&self, id: &NotificationId) -> Result<Option<Notification>, StoreError>;
    fn notifications_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, StoreError>;
    fn mark_notification_read(&self, id: &NotificationId) -> Result<bool, StoreError>;
    fn delete_notification(&self, id: &NotificationId) -> Result<bool, StoreError>;
}

/// Entity tables the hiring service reads and writes directly.
pub trait EntityStore:
    UserRepository
    + JobRepository
    + ApplicationRepository
    + SavedJobRepository
    + ProfileRepository
    + MatchRepository
{
}

impl<T> EntityStore for T where
    T: UserRepository
        + JobRepository
        + ApplicationRepository
        + SavedJobRepository
        + ProfileRepository
        + MatchRepository
{
}
