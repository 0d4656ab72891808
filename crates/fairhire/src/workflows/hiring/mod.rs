//! Application lifecycle for the job marketplace: applying, status transitions with
//! their timeline events, in-app notifications, skill matching, and dashboards.

pub mod dashboard;
pub mod domain;
pub mod error;
pub mod events;
pub mod match_import;
pub mod matching;
pub mod memory;
pub mod notifications;
pub mod policy;
pub mod router;
pub mod service;
pub mod store;
pub mod transition;

#[cfg(test)]
mod tests;

pub use dashboard::{
    CandidateStats, ChecklistItem, DashboardAggregator, EmployerStats, JobSummary,
    RecentApplication,
};
pub use domain::{
    Application, ApplicationId, ApplicationStatus, CandidateProfile, Certification, Event,
    EventId, EventType, ExperienceEntry, InterviewMode, Job, JobDraft, JobId, MatchEntry,
    MatchList, Notification, NotificationId, RequirementsInput, Role, SavedJob, User, UserId,
};
pub use error::HiringError;
pub use events::{EventLog, TimelineEntry};
pub use match_import::{MatchImportError, MatchImporter};
pub use matching::{BlindApplicant, RankedJob};
pub use memory::MemoryStore;
pub use notifications::{Inbox, NotificationDispatcher, NotificationFailure};
pub use policy::{InterviewDatePolicy, LifecycleConfig};
pub use router::{actor_from_headers, error_response, hiring_router, Actor};
pub use service::{ApplicantProfile, HiringService, JobDeletion, SavedPosting};
pub use store::{
    ApplicationRepository, EntityStore, EventRepository, JobRepository, MatchRepository,
    NotificationRepository, ProfileRepository, SavedJobRepository, StoreError, UserRepository,
};
pub use transition::{
    StatusTransitionEngine, StatusUpdateRequest, TransitionCommand, TransitionOutcome,
};
