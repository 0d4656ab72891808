use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, CandidateProfile, Event, EventId, Job, JobId,
    MatchList, Notification, NotificationId, Role, SavedJob, User, UserId,
};
use super::store::{
    ApplicationRepository, EventRepository, JobRepository, MatchRepository,
    NotificationRepository, ProfileRepository, SavedJobRepository, StoreError, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    jobs: BTreeMap<JobId, Job>,
    applications: BTreeMap<ApplicationId, Application>,
    application_pairs: HashMap<(UserId, JobId), ApplicationId>,
    saved_jobs: BTreeMap<(UserId, JobId), SavedJob>,
    profiles: HashMap<UserId, CandidateProfile>,
    matches: HashMap<UserId, MatchList>,
    events: BTreeMap<EventId, Event>,
    notifications: BTreeMap<NotificationId, Notification>,
}

/// Process-local store backing the service and demo. Every mutation runs under a single
/// lock, which is what makes the application uniqueness check atomic with the insert.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl UserRepository for MemoryStore {
    fn insert_user(&self, user: User) -> Result<User, StoreError> {
        let mut tables = self.tables()?;
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::Conflict);
        }
        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.get(id).cloned())
    }

    fn users_by_role(&self, role: Role) -> Result<Vec<User>, StoreError> {
        Ok(self
            .tables()?
            .users
            .values()
            .filter(|user| user.role == role)
            .cloned()
            .collect())
    }
}

impl JobRepository for MemoryStore {
    fn insert_job(&self, job: Job) -> Result<Job, StoreError> {
        let mut tables = self.tables()?;
        if tables.jobs.contains_key(&job.id) {
            return Err(StoreError::Conflict);
        }
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.tables()?.jobs.get(id).cloned())
    }

    fn update_job(&self, job: Job) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        match tables.jobs.get_mut(&job.id) {
            Some(existing) => {
                *existing = job;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn delete_job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.tables()?.jobs.remove(id))
    }

    fn jobs_by_employer(&self, employer_id: &UserId) -> Result<Vec<Job>, StoreError> {
        Ok(self
            .tables()?
            .jobs
            .values()
            .filter(|job| &job.employer_id == employer_id)
            .cloned()
            .collect())
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut tables = self.tables()?;
        let pair = (application.user_id.clone(), application.job_id.clone());
        if tables.application_pairs.contains_key(&pair)
            || tables.applications.contains_key(&application.id)
        {
            return Err(StoreError::Conflict);
        }
        tables
            .application_pairs
            .insert(pair, application.id.clone());
        tables
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn application(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self.tables()?.applications.get(id).cloned())
    }

    fn set_application_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Application>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables.applications.get_mut(id).map(|application| {
            application.status = status;
            application.updated_at = updated_at;
            application.clone()
        }))
    }

    fn delete_application(&self, user_id: &UserId, job_id: &JobId) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let pair = (user_id.clone(), job_id.clone());
        match tables.application_pairs.remove(&pair) {
            Some(id) => {
                tables.applications.remove(&id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn applications_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, StoreError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .filter(|application| &application.job_id == job_id)
            .cloned()
            .collect())
    }

    fn applications_for_user(&self, user_id: &UserId) -> Result<Vec<Application>, StoreError> {
        Ok(self
            .tables()?
            .applications
            .values()
            .filter(|application| &application.user_id == user_id)
            .cloned()
            .collect())
    }

    fn delete_applications_for_job(&self, job_id: &JobId) -> Result<usize, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.applications.len();
        tables
            .applications
            .retain(|_, application| &application.job_id != job_id);
        tables.application_pairs.retain(|(_, job), _| job != job_id);
        Ok(before - tables.applications.len())
    }
}

impl SavedJobRepository for MemoryStore {
    fn toggle_saved_job(&self, saved: SavedJob) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let pair = (saved.user_id.clone(), saved.job_id.clone());
        if tables.saved_jobs.remove(&pair).is_some() {
            return Ok(false);
        }
        tables.saved_jobs.insert(pair, saved);
        Ok(true)
    }

    fn saved_jobs_for_user(&self, user_id: &UserId) -> Result<Vec<SavedJob>, StoreError> {
        Ok(self
            .tables()?
            .saved_jobs
            .values()
            .filter(|saved| &saved.user_id == user_id)
            .cloned()
            .collect())
    }

    fn delete_saved_jobs_for_job(&self, job_id: &JobId) -> Result<usize, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.saved_jobs.len();
        tables.saved_jobs.retain(|(_, job), _| job != job_id);
        Ok(before - tables.saved_jobs.len())
    }
}

impl ProfileRepository for MemoryStore {
    fn candidate_profile(&self, user_id: &UserId) -> Result<Option<CandidateProfile>, StoreError> {
        Ok(self.tables()?.profiles.get(user_id).cloned())
    }

    fn upsert_candidate_profile(
        &self,
        user_id: &UserId,
        mut profile: CandidateProfile,
    ) -> Result<(), StoreError> {
        profile.user_id = Some(user_id.clone());
        self.tables()?.profiles.insert(user_id.clone(), profile);
        Ok(())
    }
}

impl MatchRepository for MemoryStore {
    fn match_list(&self, user_id: &UserId) -> Result<Option<MatchList>, StoreError> {
        Ok(self.tables()?.matches.get(user_id).cloned())
    }

    fn replace_match_list(&self, list: MatchList) -> Result<(), StoreError> {
        self.tables()?.matches.insert(list.user_id.clone(), list);
        Ok(())
    }
}

impl EventRepository for MemoryStore {
    fn append_event(&self, event: Event) -> Result<Event, StoreError> {
        let mut tables = self.tables()?;
        if tables.events.contains_key(&event.id) {
            return Err(StoreError::Conflict);
        }
        tables.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    fn events_for_user(&self, user_id: &UserId) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .tables()?
            .events
            .values()
            .filter(|event| &event.user_id == user_id)
            .cloned()
            .collect())
    }

    fn delete_events_for_job(&self, job_id: &JobId) -> Result<usize, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.events.len();
        tables.events.retain(|_, event| &event.job_id != job_id);
        Ok(before - tables.events.len())
    }
}

impl NotificationRepository for MemoryStore {
    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, StoreError> {
        let mut tables = self.tables()?;
        if tables.notifications.contains_key(&notification.id) {
            return Err(StoreError::Conflict);
        }
        tables
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(notification)
    }

    fn notification(&self, id: &NotificationId) -> Result<Option<Notification>, StoreError> {
        Ok(self.tables()?.notifications.get(id).cloned())
    }

    fn notifications_for_user(&self, user_id: &UserId) -> Result<Vec<Notification>, StoreError> {
        Ok(self
            .tables()?
            .notifications
            .values()
            .filter(|notification| &notification.user_id == user_id)
            .cloned()
            .collect())
    }

    fn mark_notification_read(&self, id: &NotificationId) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        Ok(match tables.notifications.get_mut(id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        })
    }

    fn delete_notification(&self, id: &NotificationId) -> Result<bool, StoreError> {
        Ok(self.tables()?.notifications.remove(id).is_some())
    }
}
