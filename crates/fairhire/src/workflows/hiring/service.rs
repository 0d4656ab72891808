use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use serde::Serialize;
use tracing::info;

use super::dashboard::{CandidateStats, DashboardAggregator, EmployerStats};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Event, Job, JobDraft, JobId, Role, SavedJob,
    User, UserId,
};
use super::error::HiringError;
use super::events::{EventLog, TimelineEntry};
use super::matching::{self, BlindApplicant, RankedJob};
use super::notifications::NotificationDispatcher;
use super::policy::LifecycleConfig;
use super::store::{EntityStore, EventRepository, NotificationRepository, StoreError};
use super::transition::{StatusTransitionEngine, TransitionCommand, TransitionOutcome};

/// Service composing the entity store, event log, transition engine, notification
/// dispatcher, and dashboard aggregator behind the marketplace's core operations.
pub struct HiringService<S, E, N> {
    store: Arc<S>,
    events: EventLog<E>,
    engine: StatusTransitionEngine<S, E>,
    notifications: NotificationDispatcher<N>,
    dashboard: DashboardAggregator<S, E>,
    clock: Arc<dyn Clock>,
}

/// What a job deletion removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobDeletion {
    pub job: Job,
    pub applications_removed: usize,
    pub events_removed: usize,
    pub saved_removed: usize,
}

/// A bookmarked posting as listed back to the candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedPosting {
    pub job: Job,
    pub employer_name: String,
    pub saved_at: DateTime<Utc>,
}

/// Contact profile of a candidate, shown to an employer they applied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicantProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub resume_url: Option<String>,
    pub skills: Vec<String>,
    pub status: ApplicationStatus,
}

impl<S, E, N> HiringService<S, E, N>
where
    S: EntityStore + 'static,
    E: EventRepository + 'static,
    N: NotificationRepository + 'static,
{
    pub fn new(
        store: Arc<S>,
        events: Arc<E>,
        notifications: Arc<N>,
        config: LifecycleConfig,
    ) -> Self {
        Self::with_clock(store, events, notifications, config, Arc::new(DefaultClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        events: Arc<E>,
        notifications: Arc<N>,
        config: LifecycleConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let events = EventLog::new(events);
        let window = config.delta_window();
        let engine = StatusTransitionEngine::new(
            Arc::clone(&store),
            events.clone(),
            config,
            Arc::clone(&clock),
        );
        let notifications = NotificationDispatcher::new(notifications, Arc::clone(&clock));
        let dashboard = DashboardAggregator::new(
            Arc::clone(&store),
            events.clone(),
            Arc::clone(&clock),
            window,
        );

        Self {
            store,
            events,
            engine,
            notifications,
            dashboard,
            clock,
        }
    }

    pub fn notifications(&self) -> &NotificationDispatcher<N> {
        &self.notifications
    }

    /// Publish a posting and announce it to every jobseeker.
    pub fn create_job(&self, employer_id: &UserId, draft: JobDraft) -> Result<Job, HiringError> {
        self.require_user(employer_id)?;
        let title = validated_title(&draft.title)?;
        let now = self.clock.utc();

        let job = Job {
            id: JobId::generate(),
            employer_id: employer_id.clone(),
            title,
            description: draft.description,
            location: draft.location,
            job_type: draft.job_type,
            salary: draft.salary,
            requirements: draft.requirements.into_skills(),
            created_at: now,
            updated_at: now,
        };
        let job = self.store.insert_job(job)?;

        let recipients: Vec<UserId> = self
            .store
            .users_by_role(Role::Jobseeker)?
            .into_iter()
            .map(|user| user.id)
            .collect();
        let link = format!("/jobs/{}", job.id);
        let delivered = self.notifications.fan_out(
            &recipients,
            &format!("New job posted: {}", job.title),
            Some(link.as_str()),
        );

        info!(job_id = %job.id, employer_id = %employer_id, delivered, "job posted");
        Ok(job)
    }

    /// Edit a posting. Jobs owned by someone else are reported as not found.
    pub fn update_job(
        &self,
        employer_id: &UserId,
        job_id: &JobId,
        draft: JobDraft,
    ) -> Result<Job, HiringError> {
        let existing = self.owned_job(employer_id, job_id)?;
        let job = Job {
            title: validated_title(&draft.title)?,
            description: draft.description,
            location: draft.location,
            job_type: draft.job_type,
            salary: draft.salary,
            requirements: draft.requirements.into_skills(),
            updated_at: self.clock.utc(),
            ..existing
        };

        self.store.update_job(job.clone()).map_err(|err| match err {
            StoreError::NotFound => HiringError::not_found("job", job_id),
            other => other.into(),
        })?;
        Ok(job)
    }

    /// Remove a posting with its applications, timeline events and bookmarks.
    pub fn delete_job(
        &self,
        employer_id: &UserId,
        job_id: &JobId,
    ) -> Result<JobDeletion, HiringError> {
        self.owned_job(employer_id, job_id)?;
        let job = self
            .store
            .delete_job(job_id)?
            .ok_or_else(|| HiringError::not_found("job", job_id))?;
        let applications_removed = self.store.delete_applications_for_job(job_id)?;
        let events_removed = self.events.purge_job(job_id)?;
        let saved_removed = self.store.delete_saved_jobs_for_job(job_id)?;

        info!(
            job_id = %job_id,
            applications_removed,
            events_removed,
            saved_removed,
            "job deleted"
        );
        Ok(JobDeletion {
            job,
            applications_removed,
            events_removed,
            saved_removed,
        })
    }

    pub fn job(&self, job_id: &JobId) -> Result<Job, HiringError> {
        self.store
            .job(job_id)?
            .ok_or_else(|| HiringError::not_found("job", job_id))
    }

    /// Apply to a job. The store's uniqueness constraint is the only duplicate guard.
    pub fn create_application(
        &self,
        user_id: &UserId,
        job_id: &JobId,
    ) -> Result<Application, HiringError> {
        let candidate = self.require_user(user_id)?;
        let job = self.job(job_id)?;
        let employer_name = self
            .store
            .user(&job.employer_id)?
            .map(|employer| employer.name)
            .unwrap_or_else(|| "Unknown".to_string());
        let now = self.clock.utc();

        let application = Application {
            id: ApplicationId::generate(),
            job_id: job.id.clone(),
            user_id: user_id.clone(),
            job_title: job.title.clone(),
            employer_name,
            status: ApplicationStatus::Applied,
            applied_at: now,
            created_at: now,
            updated_at: now,
        };

        let application = match self.store.insert_application(application) {
            Ok(application) => application,
            Err(StoreError::Conflict) => {
                return Err(HiringError::DuplicateApplication {
                    user_id: user_id.clone(),
                    job_id: job_id.clone(),
                })
            }
            Err(other) => return Err(other.into()),
        };

        self.notifications.notify(
            &job.employer_id,
            format!("{} applied to your job: {}", candidate.name, job.title),
            Some(format!("/employer/applicant/{user_id}")),
        );

        info!(application_id = %application.id, job_id = %job_id, user_id = %user_id, "application submitted");
        Ok(application)
    }

    /// Withdraw an application. Returns whether one existed.
    pub fn cancel_application(&self, user_id: &UserId, job_id: &JobId) -> Result<bool, HiringError> {
        let removed = self.store.delete_application(user_id, job_id)?;
        if removed {
            info!(job_id = %job_id, user_id = %user_id, "application withdrawn");
        }
        Ok(removed)
    }

    pub fn transition_status(
        &self,
        application_id: &ApplicationId,
        command: TransitionCommand,
    ) -> Result<TransitionOutcome, HiringError> {
        let outcome = self.engine.transition(application_id, command)?;
        let application = &outcome.application;

        self.notifications.notify(
            &application.user_id,
            format!(
                "Your application for {} is now {}",
                application.job_title,
                application.status.label()
            ),
            Some("/jobseeker/applications".to_string()),
        );

        Ok(outcome)
    }

    pub fn application(&self, application_id: &ApplicationId) -> Result<Application, HiringError> {
        self.store
            .application(application_id)?
            .ok_or_else(|| HiringError::not_found("application", application_id))
    }

    pub fn applications_for_job(&self, job_id: &JobId) -> Result<Vec<Application>, HiringError> {
        Ok(self.store.applications_for_job(job_id)?)
    }

    /// The candidate's applications, most recent first.
    pub fn applications_for_user(&self, user_id: &UserId) -> Result<Vec<Application>, HiringError> {
        let mut applications = self.store.applications_for_user(user_id)?;
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(applications)
    }

    /// Status of the applicant's application on any of the employer's postings.
    pub fn application_status_between(
        &self,
        employer_id: &UserId,
        applicant_id: &UserId,
    ) -> Result<Option<ApplicationStatus>, HiringError> {
        let jobs = self.store.jobs_by_employer(employer_id)?;
        Ok(self
            .store
            .applications_for_user(applicant_id)?
            .into_iter()
            .find(|application| jobs.iter().any(|job| job.id == application.job_id))
            .map(|application| application.status))
    }

    pub fn list_events(&self, user_id: &UserId) -> Result<Vec<Event>, HiringError> {
        Ok(self.events.by_user(user_id)?)
    }

    /// Events joined with their posting for the candidate's timeline.
    pub fn timeline(&self, user_id: &UserId) -> Result<Vec<TimelineEntry>, HiringError> {
        Ok(self.events.timeline(self.store.as_ref(), user_id)?)
    }

    /// Bookmark a posting, or drop the bookmark when it already exists.
    /// Returns whether the posting is saved afterwards.
    pub fn toggle_saved_job(&self, user_id: &UserId, job_id: &JobId) -> Result<bool, HiringError> {
        self.job(job_id)?;
        let saved = self.store.toggle_saved_job(SavedJob {
            user_id: user_id.clone(),
            job_id: job_id.clone(),
            saved_at: self.clock.utc(),
        })?;
        info!(job_id = %job_id, user_id = %user_id, saved, "saved job toggled");
        Ok(saved)
    }

    /// Bookmarked postings that still exist, most recently saved first.
    pub fn saved_jobs(&self, user_id: &UserId) -> Result<Vec<SavedPosting>, HiringError> {
        let mut saved = self.store.saved_jobs_for_user(user_id)?;
        saved.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));

        let mut postings = Vec::with_capacity(saved.len());
        for bookmark in saved {
            let Some(job) = self.store.job(&bookmark.job_id)? else {
                continue;
            };
            let employer_name = self
                .store
                .user(&job.employer_id)?
                .map(|employer| employer.name)
                .unwrap_or_else(|| "Unknown Company".to_string());
            postings.push(SavedPosting {
                job,
                employer_name,
                saved_at: bookmark.saved_at,
            });
        }
        Ok(postings)
    }

    /// Contact details of a candidate who applied to one of the employer's postings.
    pub fn applicant_profile(
        &self,
        employer_id: &UserId,
        applicant_id: &UserId,
    ) -> Result<ApplicantProfile, HiringError> {
        let applicant = self.require_user(applicant_id)?;
        let Some(status) = self.application_status_between(employer_id, applicant_id)? else {
            return Err(HiringError::Forbidden(format!(
                "user '{applicant_id}' has not applied to any of your jobs"
            )));
        };

        Ok(ApplicantProfile {
            id: applicant.id,
            name: applicant.name,
            email: applicant.email,
            phone: applicant.phone,
            bio: applicant.bio,
            avatar_url: applicant.avatar_url,
            resume_url: applicant.resume_url,
            skills: applicant.skills,
            status,
        })
    }

    pub fn compute_match<R, C>(&self, job_skills: &[R], candidate_skills: &[C]) -> u8
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        matching::score(job_skills, candidate_skills)
    }

    /// Offline matches for the candidate, ordered and joined with live postings.
    pub fn matching_jobs(&self, user_id: &UserId) -> Result<Vec<RankedJob>, HiringError> {
        let Some(list) = self.store.match_list(user_id)? else {
            return Ok(Vec::new());
        };

        let mut ranked = Vec::with_capacity(list.entries.len());
        for entry in matching::rank_entries(list.entries) {
            if let Some(job) = self.store.job(&entry.job_id)? {
                ranked.push(RankedJob {
                    job,
                    rank: entry.rank,
                    match_percent: entry.match_percent,
                    match_reason: entry.reason,
                });
            }
        }
        Ok(ranked)
    }

    /// Applicants of an owned posting with identity withheld, scored against its requirements.
    pub fn blind_applicants(
        &self,
        employer_id: &UserId,
        job_id: &JobId,
    ) -> Result<Vec<BlindApplicant>, HiringError> {
        let job = self.job(job_id)?;
        if &job.employer_id != employer_id {
            return Err(HiringError::Forbidden(format!(
                "job '{job_id}' belongs to another employer"
            )));
        }

        let mut applicants = Vec::new();
        for application in self.store.applications_for_job(job_id)? {
            let Some(profile) = self.store.candidate_profile(&application.user_id)? else {
                continue;
            };
            applicants.push(BlindApplicant {
                match_score: matching::score(&job.requirements, &profile.skills),
                skills: profile.skills,
                experience: profile.experience,
                certifications: profile.certifications,
            });
        }
        Ok(applicants)
    }

    pub fn employer_stats(&self, employer_id: &UserId) -> Result<EmployerStats, HiringError> {
        self.dashboard.employer_stats(employer_id)
    }

    pub fn candidate_stats(&self, user_id: &UserId) -> Result<CandidateStats, HiringError> {
        self.dashboard.candidate_stats(user_id)
    }

    fn require_user(&self, user_id: &UserId) -> Result<User, HiringError> {
        self.store
            .user(user_id)?
            .ok_or_else(|| HiringError::not_found("user", user_id))
    }

    fn owned_job(&self, employer_id: &UserId, job_id: &JobId) -> Result<Job, HiringError> {
        self.store
            .job(job_id)?
            .filter(|job| &job.employer_id == employer_id)
            .ok_or_else(|| HiringError::not_found("job", job_id))
    }
}

fn validated_title(raw: &str) -> Result<String, HiringError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(HiringError::Validation("job title is required".to_string()));
    }
    Ok(title.to_string())
}
