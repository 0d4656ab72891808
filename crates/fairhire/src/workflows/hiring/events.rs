use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Event, EventId, EventType, InterviewMode, JobId, UserId};
use super::store::{EventRepository, JobRepository, StoreError, UserRepository};

/// Append-only timeline of lifecycle events, queried per candidate.
pub struct EventLog<E> {
    repository: Arc<E>,
}

impl<E> Clone for EventLog<E> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<E> EventLog<E>
where
    E: EventRepository,
{
    pub fn new(repository: Arc<E>) -> Self {
        Self { repository }
    }

    pub fn append(&self, event: Event) -> Result<Event, StoreError> {
        self.repository.append_event(event)
    }

    /// Events for `user_id` ordered by `date`. Ties keep storage order.
    pub fn by_user(&self, user_id: &UserId) -> Result<Vec<Event>, StoreError> {
        let mut events = self.repository.events_for_user(user_id)?;
        events.sort_by_key(|event| event.date);
        Ok(events)
    }

    /// `by_user` joined with each event's posting and employer.
    pub fn timeline<S>(&self, store: &S, user_id: &UserId) -> Result<Vec<TimelineEntry>, StoreError>
    where
        S: JobRepository + UserRepository,
    {
        self.by_user(user_id)?
            .into_iter()
            .map(|event| TimelineEntry::resolve(store, event))
            .collect()
    }

    pub(crate) fn purge_job(&self, job_id: &JobId) -> Result<usize, StoreError> {
        self.repository.delete_events_for_job(job_id)
    }
}

/// Event joined with the posting it refers to, as shown on the candidate timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub date: DateTime<Utc>,
    pub mode: InterviewMode,
    pub job_title: String,
    pub employer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TimelineEntry {
    /// Missing postings or employers fall back to placeholder names.
    fn resolve<S>(store: &S, event: Event) -> Result<Self, StoreError>
    where
        S: JobRepository + UserRepository,
    {
        let job = store.job(&event.job_id)?;
        let employer_name = match &job {
            Some(job) => store.user(&job.employer_id)?.map(|user| user.name),
            None => None,
        };

        Ok(Self {
            id: event.id,
            event_type: event.event_type,
            date: event.date,
            mode: event.mode.unwrap_or(InterviewMode::Online),
            job_title: job
                .map(|job| job.title)
                .unwrap_or_else(|| "Unknown Job".to_string()),
            employer_name: employer_name.unwrap_or_else(|| "Unknown Company".to_string()),
            notes: event.notes,
        })
    }
}
