//! Status transitions for applications. This module is the only writer of
//! `Application::status`.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Event, EventId, EventType, InterviewMode,
};
use super::error::HiringError;
use super::events::EventLog;
use super::policy::{InterviewDatePolicy, LifecycleConfig};
use super::store::{ApplicationRepository, EventRepository};

/// A requested move to a post-application status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionCommand {
    ScheduleInterview {
        date: Option<DateTime<Utc>>,
        mode: Option<InterviewMode>,
        notes: Option<String>,
    },
    Hire {
        notes: Option<String>,
    },
    Reject {
        notes: Option<String>,
    },
}

impl TransitionCommand {
    pub fn event_type(&self) -> EventType {
        match self {
            TransitionCommand::ScheduleInterview { .. } => EventType::Interview,
            TransitionCommand::Hire { .. } => EventType::Hired,
            TransitionCommand::Reject { .. } => EventType::Rejected,
        }
    }

    pub fn target_status(&self) -> ApplicationStatus {
        self.event_type().status()
    }
}

/// Wire shape of a status update, as submitted by the employer's applicant table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
    #[serde(default, alias = "interviewDate")]
    pub interview_date: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TryFrom<StatusUpdateRequest> for TransitionCommand {
    type Error = HiringError;

    fn try_from(request: StatusUpdateRequest) -> Result<Self, Self::Error> {
        let status = ApplicationStatus::parse(&request.status).ok_or_else(|| {
            HiringError::Validation(format!("unknown status '{}'", request.status))
        })?;
        let notes = request.notes.filter(|notes| !notes.trim().is_empty());

        match status {
            ApplicationStatus::Applied => Err(HiringError::Validation(
                "applications cannot be moved back to 'applied'".to_string(),
            )),
            ApplicationStatus::Interview => {
                let date = request
                    .interview_date
                    .filter(|raw| !raw.trim().is_empty())
                    .map(|raw| parse_interview_date(&raw))
                    .transpose()?;
                let mode = request
                    .mode
                    .filter(|raw| !raw.trim().is_empty())
                    .map(|raw| {
                        InterviewMode::parse(&raw).ok_or_else(|| {
                            HiringError::Validation(format!("unknown interview mode '{raw}'"))
                        })
                    })
                    .transpose()?;
                Ok(TransitionCommand::ScheduleInterview { date, mode, notes })
            }
            ApplicationStatus::Hired => Ok(TransitionCommand::Hire { notes }),
            ApplicationStatus::Rejected => Ok(TransitionCommand::Reject { notes }),
        }
    }
}

/// Accepts RFC 3339 timestamps, `datetime-local` form values (read as UTC) and bare dates.
pub fn parse_interview_date(raw: &str) -> Result<DateTime<Utc>, HiringError> {
    let value = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| HiringError::Validation(format!("unparseable interview date '{raw}'")))
}

/// Result of a committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub application: Application,
    pub event: Event,
}

/// Applies status changes and records their timeline events.
///
/// Any status may follow any other, including repeats. The status write and the event
/// append are two separate store calls; a failure between them is reported as
/// [`HiringError::PartiallyApplied`].
pub struct StatusTransitionEngine<S, E> {
    applications: Arc<S>,
    events: EventLog<E>,
    config: LifecycleConfig,
    clock: Arc<dyn Clock>,
}

impl<S, E> StatusTransitionEngine<S, E>
where
    S: ApplicationRepository,
    E: EventRepository,
{
    pub fn new(
        applications: Arc<S>,
        events: EventLog<E>,
        config: LifecycleConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            applications,
            events,
            config,
            clock,
        }
    }

    pub fn transition(
        &self,
        application_id: &ApplicationId,
        command: TransitionCommand,
    ) -> Result<TransitionOutcome, HiringError> {
        let now = self.clock.utc();
        let existing = self
            .applications
            .application(application_id)?
            .ok_or_else(|| HiringError::not_found("application", application_id))?;

        let event_type = command.event_type();
        let (date, mode, notes) = self.resolve_event_fields(command, now)?;

        let application = self
            .applications
            .set_application_status(application_id, event_type.status(), now)?
            .ok_or_else(|| HiringError::not_found("application", application_id))?;

        let event = Event {
            id: EventId::generate(),
            user_id: existing.user_id,
            job_id: existing.job_id,
            event_type,
            date,
            mode,
            notes,
        };

        let event = match self.events.append(event) {
            Ok(event) => event,
            Err(source) => {
                error!(
                    application_id = %application.id,
                    status = application.status.label(),
                    error = %source,
                    "status committed without timeline event; reconciliation required"
                );
                return Err(HiringError::PartiallyApplied {
                    application: Box::new(application),
                    source,
                });
            }
        };

        info!(
            application_id = %application.id,
            from = existing.status.label(),
            to = application.status.label(),
            "application status changed"
        );

        Ok(TransitionOutcome { application, event })
    }

    fn resolve_event_fields(
        &self,
        command: TransitionCommand,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, Option<InterviewMode>, Option<String>), HiringError> {
        match command {
            TransitionCommand::ScheduleInterview { date, mode, notes } => {
                let date = match (date, self.config.interview_date_policy) {
                    (Some(date), _) => date,
                    (None, InterviewDatePolicy::DefaultToNow) => now,
                    (None, InterviewDatePolicy::Require) => {
                        return Err(HiringError::Validation(
                            "an interview date is required".to_string(),
                        ))
                    }
                };
                let mode = mode.unwrap_or(self.config.default_interview_mode);
                Ok((date, Some(mode), notes))
            }
            TransitionCommand::Hire { notes } | TransitionCommand::Reject { notes } => {
                Ok((now, None, notes))
            }
        }
    }
}
