use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::Serialize;

use super::domain::{Application, ApplicationStatus, Job, JobId, User, UserId};
use super::error::HiringError;
use super::events::{EventLog, TimelineEntry};
use super::matching;
use super::store::{EntityStore, EventRepository};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployerStats {
    pub active_jobs: usize,
    pub applications: usize,
    pub interviews: usize,
    pub hires: usize,
    pub delta_jobs: usize,
    pub delta_applications: usize,
    pub delta_interviews: usize,
    pub delta_hires: usize,
    /// Employer's postings, newest first.
    pub jobs: Vec<JobSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    #[serde(flatten)]
    pub job: Job,
    pub application_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateStats {
    pub total_applications: usize,
    pub applied: usize,
    pub interviews: usize,
    pub hired: usize,
    pub rejected: usize,
    pub applications_this_week: usize,
    pub interviews_this_week: usize,
    pub hires_this_week: usize,
    pub rejections_this_week: usize,
    pub saved_jobs: usize,
    pub profile_completion: u8,
    pub checklist: Vec<ChecklistItem>,
    /// Every application, newest first.
    pub recent_applications: Vec<RecentApplication>,
    /// Timeline entries dated now or later, soonest first.
    pub upcoming_events: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentApplication {
    #[serde(flatten)]
    pub application: Application,
    /// Offline matcher percentage for the posting, 0 when unscored.
    pub match_percent: u8,
    /// Required skills of the posting that the candidate lists.
    pub matched_skills: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub label: &'static str,
    pub done: bool,
}

/// Read-only dashboard statistics computed per request from current store state.
pub struct DashboardAggregator<S, E> {
    store: Arc<S>,
    events: EventLog<E>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl<S, E> DashboardAggregator<S, E>
where
    S: EntityStore,
    E: EventRepository,
{
    pub fn new(store: Arc<S>, events: EventLog<E>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            store,
            events,
            clock,
            window,
        }
    }

    pub fn employer_stats(&self, employer_id: &UserId) -> Result<EmployerStats, HiringError> {
        let cutoff = self.cutoff();
        let mut jobs = self.store.jobs_by_employer(employer_id)?;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut stats = EmployerStats {
            active_jobs: jobs.len(),
            applications: 0,
            interviews: 0,
            hires: 0,
            delta_jobs: jobs.iter().filter(|job| job.created_at >= cutoff).count(),
            delta_applications: 0,
            delta_interviews: 0,
            delta_hires: 0,
            jobs: Vec::with_capacity(jobs.len()),
        };

        for job in jobs {
            let applications = self.store.applications_for_job(&job.id)?;
            for application in &applications {
                let recent_update = application.updated_at >= cutoff;
                stats.applications += 1;
                if application.created_at >= cutoff {
                    stats.delta_applications += 1;
                }
                match application.status {
                    ApplicationStatus::Interview => {
                        stats.interviews += 1;
                        stats.delta_interviews += usize::from(recent_update);
                    }
                    ApplicationStatus::Hired => {
                        stats.hires += 1;
                        stats.delta_hires += usize::from(recent_update);
                    }
                    ApplicationStatus::Applied | ApplicationStatus::Rejected => {}
                }
            }
            stats.jobs.push(JobSummary {
                job,
                application_count: applications.len(),
            });
        }

        Ok(stats)
    }

    pub fn candidate_stats(&self, user_id: &UserId) -> Result<CandidateStats, HiringError> {
        let user = self
            .store
            .user(user_id)?
            .ok_or_else(|| HiringError::not_found("user", user_id))?;
        let now = self.clock.utc();
        let cutoff = self.cutoff();
        let mut applications = self.store.applications_for_user(user_id)?;
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let checklist = profile_checklist(&user);
        let upcoming_events = self
            .events
            .timeline(self.store.as_ref(), user_id)?
            .into_iter()
            .filter(|entry| entry.date >= now)
            .collect();

        let mut stats = CandidateStats {
            total_applications: applications.len(),
            applied: 0,
            interviews: 0,
            hired: 0,
            rejected: 0,
            applications_this_week: 0,
            interviews_this_week: 0,
            hires_this_week: 0,
            rejections_this_week: 0,
            saved_jobs: self.store.saved_jobs_for_user(user_id)?.len(),
            profile_completion: completion_percent(&checklist),
            checklist,
            recent_applications: Vec::with_capacity(applications.len()),
            upcoming_events,
        };

        for application in &applications {
            if application.applied_at >= cutoff {
                stats.applications_this_week += 1;
            }
            let recent_update = usize::from(application.updated_at >= cutoff);
            match application.status {
                ApplicationStatus::Applied => stats.applied += 1,
                ApplicationStatus::Interview => {
                    stats.interviews += 1;
                    stats.interviews_this_week += recent_update;
                }
                ApplicationStatus::Hired => {
                    stats.hired += 1;
                    stats.hires_this_week += recent_update;
                }
                ApplicationStatus::Rejected => {
                    stats.rejected += 1;
                    stats.rejections_this_week += recent_update;
                }
            }
        }

        let percents: Vec<(JobId, u8)> = self
            .store
            .match_list(user_id)?
            .map(|list| {
                list.entries
                    .into_iter()
                    .filter_map(|entry| Some((entry.job_id, entry.match_percent?)))
                    .collect()
            })
            .unwrap_or_default();

        for application in applications {
            let matched_skills = match self.store.job(&application.job_id)? {
                Some(job) => matching::matched_skills(&job.requirements, &user.skills),
                None => Vec::new(),
            };
            let match_percent = percents
                .iter()
                .find(|(job_id, _)| job_id == &application.job_id)
                .map_or(0, |(_, percent)| *percent);
            stats.recent_applications.push(RecentApplication {
                application,
                match_percent,
                matched_skills,
            });
        }

        Ok(stats)
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.clock.utc() - self.window
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

/// Fixed profile checklist: name, phone, skills, bio, avatar, résumé.
pub fn profile_checklist(user: &User) -> Vec<ChecklistItem> {
    vec![
        ChecklistItem {
            label: "Name",
            done: !user.name.trim().is_empty(),
        },
        ChecklistItem {
            label: "Phone",
            done: present(&user.phone),
        },
        ChecklistItem {
            label: "Skills",
            done: !user.skills.is_empty(),
        },
        ChecklistItem {
            label: "Bio",
            done: present(&user.bio),
        },
        ChecklistItem {
            label: "Profile Picture",
            done: present(&user.avatar_url),
        },
        ChecklistItem {
            label: "Resume",
            done: present(&user.resume_url),
        },
    ]
}

pub fn completion_percent(checklist: &[ChecklistItem]) -> u8 {
    if checklist.is_empty() {
        return 0;
    }
    let done = checklist.iter().filter(|item| item.done).count();
    let rounded = (done * 200 + checklist.len()) / (2 * checklist.len());
    u8::try_from(rounded).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::hiring::domain::Role;

    #[test]
    fn completion_counts_non_empty_fields() {
        let mut user = User::new(
            UserId::new("usr-1"),
            "Asha",
            "asha@example.com",
            Role::Jobseeker,
            Utc::now(),
        );
        assert_eq!(completion_percent(&profile_checklist(&user)), 17);

        user.phone = Some("  ".to_string());
        user.skills = vec!["Rust".to_string()];
        user.bio = Some("Backend developer".to_string());
        assert_eq!(completion_percent(&profile_checklist(&user)), 50);

        user.phone = Some("+1 555 0100".to_string());
        user.avatar_url = Some("/uploads/a.png".to_string());
        user.resume_url = Some("/uploads/cv.pdf".to_string());
        assert_eq!(completion_percent(&profile_checklist(&user)), 100);
    }
}
