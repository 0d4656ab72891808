use crate::infra::{import_matches_from_path, in_memory_service};
use chrono::Utc;
use clap::Args;
use fairhire::error::AppError;
use fairhire::workflows::hiring::{
    CandidateProfile, Certification, ExperienceEntry, HiringError, InterviewMode, JobDraft,
    LifecycleConfig, MemoryStore, ProfileRepository, RequirementsInput, Role, TransitionCommand,
    User, UserId, UserRepository,
};
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Offline matcher CSV export to load before listing matching jobs.
    #[arg(long)]
    pub(crate) matches_csv: Option<PathBuf>,
    /// Skip the dashboard portion of the demo output.
    #[arg(long)]
    pub(crate) skip_dashboards: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        matches_csv,
        skip_dashboards,
    } = args;

    let (service, store) = in_memory_service(LifecycleConfig::default());
    let (employer, candidate) = seed_marketplace(&store)?;

    println!("FairHire lifecycle demo");
    let job = service.create_job(
        &employer,
        JobDraft {
            title: "Backend Engineer".to_string(),
            description: "Own the hiring platform's API and storage layers".to_string(),
            location: "Remote (EU)".to_string(),
            job_type: Some("Full-time".to_string()),
            salary: Some("€70k-€85k".to_string()),
            requirements: RequirementsInput::Delimited(
                "Rust, PostgreSQL, Kafka, Docker".to_string(),
            ),
        },
    )?;
    println!(
        "- Posted '{}' ({}) requiring {}",
        job.title,
        job.id,
        job.requirements.join(", ")
    );

    if service.toggle_saved_job(&candidate, &job.id)? {
        println!("- {} bookmarked '{}'", candidate, job.title);
    }
    let application = service.create_application(&candidate, &job.id)?;
    println!(
        "- {} applied -> application {} [{}]",
        candidate,
        application.id,
        application.status.label()
    );
    match service.create_application(&candidate, &job.id) {
        Err(HiringError::DuplicateApplication { .. }) => {
            println!("  Second apply rejected as duplicate")
        }
        Ok(_) => println!("  Unexpected: second apply accepted"),
        Err(err) => println!("  Second apply failed: {}", err),
    }

    let interview = service.transition_status(
        &application.id,
        TransitionCommand::ScheduleInterview {
            date: Some(Utc::now() + chrono::Duration::days(2)),
            mode: Some(InterviewMode::InPerson),
            notes: Some("Systems design round".to_string()),
        },
    )?;
    println!(
        "- Interview scheduled for {} ({})",
        interview.event.date.format("%Y-%m-%d %H:%M UTC"),
        interview.event.mode.unwrap_or(InterviewMode::Online).label()
    );
    let hired = service.transition_status(
        &application.id,
        TransitionCommand::Hire {
            notes: Some("Offer signed".to_string()),
        },
    )?;
    println!("- Application moved to {}", hired.application.status.label());

    println!("\nCandidate timeline");
    for entry in service.timeline(&candidate)? {
        println!(
            "  - {} {} at {} ({})",
            entry.date.format("%Y-%m-%d"),
            entry.event_type.label(),
            entry.employer_name,
            entry.job_title
        );
    }

    println!("\nBlind applicant view");
    for applicant in service.blind_applicants(&employer, &job.id)? {
        println!(
            "  - {}% match | skills: {} | {} experience entries | {} certifications",
            applicant.match_score,
            applicant.skills.join(", "),
            applicant.experience.len(),
            applicant.certifications.len()
        );
    }

    println!("\nNotifications");
    for recipient in [&employer, &candidate] {
        let inbox = service.notifications().inbox(recipient)?;
        println!("  {} ({} unread)", recipient, inbox.unread_count);
        for notification in inbox.notifications {
            println!("    - {}", notification.message);
        }
    }

    if !skip_dashboards {
        let employer_stats = service.employer_stats(&employer)?;
        println!(
            "\nEmployer dashboard: {} jobs | {} applications | {} interviews | {} hires (+{} this week)",
            employer_stats.active_jobs,
            employer_stats.applications,
            employer_stats.interviews,
            employer_stats.hires,
            employer_stats.delta_hires
        );
        let candidate_stats = service.candidate_stats(&candidate)?;
        println!(
            "Candidate dashboard: {} applications | {} hired | profile {}% complete",
            candidate_stats.total_applications,
            candidate_stats.hired,
            candidate_stats.profile_completion
        );
        for recent in &candidate_stats.recent_applications {
            println!(
                "  - {} [{}] matched skills: {}",
                recent.application.job_title,
                recent.application.status.label(),
                recent.matched_skills.join(", ")
            );
        }
        println!(
            "  {} saved jobs | {} upcoming events",
            candidate_stats.saved_jobs,
            candidate_stats.upcoming_events.len()
        );
        for item in candidate_stats.checklist.iter().filter(|item| !item.done) {
            println!("  - missing: {}", item.label);
        }
    }

    if let Some(path) = matches_csv {
        let updated = import_matches_from_path(&store, &path)?;
        println!("\nImported offline matches for {} users", updated);
        let matches = service.matching_jobs(&candidate)?;
        if matches.is_empty() {
            println!("  No matching jobs for {}", candidate);
        }
        for ranked in matches {
            println!(
                "  - {} | rank {} | {}%",
                ranked.job.title,
                ranked
                    .rank
                    .map(|rank| rank.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                ranked.match_percent.unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn seed_marketplace(store: &MemoryStore) -> Result<(UserId, UserId), HiringError> {
    let now = Utc::now();
    let employer = store.insert_user(User::new(
        UserId::new("usr-northwind"),
        "Northwind Labs",
        "talent@northwind.example",
        Role::Employer,
        now,
    ))?;

    let mut candidate = User::new(
        UserId::new("usr-asha"),
        "Asha Rao",
        "asha@example.com",
        Role::Jobseeker,
        now,
    );
    candidate.skills = vec!["Rust".to_string(), "Kafka".to_string(), "Go".to_string()];
    candidate.bio = Some("Backend engineer focused on event pipelines".to_string());
    let candidate = store.insert_user(candidate)?;

    store.upsert_candidate_profile(
        &candidate.id,
        CandidateProfile {
            user_id: Some(candidate.id.clone()),
            skills: candidate.skills.clone(),
            experience: vec![ExperienceEntry {
                title: "Software Engineer".to_string(),
                company: "Initech".to_string(),
                years: Some("4".to_string()),
            }],
            certifications: vec![Certification {
                name: "AWS Solutions Architect".to_string(),
                description: None,
            }],
            languages: vec!["English".to_string(), "Hindi".to_string()],
            ..CandidateProfile::default()
        },
    )?;

    Ok((employer.id, candidate.id))
}
