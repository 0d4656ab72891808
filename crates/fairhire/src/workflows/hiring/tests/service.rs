use super::common::*;
use crate::workflows::hiring::domain::{
    ApplicationStatus, CandidateProfile, Certification, ExperienceEntry, JobId, MatchEntry,
    MatchList, RequirementsInput, Role, User, UserId,
};
use crate::workflows::hiring::store::{
    ApplicationRepository, JobRepository, MatchRepository, ProfileRepository,
    SavedJobRepository, UserRepository,
};
use crate::workflows::hiring::transition::TransitionCommand;
use crate::workflows::hiring::HiringError;
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn create_application_captures_job_and_employer() {
    let (service, _, _, job) = service_with_job();

    let application = service
        .create_application(&candidate_id(), &job.id)
        .expect("application created");

    assert_eq!(application.status, ApplicationStatus::Applied);
    assert_eq!(application.job_title, "Backend Engineer");
    assert_eq!(application.employer_name, "Northwind Labs");
    assert_eq!(application.applied_at, now());
    assert!(application.id.as_str().starts_with("app-"));
}

#[test]
fn second_application_for_pair_is_duplicate() {
    let (service, store, _, job) = service_with_job();
    service
        .create_application(&candidate_id(), &job.id)
        .expect("first application");

    match service.create_application(&candidate_id(), &job.id) {
        Err(HiringError::DuplicateApplication { user_id, job_id }) => {
            assert_eq!(user_id, candidate_id());
            assert_eq!(job_id, job.id);
        }
        other => panic!("expected duplicate application, got {other:?}"),
    }

    let stored = store.applications_for_job(&job.id).expect("query");
    assert_eq!(stored.len(), 1);
}

#[test]
fn concurrent_applications_for_one_pair_admit_exactly_one() {
    let (service, store, _, job) = service_with_job();
    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let job_id = job.id.clone();
            thread::spawn(move || {
                barrier.wait();
                service.create_application(&candidate_id(), &job_id)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread completes"))
        .collect();

    let successes = results.iter().filter(|result| result.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|result| matches!(result, Err(HiringError::DuplicateApplication { .. })))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(duplicates, 7);
    assert_eq!(store.applications_for_job(&job.id).expect("query").len(), 1);
}

#[test]
fn create_application_requires_existing_job_and_user() {
    let (service, _, _, job) = service_with_job();

    let missing_job = service.create_application(&candidate_id(), &JobId::new("job-missing"));
    assert!(matches!(
        missing_job,
        Err(HiringError::NotFound { entity: "job", .. })
    ));

    let missing_user = service.create_application(&UserId::new("usr-ghost"), &job.id);
    assert!(matches!(
        missing_user,
        Err(HiringError::NotFound { entity: "user", .. })
    ));
}

#[test]
fn cancel_application_frees_the_pair() {
    let (service, _, _, job) = service_with_job();
    service
        .create_application(&candidate_id(), &job.id)
        .expect("applied");

    assert!(service
        .cancel_application(&candidate_id(), &job.id)
        .expect("cancel"));
    assert!(!service
        .cancel_application(&candidate_id(), &job.id)
        .expect("second cancel is a no-op"));

    service
        .create_application(&candidate_id(), &job.id)
        .expect("re-apply after withdrawal");
}

#[test]
fn create_job_rejects_blank_title() {
    let (service, _, _) = build_service();
    let result = service.create_job(&employer_id(), draft("   ", &[]));
    assert!(matches!(result, Err(HiringError::Validation(_))));
}

#[test]
fn update_job_accepts_comma_separated_requirements() {
    let (service, _, clock, job) = service_with_job();
    clock.advance(chrono::Duration::hours(2));

    let mut edit = draft("Senior Backend Engineer", &[]);
    edit.requirements = RequirementsInput::Delimited("Rust, Kafka ,, Postgres".to_string());
    let updated = service
        .update_job(&employer_id(), &job.id, edit)
        .expect("updated");

    assert_eq!(updated.title, "Senior Backend Engineer");
    assert_eq!(updated.requirements, vec!["Rust", "Kafka", "Postgres"]);
    assert_eq!(updated.created_at, job.created_at);
    assert_eq!(updated.updated_at, now() + chrono::Duration::hours(2));
}

#[test]
fn update_job_by_another_employer_is_not_found() {
    let (service, store, _, job) = service_with_job();
    let rival = UserId::new("usr-rival");
    store
        .insert_user(User::new(
            rival.clone(),
            "Contoso",
            "jobs@contoso.example",
            Role::Employer,
            now(),
        ))
        .expect("seed rival");

    let result = service.update_job(&rival, &job.id, draft("Hijacked", &[]));
    assert!(matches!(result, Err(HiringError::NotFound { .. })));
    assert_eq!(
        store.job(&job.id).expect("query").expect("present").title,
        "Backend Engineer"
    );
}

#[test]
fn delete_job_cascades_to_applications_and_events() {
    let (service, store, _, job) = service_with_job();
    let application = service
        .create_application(&candidate_id(), &job.id)
        .expect("applied");
    service
        .transition_status(
            &application.id,
            TransitionCommand::ScheduleInterview {
                date: None,
                mode: None,
                notes: None,
            },
        )
        .expect("interview");
    assert_eq!(service.list_events(&candidate_id()).expect("events").len(), 1);
    assert!(service
        .toggle_saved_job(&candidate_id(), &job.id)
        .expect("saved"));

    let deletion = service
        .delete_job(&employer_id(), &job.id)
        .expect("deleted");

    assert_eq!(deletion.applications_removed, 1);
    assert_eq!(deletion.events_removed, 1);
    assert_eq!(deletion.saved_removed, 1);
    assert!(store
        .saved_jobs_for_user(&candidate_id())
        .expect("query")
        .is_empty());
    assert!(store.job(&job.id).expect("query").is_none());
    assert!(store.application(&application.id).expect("query").is_none());
    assert!(service
        .applications_for_user(&candidate_id())
        .expect("query")
        .is_empty());
    assert!(service.list_events(&candidate_id()).expect("events").is_empty());
}

#[test]
fn saving_a_job_toggles_the_bookmark() {
    let (service, _, clock, job) = service_with_job();

    assert!(service
        .toggle_saved_job(&candidate_id(), &job.id)
        .expect("saved"));
    let saved = service.saved_jobs(&candidate_id()).expect("list");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].job.id, job.id);
    assert_eq!(saved[0].employer_name, "Northwind Labs");
    assert_eq!(saved[0].saved_at, now());

    clock.advance(chrono::Duration::minutes(5));
    assert!(!service
        .toggle_saved_job(&candidate_id(), &job.id)
        .expect("unsaved"));
    assert!(service.saved_jobs(&candidate_id()).expect("list").is_empty());
}

#[test]
fn saved_jobs_list_newest_bookmark_first() {
    let (service, _, clock, first) = service_with_job();
    let second = service
        .create_job(&employer_id(), draft("Data Engineer", &["SQL"]))
        .expect("job");

    service
        .toggle_saved_job(&candidate_id(), &first.id)
        .expect("saved");
    clock.advance(chrono::Duration::hours(1));
    service
        .toggle_saved_job(&candidate_id(), &second.id)
        .expect("saved");

    let titles: Vec<String> = service
        .saved_jobs(&candidate_id())
        .expect("list")
        .into_iter()
        .map(|saved| saved.job.title)
        .collect();
    assert_eq!(titles, vec!["Data Engineer", "Backend Engineer"]);
}

#[test]
fn saving_a_missing_job_is_not_found() {
    let (service, _, _) = build_service();
    let result = service.toggle_saved_job(&candidate_id(), &JobId::new("job-missing"));
    assert!(matches!(result, Err(HiringError::NotFound { .. })));
}

#[test]
fn applicant_profile_requires_an_application_to_the_employer() {
    let (service, store, _, job) = service_with_job();
    let mut candidate = store
        .user(&candidate_id())
        .expect("query")
        .expect("present");
    candidate.id = UserId::new("usr-profiled");
    candidate.phone = Some("+44 20 7946 0000".to_string());
    candidate.skills = vec!["Rust".to_string()];
    store.insert_user(candidate).expect("seed");
    let applicant = UserId::new("usr-profiled");

    let before = service.applicant_profile(&employer_id(), &applicant);
    assert!(matches!(before, Err(HiringError::Forbidden(_))));

    service
        .create_application(&applicant, &job.id)
        .expect("applied");
    let profile = service
        .applicant_profile(&employer_id(), &applicant)
        .expect("profile");
    assert_eq!(profile.name, "Asha Rao");
    assert_eq!(profile.phone.as_deref(), Some("+44 20 7946 0000"));
    assert_eq!(profile.skills, vec!["Rust"]);
    assert_eq!(profile.status, ApplicationStatus::Applied);

    let rival = service.applicant_profile(&UserId::new("usr-rival"), &applicant);
    assert!(matches!(rival, Err(HiringError::Forbidden(_))));
    let ghost = service.applicant_profile(&employer_id(), &UserId::new("usr-ghost"));
    assert!(matches!(ghost, Err(HiringError::NotFound { .. })));
}

#[test]
fn application_status_between_looks_across_employer_jobs() {
    let (service, _, _, job) = service_with_job();
    assert_eq!(
        service
            .application_status_between(&employer_id(), &candidate_id())
            .expect("query"),
        None
    );

    let application = service
        .create_application(&candidate_id(), &job.id)
        .expect("applied");
    service
        .transition_status(&application.id, TransitionCommand::Hire { notes: None })
        .expect("hired");

    assert_eq!(
        service
            .application_status_between(&employer_id(), &candidate_id())
            .expect("query"),
        Some(ApplicationStatus::Hired)
    );
    assert_eq!(
        service
            .application_status_between(&UserId::new("usr-other"), &candidate_id())
            .expect("query"),
        None
    );
}

#[test]
fn blind_applicants_withhold_identity_and_score_against_requirements() {
    let (service, store, _, job) = service_with_job();
    store
        .upsert_candidate_profile(
            &candidate_id(),
            CandidateProfile {
                user_id: Some(candidate_id()),
                skills: vec!["rust".to_string(), "Go".to_string()],
                experience: vec![ExperienceEntry {
                    title: "Engineer".to_string(),
                    company: "Initech".to_string(),
                    years: Some("3".to_string()),
                }],
                certifications: vec![Certification {
                    name: "CKA".to_string(),
                    description: None,
                }],
                ..CandidateProfile::default()
            },
        )
        .expect("profile");
    service
        .create_application(&candidate_id(), &job.id)
        .expect("applied");

    let applicants = service
        .blind_applicants(&employer_id(), &job.id)
        .expect("blind view");

    assert_eq!(applicants.len(), 1);
    assert_eq!(applicants[0].match_score, 50);
    assert_eq!(applicants[0].certifications[0].name, "CKA");
    let payload = serde_json::to_value(&applicants[0]).expect("serialize");
    assert!(payload.get("user_id").is_none());
    assert!(payload.get("name").is_none());

    let forbidden = service.blind_applicants(&UserId::new("usr-other"), &job.id);
    assert!(matches!(forbidden, Err(HiringError::Forbidden(_))));
}

#[test]
fn matching_jobs_orders_entries_and_drops_vanished_jobs() {
    let (service, store, _, job) = service_with_job();
    let second = service
        .create_job(&employer_id(), draft("Data Engineer", &["SQL"]))
        .expect("second job");
    let third = service
        .create_job(&employer_id(), draft("Platform Engineer", &["Kubernetes"]))
        .expect("third job");

    store
        .replace_match_list(MatchList {
            user_id: candidate_id(),
            entries: vec![
                MatchEntry {
                    job_id: third.id.clone(),
                    match_percent: Some(90),
                    rank: None,
                    reason: None,
                },
                MatchEntry {
                    job_id: JobId::new("job-deleted"),
                    match_percent: Some(99),
                    rank: Some(1),
                    reason: None,
                },
                MatchEntry {
                    job_id: second.id.clone(),
                    match_percent: Some(40),
                    rank: Some(2),
                    reason: Some("SQL overlap".to_string()),
                },
                MatchEntry {
                    job_id: job.id.clone(),
                    match_percent: Some(95),
                    rank: None,
                    reason: None,
                },
            ],
            updated_at: now(),
        })
        .expect("matches stored");

    let ranked = service.matching_jobs(&candidate_id()).expect("matches");
    let ids: Vec<&JobId> = ranked.iter().map(|entry| &entry.job.id).collect();
    assert_eq!(ids, vec![&second.id, &job.id, &third.id]);
    assert_eq!(ranked[0].match_reason.as_deref(), Some("SQL overlap"));

    assert!(service
        .matching_jobs(&UserId::new("usr-nobody"))
        .expect("empty")
        .is_empty());
}

#[test]
fn compute_match_handles_empty_inputs() {
    let (service, _, _) = build_service();
    let empty: [&str; 0] = [];
    assert_eq!(service.compute_match(&empty, &["Rust"]), 0);
    assert_eq!(service.compute_match(&["Rust"], &empty), 0);
    assert_eq!(service.compute_match(&["Python", "SQL"], &["python"]), 50);
}
