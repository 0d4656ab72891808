use std::sync::Arc;

use chrono::Utc;
use fairhire::workflows::hiring::{
    HiringService, JobDraft, LifecycleConfig, MatchImportError, MatchImporter, MemoryStore,
    RequirementsInput, Role, User, UserId, UserRepository,
};

fn service() -> (
    HiringService<MemoryStore, MemoryStore, MemoryStore>,
    Arc<MemoryStore>,
) {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_user(User::new(
            UserId::new("usr-hq"),
            "Globex",
            "jobs@globex.example",
            Role::Employer,
            Utc::now(),
        ))
        .expect("seed employer");
    let service = HiringService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        LifecycleConfig::default(),
    );
    (service, store)
}

fn post(service: &HiringService<MemoryStore, MemoryStore, MemoryStore>, title: &str) -> String {
    service
        .create_job(
            &UserId::new("usr-hq"),
            JobDraft {
                title: title.to_string(),
                description: String::new(),
                location: "Remote".to_string(),
                job_type: None,
                salary: None,
                requirements: RequirementsInput::default(),
            },
        )
        .expect("job posted")
        .id
        .to_string()
}

#[test]
fn imported_matches_surface_in_rank_order() {
    let (service, store) = service();
    let analyst = post(&service, "Analyst");
    let engineer = post(&service, "Engineer");
    let designer = post(&service, "Designer");

    let export = format!(
        "user_id,job_id,rank,match_percent,match_reason\n\
usr-lee,{designer},,81,\n\
usr-lee,{engineer},1,64,Systems background\n\
usr-lee,job-retired,2,99,\n\
usr-lee,{analyst},,93,\n\
usr-kim,{analyst},1,70,\n"
    );

    let lists = MatchImporter::from_reader(export.as_bytes(), Utc::now()).expect("import parses");
    assert_eq!(
        MatchImporter::store_all(store.as_ref(), lists).expect("import stores"),
        2
    );

    let titles: Vec<String> = service
        .matching_jobs(&UserId::new("usr-lee"))
        .expect("matches")
        .into_iter()
        .map(|ranked| ranked.job.title)
        .collect();
    assert_eq!(titles, vec!["Engineer", "Analyst", "Designer"]);
}

#[test]
fn import_rejects_rows_without_identifiers() {
    let export = "user_id,job_id,rank,match_percent,match_reason\n,job-1,1,50,\n";
    match MatchImporter::from_reader(export.as_bytes(), Utc::now()) {
        Err(MatchImportError::InvalidRow { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected invalid row, got {other:?}"),
    }
}

#[test]
fn import_from_missing_file_is_io_error() {
    let result = MatchImporter::from_path("does/not/exist.csv", Utc::now());
    assert!(matches!(result, Err(MatchImportError::Io(_))));
}
