use std::sync::Arc;

use chrono::Duration;
use portal_core::model::{
    AccountStatus, Material, MaterialId, MaterialKind, Percent, Role, Session, User, UserId,
};
use portal_core::sequence::MoveDirection;
use portal_core::time::fixed_now;
use portal_core::{AccessDecision, LockReason};
use services::{Clock, OpenOutcome, PortalServices, ProgressStore};
use storage::json::JsonFileProgressBackend;
use storage::repository::InMemoryRepository;

fn video(id: &str, subject: &str) -> Material {
    let url = format!("https://drive.google.com/file/d/{id}/view");
    Material::new(
        MaterialId::new(id).unwrap(),
        format!("Lesson {id}"),
        MaterialKind::Video,
        subject,
        None,
        Some(url.as_str()),
    )
    .unwrap()
}

fn document(id: &str) -> Material {
    Material::new(
        MaterialId::new(id).unwrap(),
        format!("Notes {id}"),
        MaterialKind::Document,
        "Math",
        None,
        Some("https://example.com/notes.pdf"),
    )
    .unwrap()
}

fn id(raw: &str) -> MaterialId {
    MaterialId::new(raw).unwrap()
}

fn student(status: AccountStatus) -> User {
    User::new(
        UserId::new("s1").unwrap(),
        "Sam Student",
        "sam@example.com",
        Role::Student,
        status,
    )
    .unwrap()
}

fn paid_student() -> Session {
    Session::sign_in(student(AccountStatus::Approved), fixed_now())
}

fn trial_student() -> Session {
    Session::start_trial(student(AccountStatus::Pending), fixed_now())
}

fn catalog() -> Vec<Material> {
    vec![
        video("a", "Math"),
        video("b", "Math"),
        video("c", "Math"),
        video("d", "Math"),
        document("n1"),
    ]
}

#[tokio::test]
async fn registered_student_unlocks_videos_one_by_one() {
    let services = PortalServices::in_memory(catalog(), Clock::fixed(fixed_now()));
    let dashboard = services.dashboard();
    let session = paid_student();

    let view = dashboard.dashboard_for(&session).await.unwrap();
    assert_eq!(view.tile(&id("a")).unwrap().access, AccessDecision::Unlocked);
    assert_eq!(
        view.tile(&id("b")).unwrap().access,
        AccessDecision::Locked(LockReason::SequentialPrerequisiteIncomplete)
    );

    services.progress().set_progress(&id("a"), 40.0);
    let outcome = dashboard.open_material(&session, &id("b")).await.unwrap();
    assert_eq!(
        outcome,
        OpenOutcome::Locked {
            reason: LockReason::SequentialPrerequisiteIncomplete,
            message: "Please complete the previous video to unlock this one.",
        }
    );

    services.progress().set_progress(&id("a"), 100.0);
    let outcome = dashboard.open_material(&session, &id("b")).await.unwrap();
    assert!(matches!(outcome, OpenOutcome::OpenPlayer { .. }));
    // The player drives progress; opening alone does not complete a video.
    assert_eq!(services.progress().get_progress(&id("b")), Percent::ZERO);
}

#[tokio::test]
async fn trial_student_previews_first_three_videos_only() {
    let services = PortalServices::in_memory(catalog(), Clock::fixed(fixed_now()));
    let view = services
        .dashboard()
        .dashboard_for(&trial_student())
        .await
        .unwrap();

    assert!(!view.trial_expired);
    for open in ["a", "b", "c"] {
        assert_eq!(view.tile(&id(open)).unwrap().access, AccessDecision::Unlocked);
    }
    assert_eq!(
        view.tile(&id("d")).unwrap().access,
        AccessDecision::Locked(LockReason::TrialExpired)
    );
    assert_eq!(view.tile(&id("n1")).unwrap().access, AccessDecision::Unlocked);
}

#[tokio::test]
async fn expired_trial_locks_students_but_not_staff() {
    let services = PortalServices::in_memory(
        catalog(),
        Clock::fixed(fixed_now() + Duration::days(8)),
    );
    let dashboard = services.dashboard();

    let expired = dashboard.dashboard_for(&trial_student()).await.unwrap();
    assert!(expired.trial_expired);
    assert!(expired
        .sections
        .iter()
        .flat_map(|s| s.tiles())
        .all(|t| t.access == AccessDecision::Locked(LockReason::TrialExpired)));

    let outcome = dashboard
        .open_material(&trial_student(), &id("n1"))
        .await
        .unwrap();
    assert!(outcome.is_locked());
    assert_eq!(services.progress().get_progress(&id("n1")), Percent::ZERO);

    let agent = User::new(
        UserId::new("ag").unwrap(),
        "Ada Agent",
        "agent@example.com",
        Role::Agent,
        AccountStatus::Pending,
    )
    .unwrap();
    let staff = dashboard
        .dashboard_for(&Session::start_trial(agent, fixed_now()))
        .await
        .unwrap();
    assert!(!staff.trial_expired);
    assert!(staff
        .sections
        .iter()
        .flat_map(|s| s.tiles())
        .all(|t| t.access == AccessDecision::Unlocked));
}

#[tokio::test]
async fn opening_a_document_completes_it() {
    let services = PortalServices::in_memory(catalog(), Clock::fixed(fixed_now()));
    let outcome = services
        .dashboard()
        .open_material(&paid_student(), &id("n1"))
        .await
        .unwrap();
    assert!(matches!(outcome, OpenOutcome::OpenExternal { .. }));
    assert!(services.progress().get_progress(&id("n1")).is_complete());
}

#[tokio::test]
async fn reordering_changes_which_video_is_gated() {
    let services = PortalServices::in_memory(catalog(), Clock::fixed(fixed_now()));
    services
        .catalog()
        .move_material(&id("c"), MoveDirection::Up)
        .await
        .unwrap();

    let view = services.dashboard().dashboard_for(&paid_student()).await.unwrap();
    let order: Vec<&str> = view
        .section(MaterialKind::Video)
        .unwrap()
        .tiles()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(order, ["a", "c", "b", "d"]);

    services.progress().set_progress(&id("a"), 100.0);
    let view = services.dashboard().dashboard_for(&paid_student()).await.unwrap();
    assert_eq!(view.tile(&id("c")).unwrap().access, AccessDecision::Unlocked);
    assert!(view.tile(&id("b")).unwrap().access.is_locked());
}

#[tokio::test]
async fn progress_file_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");

    let first = PortalServices::assemble(
        Arc::new(InMemoryRepository::with_materials(catalog())),
        ProgressStore::open(Arc::new(JsonFileProgressBackend::new(&path))),
        Clock::fixed(fixed_now()),
    );
    first.progress().set_progress(&id("a"), 100.0);
    first.progress().set_progress(&id("b"), 57.0);

    let reopened = ProgressStore::open(Arc::new(JsonFileProgressBackend::new(&path)));
    assert!(!reopened.is_ephemeral());
    assert!(reopened.get_progress(&id("a")).is_complete());
    assert_eq!(reopened.get_progress(&id("b")).value(), 57.0);
}

#[tokio::test]
async fn corrupt_progress_file_falls_back_to_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("progress.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = ProgressStore::open(Arc::new(JsonFileProgressBackend::new(&path)));
    assert!(store.is_ephemeral());
    store.set_progress(&id("a"), 100.0);
    assert!(store.get_progress(&id("a")).is_complete());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}
