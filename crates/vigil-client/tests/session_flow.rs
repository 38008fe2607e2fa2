//! Registration, login, and guardian directory flows over the dual
//! store.

use std::sync::{Arc, Mutex};

use vigil_client::{ClientError, SessionService, SharedDb};
use vigil_remote::{paths, MemoryRemote, RemoteStore};
use vigil_shared::{Address, User};
use vigil_store::Database;

fn open_db() -> (tempfile::TempDir, SharedDb) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("test.db")).unwrap();
    (dir, Arc::new(Mutex::new(db)))
}

fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn service(db: SharedDb, remote: Arc<MemoryRemote>) -> SessionService {
    SessionService::new(db, remote)
}

#[tokio::test]
async fn register_establishes_session_and_replicates() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());
    let sessions = service(db.clone(), remote.clone());

    let user = sessions
        .register("Ana", "Ana.Lopez@Mail.com", "s3cret")
        .await
        .unwrap();
    assert_eq!(user.address.as_str(), "ana_lopez@mail_com");
    assert_eq!(user.danger_phrase, "help me now");

    assert_eq!(sessions.current_user().unwrap(), Some(user.clone()));

    let stored = remote.get(&paths::user(&user.address)).await.unwrap().unwrap();
    assert_eq!(stored["name"], "Ana");
}

#[tokio::test]
async fn duplicate_registration_is_rejected_without_side_effects() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());
    let sessions = service(db.clone(), remote);

    sessions.register("Ana", "ana@mail.com", "one").await.unwrap();

    // Same address modulo case counts as a duplicate.
    let err = sessions.register("Imposter", "ANA@mail.com", "two").await;
    assert!(matches!(err, Err(ClientError::AlreadyExists)));

    let current = sessions.current_user().unwrap().unwrap();
    assert_eq!(current.name, "Ana");
    assert_eq!(current.secret, "one");
}

#[tokio::test]
async fn registration_requires_name_and_secret() {
    let (_dir, db) = open_db();
    let sessions = service(db, Arc::new(MemoryRemote::new()));

    assert!(matches!(
        sessions.register("  ", "a@x.com", "s").await,
        Err(ClientError::InvalidInput(_))
    ));
    assert!(matches!(
        sessions.register("Ana", "a@x.com", "").await,
        Err(ClientError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn login_works_offline_from_the_local_cache() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());
    let sessions = service(db.clone(), remote.clone());

    sessions.register("Ana", "ana@mail.com", "s3cret").await.unwrap();
    sessions.logout().unwrap();

    remote.set_reachable(false);
    let user = sessions.login("ana@mail.com", "s3cret").await.unwrap();
    assert_eq!(user.name, "Ana");
    assert!(sessions.current_user().unwrap().is_some());
}

#[tokio::test]
async fn login_falls_back_to_remote_and_backfills_cache() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());

    // Account exists only remotely (created on another device).
    let user = User::new("Bo", addr("bo@mail.com"), "hunter2");
    remote
        .set(&paths::user(&user.address), serde_json::to_value(&user).unwrap())
        .await
        .unwrap();

    let sessions = service(db.clone(), remote);
    let signed_in = sessions.login("bo@mail.com", "hunter2").await.unwrap();
    assert_eq!(signed_in, user);

    // Backfilled: a second login succeeds with the remote gone.
    {
        let store = db.lock().unwrap();
        assert!(store.get_user(&user.address).unwrap().is_some());
    }
}

#[tokio::test]
async fn wrong_secret_is_indistinguishable_from_absence() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());
    let sessions = service(db, remote);

    sessions.register("Ana", "ana@mail.com", "right").await.unwrap();
    sessions.logout().unwrap();

    let mismatch = sessions.login("ana@mail.com", "wrong").await;
    let missing = sessions.login("ghost@mail.com", "right").await;

    assert!(matches!(mismatch, Err(ClientError::NotFound)));
    assert!(matches!(missing, Err(ClientError::NotFound)));
}

#[tokio::test]
async fn guardian_edits_enforce_edge_invariants() {
    let (_dir, db) = open_db();
    let sessions = service(db, Arc::new(MemoryRemote::new()));

    sessions.register("Ana", "ana@mail.com", "s").await.unwrap();

    // Self-guardian rejected, case-insensitively.
    assert!(matches!(
        sessions.add_guardian("ANA@mail.com").await,
        Err(ClientError::InvalidInput(_))
    ));

    let user = sessions.add_guardian("bo@mail.com").await.unwrap();
    assert!(user.has_guardian(&addr("bo@mail.com")));

    assert!(matches!(
        sessions.add_guardian("bo@mail.com").await,
        Err(ClientError::InvalidInput(_))
    ));

    // Removal is idempotent.
    sessions.remove_guardian("bo@mail.com").await.unwrap();
    let user = sessions.remove_guardian("bo@mail.com").await.unwrap();
    assert!(user.guardians.is_empty());
}

#[tokio::test]
async fn reverse_index_tracks_guardian_membership() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());
    let sessions = service(db, remote.clone());

    sessions.register("Ana", "ana@mail.com", "s").await.unwrap();
    sessions.add_guardian("bo@mail.com").await.unwrap();

    let wards = sessions.guardians_of(&addr("bo@mail.com")).await.unwrap();
    assert_eq!(wards, vec![addr("ana@mail.com")]);

    sessions.remove_guardian("bo@mail.com").await.unwrap();
    let wards = sessions.guardians_of(&addr("bo@mail.com")).await.unwrap();
    assert!(wards.is_empty());
}

#[tokio::test]
async fn directory_lookup_failure_reads_as_unknown() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());
    let sessions = service(db, remote.clone());

    remote.set_reachable(false);
    assert!(sessions.find_by_address(&addr("ana@mail.com")).await.is_none());
}

#[tokio::test]
async fn danger_phrase_update_replaces_whole_record() {
    let (_dir, db) = open_db();
    let remote = Arc::new(MemoryRemote::new());
    let sessions = service(db, remote.clone());

    sessions.register("Ana", "ana@mail.com", "s").await.unwrap();
    let user = sessions.set_danger_phrase("  code red  ").await.unwrap();
    assert_eq!(user.danger_phrase, "code red");

    let stored = remote.get(&paths::user(&user.address)).await.unwrap().unwrap();
    assert_eq!(stored["danger_phrase"], "code red");

    assert!(matches!(
        sessions.set_danger_phrase("   ").await,
        Err(ClientError::InvalidInput(_))
    ));
}
