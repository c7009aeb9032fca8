use chrono::{TimeZone, Utc};
use gym_kernel::{Account, GymError};
use gym_store::{LockPolicy, SnapshotStore, snapshot_lock_path};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn temp_snapshot_path(prefix: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after unix epoch")
        .as_nanos();
    let root = std::env::temp_dir().join(format!(
        "gym-store-it-{prefix}-{}-{unique}",
        std::process::id()
    ));
    fs::create_dir_all(&root).expect("temp dir should be created");
    root.join("snapshot.jsonl")
}

fn patient_store(path: &PathBuf) -> SnapshotStore {
    SnapshotStore::new(path).with_lock_policy(LockPolicy {
        attempts: 5_000,
        retry_delay: Duration::from_millis(1),
        ..LockPolicy::default()
    })
}

#[test]
fn concurrent_transactions_do_not_lose_updates() {
    let path = temp_snapshot_path("no-lost-updates");
    let workers = 12;
    let barrier = Arc::new(Barrier::new(workers));
    let created = Utc
        .with_ymd_and_hms(2026, 7, 1, 9, 0, 0)
        .single()
        .expect("fixed time");

    let handles: Vec<_> = (0..workers)
        .map(|idx| {
            let store = patient_store(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store
                    .transact(|snapshot| {
                        let id = format!("member-{idx}");
                        let account = Account::new_member(id.as_str(), "pw", id.as_str(), created)?;
                        snapshot.insert_account(account)?;
                        Ok::<_, GymError>((snapshot.revision(), true))
                    })
                    .expect("transaction should commit")
            })
        })
        .collect();

    let mut seen: Vec<u64> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker should join"))
        .collect();
    seen.sort_unstable();
    assert_eq!(seen, (0..workers as u64).collect::<Vec<_>>());

    let snapshot = patient_store(&path).load().expect("snapshot should load");
    assert_eq!(snapshot.account_count(), workers);
    assert_eq!(snapshot.revision(), workers as u64);
    assert!(!snapshot_lock_path(&path).exists());
}

#[test]
fn readers_always_observe_a_complete_snapshot() {
    let path = temp_snapshot_path("readers");
    let writer_store = patient_store(&path);
    let reader_store = patient_store(&path);
    let created = Utc
        .with_ymd_and_hms(2026, 7, 1, 9, 0, 0)
        .single()
        .expect("fixed time");

    let writer = thread::spawn(move || {
        for idx in 0..40 {
            writer_store
                .transact(|snapshot| {
                    let id = format!("w{idx}");
                    snapshot.insert_account(Account::new_member(id.as_str(), "pw", "W", created)?)?;
                    Ok::<_, GymError>(((), true))
                })
                .expect("write should commit");
        }
    });

    let mut last_revision = 0;
    while !writer.is_finished() {
        let snapshot = reader_store.load().expect("reader never sees a torn file");
        assert!(snapshot.revision() >= last_revision);
        assert_eq!(snapshot.account_count() as u64, snapshot.revision());
        last_revision = snapshot.revision();
    }
    writer.join().expect("writer should join");
    assert_eq!(reader_store.load().expect("final load").revision(), 40);
}
