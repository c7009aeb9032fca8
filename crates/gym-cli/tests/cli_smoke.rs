use gym_store::snapshot_lock_path;
use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "gym-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn store(&self) -> PathBuf {
        self.path.join("snapshot.jsonl")
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn gym_command(dir: &TempDirGuard) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gym"));
    command
        .current_dir(dir.path())
        .env_remove("GYM_STORE_PATH")
        .env_remove("GYM_LOG");
    command
}

fn run_gym<I, S>(dir: &TempDirGuard, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    gym_command(dir)
        .arg("--store")
        .arg(dir.store())
        .args(args)
        .output()
        .expect("gym command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
    assert_eq!(output.status.code(), Some(1));
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be valid json: {e}\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        )
    })
}

fn json_ok(dir: &TempDirGuard, args: &[&str]) -> Value {
    let output = run_gym(dir, args.iter().chain(["--json"].iter()));
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["ok"], true);
    payload
}

fn json_err(dir: &TempDirGuard, args: &[&str]) -> Value {
    let output = run_gym(dir, args.iter().chain(["--json"].iter()));
    assert_failure(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["ok"], false);
    payload
}

fn register_active_member(dir: &TempDirGuard, id: &str) {
    json_ok(
        dir,
        &["register-member", "--id", id, "--secret", "pw", "--name", id],
    );
    json_ok(
        dir,
        &["activate", "--user", id, "--secret", "pw", "--plan", "monthly"],
    );
}

fn schedule_class(dir: &TempDirGuard, facility: &str, capacity: &str) -> String {
    json_ok(
        dir,
        &[
            "register-operator",
            "--id",
            "boss",
            "--secret",
            "root",
            "--name",
            "Front Desk",
        ],
    );
    let payload = json_ok(
        dir,
        &[
            "add-class",
            "--user",
            "boss",
            "--secret",
            "root",
            "--facility",
            facility,
            "--category",
            "pilates",
            "--trainer",
            "Ioana",
            "--specialization",
            "Reformer",
            "--duration",
            "50",
            "--capacity",
            capacity,
            "--start",
            "2030-01-15 18:00",
        ],
    );
    payload["class"]["classId"]
        .as_str()
        .expect("class id should be present")
        .to_string()
}

#[test]
fn member_flow_round_trips_through_the_snapshot() {
    let dir = TempDirGuard::new("member-flow");
    let registered = json_ok(
        &dir,
        &[
            "register-member",
            "--id",
            "ana",
            "--secret",
            "secret",
            "--name",
            "Ana Pop",
        ],
    );
    assert_eq!(registered["action"], "account.register_member");
    assert!(dir.store().exists());

    let activated = json_ok(
        &dir,
        &[
            "activate",
            "--user",
            "ana",
            "--secret",
            "secret",
            "--plan",
            "short-cycle",
        ],
    );
    assert_eq!(activated["plan"]["id"], "monthly");
    assert_eq!(activated["plan"]["price"], 150);

    let visit = json_ok(&dir, &["visit", "--user", "ana", "--secret", "secret"]);
    assert_eq!(visit["outcome"], "recorded");

    let check_in = json_ok(
        &dir,
        &[
            "check-in",
            "--user",
            "ana",
            "--secret",
            "secret",
            "--facility",
            "F1",
            "--zone",
            "Cardio",
        ],
    );
    assert_eq!(check_in["checkIn"]["occupancy"], 1);
    assert_eq!(check_in["checkIn"]["capacity"], 25);

    let whoami = json_ok(&dir, &["whoami", "--user", "ana", "--secret", "secret"]);
    assert_eq!(whoami["account"]["status"], "active");
    assert_eq!(whoami["account"]["visits"], "1");
    assert_eq!(whoami["account"]["currentZone"], "Cardio");

    let again = json_err(
        &dir,
        &[
            "check-in",
            "--user",
            "ana",
            "--secret",
            "secret",
            "--facility",
            "F1",
            "--zone",
            "Strength",
        ],
    );
    assert_eq!(again["failureClass"], "already_checked_in");

    let out = json_ok(
        &dir,
        &[
            "check-out",
            "--user",
            "ana",
            "--secret",
            "secret",
            "--facility",
            "F1",
        ],
    );
    assert_eq!(out["checkOut"]["occupancy"], 0);

    let facilities = json_ok(&dir, &["facilities"]);
    let zones = facilities["facilities"][0]["zones"]
        .as_array()
        .expect("zones array");
    assert!(zones.iter().all(|z| z["occupancy"] == 0));
}

#[test]
fn domain_failures_exit_one_with_a_message() {
    let dir = TempDirGuard::new("failures");
    json_ok(
        &dir,
        &["register-member", "--id", "ana", "--secret", "pw", "--name", "Ana"],
    );

    let output = run_gym(
        &dir,
        [
            "check-in",
            "--user",
            "ana",
            "--secret",
            "pw",
            "--facility",
            "F1",
            "--zone",
            "Cardio",
        ],
    );
    assert_failure(&output);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("error: membership is not active"),
        "stderr was: {stderr}"
    );

    let bad_login = json_err(&dir, &["whoami", "--user", "ana", "--secret", "nope"]);
    assert_eq!(bad_login["failureClass"], "invalid_credentials");

    let duplicate = json_err(
        &dir,
        &["register-member", "--id", "ana", "--secret", "x", "--name", "Again"],
    );
    assert_eq!(duplicate["failureClass"], "duplicate_identifier");

    let bad_plan = json_err(
        &dir,
        &["activate", "--user", "ana", "--secret", "pw", "--plan", "weekly"],
    );
    assert_eq!(bad_plan["failureClass"], "unknown_plan");
}

#[test]
fn operator_schedules_and_member_reserves() {
    let dir = TempDirGuard::new("classes");
    let class_id = schedule_class(&dir, "F2", "5");
    register_active_member(&dir, "ana");

    let reserved = json_ok(
        &dir,
        &[
            "reserve", "--user", "ana", "--secret", "pw", "--facility", "F2", "--class",
            class_id.as_str(),
        ],
    );
    assert_eq!(reserved["reservation"]["enrolled"], 1);

    let mine = json_ok(&dir, &["reservations", "--user", "ana", "--secret", "pw"]);
    assert_eq!(mine["count"], 1);
    assert_eq!(mine["classes"][0]["id"], class_id.as_str());

    let stats = json_ok(&dir, &["stats", "--user", "boss", "--secret", "root"]);
    assert_eq!(stats["statistics"]["totalClasses"], 1);
    assert_eq!(stats["statistics"]["totalParticipants"], 1);
    assert_eq!(stats["statistics"]["activeMembers"], 1);

    let denied = json_err(&dir, &["stats", "--user", "ana", "--secret", "pw"]);
    assert_eq!(denied["failureClass"], "not_an_operator");

    let removed = json_ok(
        &dir,
        &[
            "remove-class", "--user", "boss", "--secret", "root", "--facility", "F2",
            "--class", class_id.as_str(),
        ],
    );
    assert_eq!(removed["removed"]["released"][0], "ana");

    let mine = json_ok(&dir, &["reservations", "--user", "ana", "--secret", "pw"]);
    assert_eq!(mine["count"], 0);
}

#[test]
fn parallel_processes_cannot_overbook_a_class() {
    let dir = Arc::new(TempDirGuard::new("parallel"));
    let class_id = schedule_class(&dir, "F3", "2");
    let workers = 5;
    for idx in 0..workers {
        register_active_member(&dir, &format!("m{idx}"));
    }

    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|idx| {
            let dir = Arc::clone(&dir);
            let barrier = Arc::clone(&barrier);
            let class_id = class_id.clone();
            thread::spawn(move || {
                let user = format!("m{idx}");
                barrier.wait();
                run_gym(
                    &dir,
                    [
                        "reserve",
                        "--user",
                        user.as_str(),
                        "--secret",
                        "pw",
                        "--facility",
                        "F3",
                        "--class",
                        class_id.as_str(),
                        "--json",
                    ],
                )
            })
        })
        .collect();

    let outputs: Vec<Output> = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker should join"))
        .collect();
    let booked = outputs.iter().filter(|o| o.status.success()).count();
    assert_eq!(booked, 2);
    for output in outputs.iter().filter(|o| !o.status.success()) {
        assert_eq!(parse_json_stdout(output)["failureClass"], "class_full");
    }

    let classes = json_ok(&dir, &["classes"]);
    assert_eq!(classes["classes"][0]["enrolled"], 2);
}

#[test]
fn busy_lock_fails_fast_with_configured_policy() {
    let dir = TempDirGuard::new("busy");
    let config = dir.path().join("gym.toml");
    fs::write(&config, "[lock]\nattempts = 2\nretry_delay_ms = 1\n")
        .expect("config should write");
    let lock = snapshot_lock_path(&dir.store());
    fs::write(&lock, "held\n").expect("lock should write");

    let output = gym_command(&dir)
        .arg("--store")
        .arg(dir.store())
        .arg("--config")
        .arg(&config)
        .args(["register-member", "--id", "ana", "--secret", "pw", "--name", "Ana", "--json"])
        .output()
        .expect("gym command should execute");
    assert_failure(&output);
    assert_eq!(parse_json_stdout(&output)["failureClass"], "store_io_failure");
    assert!(!dir.store().exists());
}

#[test]
fn lock_left_by_a_killed_writer_is_reclaimed() {
    let dir = TempDirGuard::new("stale-lock");
    let config = dir.path().join("gym.toml");
    fs::write(&config, "[lock]\nattempts = 2\nretry_delay_ms = 1\nstale_after_ms = 50\n")
        .expect("config should write");
    let lock = snapshot_lock_path(&dir.store());
    fs::write(&lock, "pid=999999\n").expect("lock should write");
    std::thread::sleep(std::time::Duration::from_millis(120));

    let output = gym_command(&dir)
        .arg("--store")
        .arg(dir.store())
        .arg("--config")
        .arg(&config)
        .args(["register-member", "--id", "ana", "--secret", "pw", "--name", "Ana", "--json"])
        .output()
        .expect("gym command should execute");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(parse_json_stdout(&output)["ok"], true);
    assert!(!lock.exists());
}

#[test]
fn store_path_comes_from_environment_when_no_flag_is_given() {
    let dir = TempDirGuard::new("env");
    let store = dir.path().join("from-env.jsonl");

    let output = gym_command(&dir)
        .env("GYM_STORE_PATH", &store)
        .args(["register-member", "--id", "ana", "--secret", "pw", "--name", "Ana"])
        .output()
        .expect("gym command should execute");
    assert_success(&output);
    assert!(store.exists());
    assert!(!dir.store().exists());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Registered: ana"));
}

#[test]
fn corrupt_snapshot_is_reported_not_replaced() {
    let dir = TempDirGuard::new("corrupt");
    fs::write(dir.store(), "garbage\n").expect("fixture should write");

    let output = run_gym(&dir, ["facilities", "--json"]);
    assert_failure(&output);
    assert_eq!(parse_json_stdout(&output)["failureClass"], "store_io_failure");
    assert_eq!(
        fs::read_to_string(dir.store()).expect("snapshot still present"),
        "garbage\n"
    );
}
