//! JSONL storage: one line per record.
//!
//! Line 1 is a header carrying the schema and revision; every following line
//! is either an account or a class session tagged with its facility. Each
//! line carries a `record` tag; keys are written in sorted order:
//!
//! ```text
//! {"record":"header","revision":7,"schema":1}
//! {"createdAt":"...","displayName":"Ana Pop","id":"ana","kind":"member",...,"record":"account"}
//! {"capacity":12,...,"facility":"F1","id":"3f2a9c01",...,"record":"class",...}
//! ```

use gym_kernel::{Account, ClassSession};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::snapshot::Snapshot;

pub const SNAPSHOT_SCHEMA: u32 = 1;

const RECORD_HEADER: &str = "header";
const RECORD_ACCOUNT: &str = "account";
const RECORD_CLASS: &str = "class";

#[derive(Debug, Serialize, Deserialize)]
struct HeaderLine {
    schema: u32,
    revision: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClassLine {
    facility: String,
    #[serde(flatten)]
    class: ClassSession,
}

/// Read a snapshot from a JSONL reader.
pub fn read_snapshot(reader: impl BufRead) -> Result<Snapshot, JsonlError> {
    let mut header: Option<HeaderLine> = None;
    let mut accounts = Vec::new();
    let mut classes = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|e| JsonlError::Io(line_no, e.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut value: Value = serde_json::from_str(trimmed)
            .map_err(|e| JsonlError::Parse(line_no, e.to_string()))?;
        let record = take_record_tag(&mut value, line_no)?;

        match (record.as_str(), header.is_some()) {
            (RECORD_HEADER, false) => {
                let parsed: HeaderLine = decode(value, line_no)?;
                if parsed.schema != SNAPSHOT_SCHEMA {
                    return Err(JsonlError::Corrupt(format!(
                        "line {line_no}: unsupported schema {} (expected {SNAPSHOT_SCHEMA})",
                        parsed.schema
                    )));
                }
                header = Some(parsed);
            }
            (RECORD_HEADER, true) => {
                return Err(JsonlError::Corrupt(format!(
                    "line {line_no}: duplicate header"
                )));
            }
            (_, false) => {
                return Err(JsonlError::Corrupt(format!(
                    "line {line_no}: record before header"
                )));
            }
            (RECORD_ACCOUNT, true) => accounts.push(decode::<Account>(value, line_no)?),
            (RECORD_CLASS, true) => {
                let parsed: ClassLine = decode(value, line_no)?;
                classes.push((parsed.facility, parsed.class));
            }
            (other, true) => {
                return Err(JsonlError::Parse(
                    line_no,
                    format!("unknown record kind `{other}`"),
                ));
            }
        }
    }

    let header = header.ok_or_else(|| JsonlError::Corrupt("missing header".to_string()))?;
    Snapshot::from_records(header.revision, accounts, classes)
        .map_err(|e| JsonlError::Corrupt(e.to_string()))
}

fn take_record_tag(value: &mut Value, line_no: usize) -> Result<String, JsonlError> {
    let object = value
        .as_object_mut()
        .ok_or_else(|| JsonlError::Parse(line_no, "expected a JSON object".to_string()))?;
    match object.remove("record") {
        Some(Value::String(tag)) => Ok(tag),
        _ => Err(JsonlError::Parse(
            line_no,
            "missing string field `record`".to_string(),
        )),
    }
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value, line_no: usize) -> Result<T, JsonlError> {
    serde_json::from_value(value).map_err(|e| JsonlError::Parse(line_no, e.to_string()))
}

/// Write a snapshot to a JSONL writer.
pub fn write_snapshot(writer: &mut impl Write, snapshot: &Snapshot) -> Result<(), JsonlError> {
    let header = HeaderLine {
        schema: SNAPSHOT_SCHEMA,
        revision: snapshot.revision(),
    };
    write_record(writer, RECORD_HEADER, &header)?;
    for account in snapshot.accounts() {
        write_record(writer, RECORD_ACCOUNT, account)?;
    }
    for (facility, class) in snapshot.classes() {
        let line = ClassLine {
            facility: facility.to_string(),
            class: class.clone(),
        };
        write_record(writer, RECORD_CLASS, &line)?;
    }
    Ok(())
}

fn write_record(
    writer: &mut impl Write,
    record: &str,
    payload: &impl Serialize,
) -> Result<(), JsonlError> {
    let mut value =
        serde_json::to_value(payload).map_err(|e| JsonlError::Serialize(e.to_string()))?;
    value
        .as_object_mut()
        .ok_or_else(|| JsonlError::Serialize(format!("{record} did not encode as an object")))?
        .insert("record".to_string(), Value::String(record.to_string()));
    let line =
        serde_json::to_string(&value).map_err(|e| JsonlError::Serialize(e.to_string()))?;
    writeln!(writer, "{line}").map_err(|e| JsonlError::Io(0, e.to_string()))?;
    Ok(())
}

/// Read a snapshot from a JSONL file path.
///
/// A missing file is the first-run case and yields an empty snapshot. Any
/// other failure (unreadable, corrupt) is an error.
pub fn read_snapshot_from_path(path: impl AsRef<Path>) -> Result<Snapshot, JsonlError> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Snapshot::empty()),
        Err(err) => return Err(JsonlError::Io(0, format!("{}: {err}", path.display()))),
    };
    validate_substrate_bytes(path, &bytes)?;
    let reader = BufReader::new(bytes.as_slice());
    read_snapshot(reader)
}

/// Write a snapshot to a JSONL file path.
///
/// The file is replaced atomically: readers see either the previous
/// snapshot or the new one, never a partial write.
pub fn write_snapshot_to_path(
    path: impl AsRef<Path>,
    snapshot: &Snapshot,
) -> Result<(), JsonlError> {
    let path = path.as_ref();
    let records = 1 + snapshot.account_count() + snapshot.classes().count();
    let failed = |stage: &str, at: &Path, err: std::io::Error| {
        JsonlError::Io(
            0,
            format!(
                "{stage} revision {} ({records} records) at {}: {err}",
                snapshot.revision(),
                at.display()
            ),
        )
    };

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent).map_err(|e| failed("preparing", parent, e))?;
    }

    let tmp_path = tmp_write_path(path);
    let staged = File::create(&tmp_path)
        .map_err(|e| failed("staging", &tmp_path, e))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write_snapshot(&mut writer, snapshot)?;
            let file = writer
                .into_inner()
                .map_err(|e| failed("flushing", &tmp_path, e.into_error()))?;
            file.sync_all().map_err(|e| failed("syncing", &tmp_path, e))
        })
        .and_then(|()| fs::rename(&tmp_path, path).map_err(|e| failed("publishing", path, e)));
    if let Err(err) = staged {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    if let Some(parent) = parent {
        File::open(parent)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| failed("syncing directory for", parent, e))?;
    }
    Ok(())
}

fn tmp_write_path(path: &Path) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(format!(".tmp.{}.{}", std::process::id(), unique));
    PathBuf::from(tmp)
}

fn validate_substrate_bytes(path: &Path, bytes: &[u8]) -> Result<(), JsonlError> {
    if bytes.contains(&0) {
        return Err(JsonlError::Corrupt(format!(
            "{}: contains NUL byte(s)",
            path.display()
        )));
    }
    if std::str::from_utf8(bytes).is_err() {
        return Err(JsonlError::Corrupt(format!(
            "{}: contains non-UTF-8 byte sequence(s)",
            path.display()
        )));
    }
    Ok(())
}

/// Errors from JSONL operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("line {0}: I/O error: {1}")]
    Io(usize, String),

    #[error("line {0}: parse error: {1}")]
    Parse(usize, String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("corrupted snapshot: {0}")]
    Corrupt(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use gym_kernel::{ClassCategory, NewClass, PlanId, Trainer};

    fn temp_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "gym-jsonl-{prefix}-{}-{unique}.jsonl",
            std::process::id()
        ))
    }

    fn populated() -> Snapshot {
        let now = Utc
            .with_ymd_and_hms(2026, 5, 4, 10, 0, 0)
            .single()
            .expect("fixed time");
        let mut ana = Account::new_member("ana", "pw", "Ana Pop", now).expect("account");
        ana.member_mut()
            .expect("member")
            .activate(PlanId::Annual, now);
        let root = Account::new_operator("root", "pw", "Root", "senior", now).expect("account");

        let mut class = ClassSession::new(
            "0badc0de",
            NewClass {
                category: ClassCategory::Pilates,
                trainer: Trainer {
                    name: "Elena".to_string(),
                    specialization: "Reformer".to_string(),
                },
                duration_minutes: 55,
                capacity: 8,
                start_time: now,
            },
            "North Fitness",
        );
        class.reserve("ana");
        ana.member_mut()
            .expect("member")
            .reserved_classes
            .insert("0badc0de".to_string());

        Snapshot::from_records(4, vec![ana, root], vec![("F2".to_string(), class)])
            .expect("snapshot")
    }

    #[test]
    fn write_then_read_preserves_records_and_revision() {
        let path = temp_path("round-trip");
        let snapshot = populated();
        write_snapshot_to_path(&path, &snapshot).expect("write should succeed");

        let text = fs::read_to_string(&path).expect("file should exist");
        let first = text.lines().next().expect("header line");
        assert_eq!(first, r#"{"record":"header","revision":4,"schema":1}"#);
        assert_eq!(text.lines().count(), 4);

        for line in text.lines().skip(1) {
            let value: Value = serde_json::from_str(line).expect("line is JSON");
            let tag = value["record"].as_str().expect("record tag");
            assert!(tag == RECORD_ACCOUNT || tag == RECORD_CLASS, "tag {tag}");
        }
        assert!(text.contains(r#""facility":"F2""#));

        let back = read_snapshot_from_path(&path).expect("read should succeed");
        assert_eq!(back, snapshot);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_empty_snapshot() {
        let path = temp_path("missing");
        let snapshot = read_snapshot_from_path(&path).expect("missing file should bootstrap");
        assert_eq!(snapshot.revision(), 0);
        assert_eq!(snapshot.account_count(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn empty_file_is_corrupt_not_empty() {
        let path = temp_path("empty");
        fs::write(&path, "").expect("fixture should write");
        match read_snapshot_from_path(&path) {
            Err(JsonlError::Corrupt(message)) => assert!(message.contains("missing header")),
            other => panic!("expected corrupt snapshot, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_nul_payload() {
        let path = temp_path("nul");
        fs::write(
            &path,
            b"{\"record\":\"header\",\"schema\":1,\"revision\":0}\n\0garbage",
        )
        .expect("fixture should write");

        match read_snapshot_from_path(&path) {
            Err(JsonlError::Corrupt(message)) => assert!(message.contains("contains NUL")),
            other => panic!("expected corrupt substrate error, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let path = temp_path("non-utf8");
        fs::write(&path, [0xff, 0xfe, 0xfd]).expect("fixture should write");

        match read_snapshot_from_path(&path) {
            Err(JsonlError::Corrupt(message)) => assert!(message.contains("non-UTF-8")),
            other => panic!("expected corrupt substrate error, got {other:?}"),
        }
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_truncated_record() {
        let input = "{\"record\":\"header\",\"schema\":1,\"revision\":2}\n{\"record\":\"account\",\"id\":";
        match read_snapshot(BufReader::new(input.as_bytes())) {
            Err(JsonlError::Parse(line, _)) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_records_before_header_and_unknown_kinds() {
        let before = "{\"record\":\"class\",\"facility\":\"F1\"}\n";
        assert!(matches!(
            read_snapshot(BufReader::new(before.as_bytes())),
            Err(JsonlError::Corrupt(_))
        ));

        let unknown = "{\"record\":\"header\",\"schema\":1,\"revision\":0}\n{\"record\":\"zone\"}\n";
        match read_snapshot(BufReader::new(unknown.as_bytes())) {
            Err(JsonlError::Parse(line, message)) => {
                assert_eq!(line, 2);
                assert!(message.contains("zone"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let input = "# snapshot\n\n{\"record\":\"header\",\"schema\":1,\"revision\":9}\n";
        let snapshot = read_snapshot(BufReader::new(input.as_bytes())).expect("should parse");
        assert_eq!(snapshot.revision(), 9);
    }

    #[test]
    fn write_failure_names_the_revision_and_leaves_no_partial_file() {
        let dir = temp_path("long-name");
        fs::create_dir_all(&dir).expect("dir should be created");
        // the `.tmp.<pid>.<nanos>` sibling of this name exceeds NAME_MAX
        let path = dir.join(format!("{}.jsonl", "s".repeat(236)));

        match write_snapshot_to_path(&path, &populated()) {
            Err(JsonlError::Io(_, message)) => {
                assert!(message.starts_with("staging revision 4 (4 records)"), "{message}");
            }
            other => panic!("expected staging failure, got {other:?}"),
        }
        assert!(!path.exists());
        assert_eq!(fs::read_dir(&dir).expect("dir readable").count(), 0);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn write_replaces_file_atomically() {
        let path = temp_path("atomic-write");
        write_snapshot_to_path(&path, &Snapshot::empty()).expect("first write");
        write_snapshot_to_path(&path, &populated()).expect("second write");

        let back = read_snapshot_from_path(&path).expect("read");
        assert_eq!(back.revision(), 4);

        let parent = path.parent().expect("temp file has parent");
        let stem = path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("utf-8 file name")
            .to_string();
        let leftovers = fs::read_dir(parent)
            .expect("temp dir readable")
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(&format!("{stem}.tmp.")))
            })
            .count();
        assert_eq!(leftovers, 0);

        let _ = fs::remove_file(path);
    }
}
