//! Newline-delimited JSON session files.
//!
//! A session lives in `<dir>/<name><suffix>` and holds one message mapping
//! per line, in write order. Blank lines are tolerated on read and never
//! written.

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::error::{Result, SessionError};
use crate::config::SessionsConfig;
use crate::messages::Message;

/// A session file found in a sessions directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    /// File name with the session suffix removed.
    pub name: String,
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

/// Write `messages` to `path`, replacing whatever was there.
pub fn write_to_file(path: &Path, messages: &[Message]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for message in messages {
        let line =
            serde_json::to_string(&message.to_value()).map_err(|source| SessionError::Encode {
                id: message.id.clone(),
                source,
            })?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    debug!(path = %path.display(), count = messages.len(), "Session written");
    Ok(())
}

/// Read every message from `path`, in file order.
pub fn read_from_file(path: &Path) -> Result<Vec<Message>> {
    let reader = BufReader::new(File::open(path)?);

    // Every line is decoded before any message is rebuilt.
    let mut values = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|source| SessionError::Decode {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        values.push(value);
    }

    let messages = values
        .into_iter()
        .map(Message::from_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(path = %path.display(), count = messages.len(), "Session loaded");
    Ok(messages)
}

/// Session files in `directory`, most recently modified first.
///
/// Files with the same modification time are ordered by name. A missing
/// directory yields an empty list.
pub fn list_sorted_session_files(directory: &Path, suffix: &str) -> Result<Vec<SessionFile>> {
    let entries = match session_entries(directory, suffix) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for (name, path) in entries {
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            // Removed between the directory scan and the stat.
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            continue;
        }
        files.push(SessionFile {
            name,
            modified: DateTime::<Utc>::from(metadata.modified()?),
            path,
        });
    }

    files.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(files)
}

/// Whether `directory` holds at least one session file.
///
/// Reads directory entries lazily and stops at the first match.
pub fn session_file_exists(directory: &Path, suffix: &str) -> bool {
    match session_entries(directory, suffix) {
        Ok(mut entries) => entries.any(|(_, path)| path.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            warn!(directory = %directory.display(), "Failed to scan for session files: {e}");
            false
        }
    }
}

/// Path of the session file for `name`, creating the sessions directory if needed.
///
/// The session file itself is not touched.
pub fn session_path(config: &SessionsConfig, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(&config.dir)?;
    Ok(config.dir.join(format!("{name}{}", config.suffix)))
}

/// `(name, path)` for every entry of `directory` whose file name ends with `suffix`.
fn session_entries<'a>(
    directory: &Path,
    suffix: &'a str,
) -> io::Result<impl Iterator<Item = (String, PathBuf)> + 'a> {
    Ok(fs::read_dir(directory)?.filter_map(move |entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable session entry: {e}");
                return None;
            }
        };
        let name = session_name(&entry.file_name(), suffix)?;
        Some((name, entry.path()))
    }))
}

/// File names that are not valid UTF-8 never match.
fn session_name(file_name: &OsStr, suffix: &str) -> Option<String> {
    let name = file_name.to_str()?.strip_suffix(suffix)?;
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Content, Role};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const SUFFIX: &str = ".jsonl";

    fn sample_messages(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"))
                } else {
                    Message::assistant(format!("answer {i}"))
                }
            })
            .collect()
    }

    fn set_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn touch(dir: &Path, file_name: &str, secs: u64) -> PathBuf {
        let path = dir.join(file_name);
        fs::write(&path, "").unwrap();
        set_mtime(&path, secs);
        path
    }

    #[test]
    fn round_trip_preserves_messages_and_order() {
        let tmp = TempDir::new().unwrap();
        for n in [0, 1, 7] {
            let path = tmp.path().join(format!("s{n}.jsonl"));
            let messages = sample_messages(n);

            write_to_file(&path, &messages).unwrap();
            assert_eq!(read_from_file(&path).unwrap(), messages);
        }
    }

    #[test]
    fn round_trip_keeps_tool_blocks() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tools.jsonl");
        let messages = vec![
            Message::assistant("running it").with_content(Content::ToolUse {
                id: "call-1".to_string(),
                name: "shell".to_string(),
                parameters: serde_json::json!({"command": "ls", "args": ["-la"]}),
            }),
            Message::new(
                Role::User,
                vec![Content::ToolResult {
                    tool_use_id: "call-1".to_string(),
                    output: "total 0".to_string(),
                    is_error: false,
                }],
            ),
        ];

        write_to_file(&path, &messages).unwrap();
        assert_eq!(read_from_file(&path).unwrap(), messages);
    }

    #[test]
    fn write_emits_one_line_per_message() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lines.jsonl");
        write_to_file(&path, &sample_messages(3)).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert!(serde_json::from_str::<serde_json::Value>(line).unwrap().is_object());
        }
    }

    #[test]
    fn write_truncates_existing_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("s.jsonl");
        write_to_file(&path, &sample_messages(5)).unwrap();
        write_to_file(&path, &sample_messages(1)).unwrap();

        assert_eq!(read_from_file(&path).unwrap().len(), 1);
    }

    #[test]
    fn read_skips_blank_lines() {
        let tmp = TempDir::new().unwrap();
        let clean = tmp.path().join("clean.jsonl");
        let messages = sample_messages(2);
        write_to_file(&clean, &messages).unwrap();

        let raw = fs::read_to_string(&clean).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        let spaced = tmp.path().join("spaced.jsonl");
        fs::write(
            &spaced,
            format!("\n{}\n   \n\t\n{}\n\n", lines[0], lines[1]),
        )
        .unwrap();

        assert_eq!(read_from_file(&spaced).unwrap(), read_from_file(&clean).unwrap());
    }

    #[test]
    fn read_wraps_json_decode_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jsonl");
        let good = serde_json::to_string(&Message::user("hi").to_value()).unwrap();
        fs::write(&path, format!("{good}\n{{\"role\":\n")).unwrap();

        let err = read_from_file(&path).unwrap_err();
        let message = err.to_string();
        match err {
            SessionError::Decode { line, source, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("JSON decode error"));
                assert!(message.contains(&source.to_string()));
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn read_passes_through_invalid_messages() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partial.jsonl");
        fs::write(&path, "{\"id\":\"m1\",\"created\":1,\"content\":[]}\n").unwrap();

        let err = read_from_file(&path).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidMessage(crate::messages::MessageError::MissingField("role"))
        ));
    }

    #[test]
    fn read_decodes_all_lines_before_rebuilding() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mixed.jsonl");
        fs::write(&path, "{\"id\":\"m1\"}\nnot json\n").unwrap();

        let err = read_from_file(&path).unwrap_err();
        assert!(matches!(err, SessionError::Decode { line: 2, .. }));
    }

    #[test]
    fn read_missing_file_is_io_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = read_from_file(&tmp.path().join("nope.jsonl")).unwrap_err();
        match err {
            SessionError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn list_orders_most_recent_first() {
        let tmp = TempDir::new().unwrap();
        let older = touch(tmp.path(), "a.jsonl", 1_000);
        let newer = touch(tmp.path(), "b.jsonl", 2_000);

        let files = list_sorted_session_files(tmp.path(), SUFFIX).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(files[0].path, newer);
        assert_eq!(files[1].path, older);
        assert!(files[0].modified > files[1].modified);
    }

    #[test]
    fn list_breaks_ties_by_name() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "zeta.jsonl", 5_000);
        touch(tmp.path(), "alpha.jsonl", 5_000);
        touch(tmp.path(), "mid.jsonl", 6_000);

        let names: Vec<String> = list_sorted_session_files(tmp.path(), SUFFIX)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["mid", "alpha", "zeta"]);
    }

    #[test]
    fn list_excludes_other_suffixes_and_directories() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "keep.jsonl", 1_000);
        touch(tmp.path(), "notes.txt", 9_000);
        touch(tmp.path(), "keep.jsonl.bak", 9_000);
        fs::create_dir(tmp.path().join("folder.jsonl")).unwrap();

        let files = list_sorted_session_files(tmp.path(), SUFFIX).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "keep");
    }

    #[test]
    fn list_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let files = list_sorted_session_files(&tmp.path().join("absent"), SUFFIX).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn list_handles_brackets_in_directory_name() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("proj [v2]");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "s.jsonl", 1_000);

        assert_eq!(list_sorted_session_files(&dir, SUFFIX).unwrap().len(), 1);
        assert!(session_file_exists(&dir, SUFFIX));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_directory_is_scanned() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join(OsStr::from_bytes(b"caf\xe9"));
        fs::create_dir(&dir).unwrap();
        touch(&dir, "s.jsonl", 1_000);

        let files = list_sorted_session_files(&dir, SUFFIX).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "s");
        assert_eq!(files[0].path, dir.join("s.jsonl"));
        assert!(session_file_exists(&dir, SUFFIX));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_file_names_are_skipped() {
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let odd = tmp.path().join(OsStr::from_bytes(b"caf\xe9.jsonl"));
        fs::write(&odd, "").unwrap();
        assert!(!session_file_exists(tmp.path(), SUFFIX));

        touch(tmp.path(), "plain.jsonl", 1_000);
        let names: Vec<String> = list_sorted_session_files(tmp.path(), SUFFIX)
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["plain"]);
    }

    #[test]
    fn exists_ignores_directories_named_like_sessions() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("archive.jsonl")).unwrap();
        assert!(!session_file_exists(tmp.path(), SUFFIX));

        touch(tmp.path(), "live.jsonl", 1_000);
        assert!(session_file_exists(tmp.path(), SUFFIX));
    }

    #[test]
    fn exists_is_false_when_directory_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let not_a_dir = touch(tmp.path(), "s.jsonl", 1_000);
        assert!(!session_file_exists(&not_a_dir, SUFFIX));
    }

    #[test]
    fn exists_is_false_for_missing_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(!session_file_exists(&tmp.path().join("absent"), SUFFIX));
    }

    #[test]
    fn exists_ignores_non_session_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "readme.md", 1_000);
        assert!(!session_file_exists(tmp.path(), SUFFIX));

        touch(tmp.path(), "s.jsonl", 1_000);
        assert!(session_file_exists(tmp.path(), SUFFIX));
    }

    #[test]
    fn session_path_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let config = SessionsConfig {
            dir: tmp.path().join("nested").join("sessions"),
            ..SessionsConfig::default()
        };
        assert!(!config.dir.exists());

        let path = session_path(&config, "abc").unwrap();
        assert_eq!(path, config.dir.join("abc.jsonl"));
        assert!(config.dir.is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn session_path_uses_configured_suffix() {
        let tmp = TempDir::new().unwrap();
        let config = SessionsConfig {
            dir: tmp.path().to_path_buf(),
            suffix: ".session".to_string(),
            ..SessionsConfig::default()
        };
        assert_eq!(
            session_path(&config, "abc").unwrap(),
            tmp.path().join("abc.session")
        );
    }
}
