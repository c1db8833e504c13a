//! 用 shell 脚本模拟 winget 的测试夹具
#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use winget_pilot::config::ProgressConfig;
use winget_pilot::events::{Event, EventReceiver};
use winget_pilot::Config;

const FAKE_WINGET: &str = r#"#!/bin/sh
echo "$*" >> "$(dirname "$0")/calls.log"
case "$1" in
search)
  case "$3" in
    nothing) echo "No package found matching input criteria."; exit 1 ;;
  esac
  printf '   - \r   \\ \r'
  printf 'Name              Id                 Version  Source\r\n'
  printf '%s\r\n' '-----------------------------------------------------'
  printf 'Mozilla Firefox   Mozilla.Firefox    131.0.3  winget\r\n'
  printf 'Mozilla Firefox   9NZVDKPMR9RD       Unknown  msstore\r\n'
  ;;
show)
  case "$3" in
    Git.Git)
      printf 'Found Git [Git.Git]\nVersion: 2.47.0\nDescription:\n  Git is a free and open source\n  distributed version control system.\nHomepage: https://git-scm.com/\n'
      ;;
    *) printf 'Found %s\nVersion: 1.0\n' "$3" ;;
  esac
  ;;
install)
  case "$3" in
    Good.*) echo "Found $3"; echo "Downloading"; sleep 0.2; echo "Successfully installed"; exit 0 ;;
    Slow.*) echo "first"; sleep 0.5; echo "second"; exit 0 ;;
    Bad.*) echo "Installer failed with exit code: 1603" >&2; exit 3 ;;
    Quiet.*) exit 1 ;;
    *) echo "Successfully installed"; exit 0 ;;
  esac
  ;;
esac
"#;

struct Fixture {
    _dir: tempfile::TempDir,
    script: PathBuf,
}

/// 脚本只写一次，写完关闭后才会被任何测试执行（避免 ETXTBSY）
fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("winget");
        fs::write(&script, FAKE_WINGET).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        Fixture { _dir: dir, script }
    })
}

pub fn script_path() -> &'static Path {
    &fixture().script
}

pub fn config() -> Config {
    Config {
        command: script_path().to_string_lossy().into_owned(),
        progress: ProgressConfig {
            interval_ms: 20,
            step: 5,
            ceiling: 95,
        },
        ..Config::default()
    }
}

/// 调用记录里包含 `needle` 的行
pub fn calls_matching(needle: &str) -> Vec<String> {
    let log = script_path().with_file_name("calls.log");
    fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .filter(|l| l.contains(needle))
        .map(String::from)
        .collect()
}

pub fn collect(mut rx: EventReceiver) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = rx.blocking_recv() {
        events.push(event);
    }
    events
}

pub fn logs_of(events: &[Event], job: usize) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Log { job: j, line } if *j == job => Some(line.as_str()),
            _ => None,
        })
        .collect()
}

pub fn progress_of(events: &[Event], job: usize) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { job: j, percent } if *j == job => Some(*percent),
            _ => None,
        })
        .collect()
}
