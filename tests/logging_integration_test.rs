use std::fs;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use tempfile::TempDir;
use wan_bootstrap::log_collector::backup_path;
use wan_bootstrap::{log_parsed, LogCollector, RotationPolicy};

fn single_log(dir: &Path) -> PathBuf {
    let files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("Failed to read log dir")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "log"))
        .collect();
    assert_eq!(files.len(), 1, "expected exactly one log in {}", dir.display());
    files.into_iter().next().unwrap()
}

/// Full and parsed streams after an explicit flush.
///
/// Tests that:
/// 1. Both session files exist under `full/` and `parsed/`
/// 2. Every line reaches the full log
/// 3. Only milestone lines reach the parsed log
/// 4. `wait_for_empty` makes the writes visible without sleeping
#[test]
fn test_full_and_parsed_streams() {
    let temp_dir = TempDir::new().unwrap();
    let collector = LogCollector::new(temp_dir.path(), LevelFilter::Info, RotationPolicy::default())
        .expect("Failed to initialize LogCollector")
        .without_console();

    collector.log_str("Downloading Wan-AI/Wan2.2-Animate-14B to ./Wan2.2-Animate-14B");
    collector.log_parsed("Downloaded Wan-AI/Wan2.2-Animate-14B");
    collector.wait_for_empty().expect("flush failed");

    let full = fs::read_to_string(single_log(&temp_dir.path().join("full"))).unwrap();
    let parsed = fs::read_to_string(single_log(&temp_dir.path().join("parsed"))).unwrap();

    assert!(full.contains("[INFO] Downloading Wan-AI/Wan2.2-Animate-14B"));
    assert!(full.contains("[INFO] Downloaded Wan-AI/Wan2.2-Animate-14B"));
    assert!(!parsed.contains("Downloading"));
    assert!(parsed.contains("Downloaded Wan-AI/Wan2.2-Animate-14B"));

    let first = full.lines().next().unwrap();
    assert!(first.starts_with('['), "missing timestamp: {}", first);
}

#[test]
fn test_rotation_through_collector() {
    let temp_dir = TempDir::new().unwrap();
    let rotation = RotationPolicy {
        max_bytes: 256,
        backups: 2,
    };
    let collector = LogCollector::new(temp_dir.path(), LevelFilter::Info, rotation)
        .unwrap()
        .without_console();

    for i in 0..64 {
        collector.log_str(format!("progress line {:03}", i));
    }
    collector.wait_for_empty().unwrap();

    let session = collector.session_log_path().unwrap().to_path_buf();
    assert!(fs::metadata(&session).unwrap().len() <= 256);
    assert!(backup_path(&session, 1).exists());
    assert!(backup_path(&session, 2).exists());
    assert!(!backup_path(&session, 3).exists());

    let newest = fs::read_to_string(&session).unwrap();
    assert!(newest.contains("progress line 063"));
}

#[test]
fn test_unwritable_log_dir_reported() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();

    let result = LogCollector::new(&blocker, LevelFilter::Info, RotationPolicy::default());
    assert!(result.is_err());
}

/// The only test in this binary that installs the global logger.
#[test]
fn test_global_logger_routes_macros() {
    let temp_dir = TempDir::new().unwrap();
    let collector = LogCollector::new(temp_dir.path(), LevelFilter::Info, RotationPolicy::default())
        .unwrap()
        .without_console();
    collector.install().expect("logger already installed");

    log::debug!("filtered out at info level");
    log::warn!("relocation target already populated");
    log_parsed!("Hub login succeeded");
    log::logger().flush();

    let full = fs::read_to_string(single_log(&temp_dir.path().join("full"))).unwrap();
    let parsed = fs::read_to_string(single_log(&temp_dir.path().join("parsed"))).unwrap();

    assert!(!full.contains("filtered out"));
    assert!(full.contains("[WARN] relocation target already populated"));
    assert!(parsed.contains("[INFO] Hub login succeeded"));
    assert!(!parsed.contains("relocation target"));
}
