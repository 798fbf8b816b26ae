use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use scroll_shooter::best_times::BestTimes;
use scroll_shooter::error::GameError;
use scroll_shooter::services::BestTimeStore;

fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "scroll_shooter_{}_{}.json",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

// ── Recording ─────────────────────────────────────────────────────────────────

#[test]
fn first_time_is_always_a_record() {
    let mut store = BestTimes::in_memory();
    assert_eq!(store.best_time("Outskirts"), None);
    assert!(store.record_time("Outskirts", secs(40)));
    assert_eq!(store.best_time("Outskirts"), Some(secs(40)));
}

#[test]
fn only_strict_improvements_replace_the_record() {
    let mut store = BestTimes::in_memory();
    store.record_time("Harbor", secs(60));
    assert!(!store.record_time("Harbor", secs(60)));
    assert!(!store.record_time("Harbor", secs(61)));
    assert!(store.record_time("Harbor", secs(59)));
    assert_eq!(store.best_time("Harbor"), Some(secs(59)));
}

#[test]
fn levels_are_tracked_independently() {
    let mut store = BestTimes::in_memory();
    store.record_time("Outskirts", secs(30));
    store.record_time("Citadel", secs(90));
    assert_eq!(
        store.entries(),
        vec![
            ("Citadel".to_string(), secs(90)),
            ("Outskirts".to_string(), secs(30)),
        ]
    );
}

// ── Loading ───────────────────────────────────────────────────────────────────

#[test]
fn malformed_entries_are_skipped_individually() {
    let path = temp_path("malformed");
    std::fs::write(
        &path,
        r#"{"entries":[
            {"level":"Outskirts","millis":41250},
            {"level":7},
            {"level":"","millis":5},
            "garbage",
            {"level":"Harbor","millis":60000}
        ]}"#,
    )
    .unwrap();

    let store = BestTimes::load(&path).unwrap();
    assert_eq!(store.best_time("Outskirts"), Some(Duration::from_millis(41_250)));
    assert_eq!(store.best_time("Harbor"), Some(secs(60)));
    assert_eq!(store.entries().len(), 2);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn duplicate_entries_keep_the_fastest() {
    let path = temp_path("duplicates");
    std::fs::write(
        &path,
        r#"{"entries":[{"level":"Citadel","millis":90000},{"level":"Citadel","millis":85000}]}"#,
    )
    .unwrap();

    let store = BestTimes::load(&path).unwrap();
    assert_eq!(store.best_time("Citadel"), Some(secs(85)));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn unusable_files_are_errors() {
    let path = temp_path("not_json");
    std::fs::write(&path, "not json at all").unwrap();
    assert!(matches!(BestTimes::load(&path), Err(GameError::Persistence(_))));

    std::fs::write(&path, r#"{"records":[]}"#).unwrap();
    assert!(matches!(BestTimes::load(&path), Err(GameError::Persistence(_))));
    let _ = std::fs::remove_file(&path);

    let missing = temp_path("missing");
    assert!(matches!(BestTimes::load(&missing), Err(GameError::Io(_))));
}

#[test]
fn open_on_a_missing_file_starts_empty() {
    let path = temp_path("open_missing");
    let store = BestTimes::open(path);
    assert!(store.entries().is_empty());
}

#[test]
fn open_on_a_corrupt_file_starts_empty() {
    let path = temp_path("open_corrupt");
    std::fs::write(&path, "{").unwrap();
    let store = BestTimes::open(path.clone());
    assert!(store.entries().is_empty());
    let _ = std::fs::remove_file(&path);
}

// ── Saving ────────────────────────────────────────────────────────────────────

#[test]
fn save_then_load_keeps_records() {
    let path = temp_path("save");
    let mut store = BestTimes::in_memory();
    store.record_time("Outskirts", Duration::from_millis(41_250));
    store.record_time("Harbor", secs(70));
    store.save_to(&path).unwrap();

    let loaded = BestTimes::load(&path).unwrap();
    assert_eq!(loaded.entries(), store.entries());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn opened_store_writes_improvements_in_the_background() {
    let path = temp_path("background");
    let mut store = BestTimes::open(path.clone());
    assert!(store.record_time("Outskirts", secs(33)));

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut loaded = None;
    while Instant::now() < deadline {
        if let Ok(s) = BestTimes::load(&path) {
            if s.best_time("Outskirts").is_some() {
                loaded = Some(s);
                break;
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
    let loaded = loaded.expect("best times were never written");
    assert_eq!(loaded.best_time("Outskirts"), Some(secs(33)));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn dropping_the_store_flushes_pending_writes() {
    let path = temp_path("flush_on_drop");
    let mut store = BestTimes::open(path.clone());
    assert!(store.record_time("Harbor", secs(50)));
    assert!(store.record_time("Harbor", secs(45)));
    drop(store);

    let loaded = BestTimes::load(&path).unwrap();
    assert_eq!(loaded.best_time("Harbor"), Some(secs(45)));
    let _ = std::fs::remove_file(&path);
}
