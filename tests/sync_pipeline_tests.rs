use reel_sync::dedupe::QuarantineOutcome;
use reel_sync::{AppConfig, Error, SilentReporter, SyncOrchestrator};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write_file(path: &Path, size: usize) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, vec![0u8; size]).unwrap();
}

/// remote/2024/Michael 2024 holds a clip, its slightly larger edit and a
/// birthday video the local side already has.
fn setup() -> (TempDir, AppConfig) {
    let dir = tempdir().unwrap();
    let remote = dir.path().join("remote");
    let local = dir.path().join("local");
    let michael = remote.join("2024").join("Michael 2024");

    write_file(&michael.join("clip.mp4"), 2_000_000);
    write_file(&michael.join("clip_edited.mp4"), 2_000_040);
    write_file(&michael.join("bday.mp4"), 1_000);
    write_file(&michael.join("notes.txt"), 10);
    write_file(&local.join("2024").join("Michael 2024").join("bday.mp4"), 1_000);

    let config = AppConfig::new(remote, local);
    (dir, config)
}

fn michael_local(config: &AppConfig) -> PathBuf {
    config.local_root.join("2024").join("Michael 2024")
}

#[test]
fn test_apply_quarantines_loser_and_copies_keeper() {
    let (_dir, config) = setup();
    let remote_michael = config.remote_root.join("2024").join("Michael 2024");
    let quarantined = config
        .quarantine_root()
        .join("2024")
        .join("Michael 2024")
        .join("clip.mp4");

    let summary = SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();

    assert!(summary.failures.is_empty());
    assert_eq!(summary.copied(), 1);
    assert_eq!(summary.demoted(), 1);

    assert!(!remote_michael.join("clip.mp4").exists());
    assert_eq!(fs::metadata(&quarantined).unwrap().len(), 2_000_000);

    let local = michael_local(&config);
    assert!(local.join("clip_edited.mp4").exists());
    assert!(!local.join("clip.mp4").exists());
    assert!(!local.join("notes.txt").exists());

    let person = &summary.persons[0];
    assert_eq!(person.person_name, "Michael");
    assert_eq!(person.folder_name, "Michael 2024");
}

#[test]
fn test_existing_destination_file_is_not_rewritten() {
    let (_dir, config) = setup();
    let bday = michael_local(&config).join("bday.mp4");
    fs::write(&bday, b"local edit").unwrap();

    SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();

    assert_eq!(fs::read(&bday).unwrap(), b"local edit");
}

#[test]
fn test_second_pass_changes_nothing() {
    let (_dir, config) = setup();
    let orchestrator = SyncOrchestrator::new(config.clone(), false);
    orchestrator.run(None, &SilentReporter).unwrap();

    let second = orchestrator.run(None, &SilentReporter).unwrap();
    assert_eq!(second.copied(), 0);
    assert_eq!(second.demoted(), 0);
    assert_eq!(second.copy_lines, vec!["1 folder(s) already up to date"]);
}

#[test]
fn test_dry_run_reports_plan_without_touching_disk() {
    let (_dir, config) = setup();
    let summary = SyncOrchestrator::new(config.clone(), true)
        .run(None, &SilentReporter)
        .unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.copied(), 1);
    assert!(matches!(
        summary.persons[0].quarantine[0],
        QuarantineOutcome::WouldMove { .. }
    ));
    assert!(config
        .remote_root
        .join("2024")
        .join("Michael 2024")
        .join("clip.mp4")
        .exists());
    assert!(!config.quarantine_root().exists());
    assert!(!michael_local(&config).join("clip_edited.mp4").exists());
}

#[test]
fn test_quarantined_name_is_not_copied_back() {
    let (_dir, config) = setup();
    let anna = config.remote_root.join("2024").join("Anna 2024");
    write_file(&anna.join("intro.mp4"), 500);
    write_file(
        &config
            .quarantine_root()
            .join("2024")
            .join("Anna 2024")
            .join("INTRO.MP4"),
        500,
    );

    let summary = SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();

    let anna_local = config.local_root.join("2024").join("Anna 2024");
    assert!(!anna_local.join("intro.mp4").exists());
    assert!(summary.missing_destinations.contains(&anna_local));
}

#[test]
fn test_missing_destination_with_nothing_to_copy_is_not_created() {
    let (_dir, config) = setup();
    let anna = config.remote_root.join("2024").join("Anna 2024");
    write_file(&anna.join("intro.mp4"), 500);
    write_file(
        &config
            .quarantine_root()
            .join("2024")
            .join("Anna 2024")
            .join("intro.mp4"),
        500,
    );

    let summary = SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();

    let anna_local = config.local_root.join("2024").join("Anna 2024");
    assert_eq!(summary.missing_destinations, vec![anna_local.clone()]);
    assert!(summary.created_destinations.is_empty());
    assert!(!anna_local.exists());
}

#[test]
fn test_missing_destination_is_created_on_apply() {
    let (_dir, config) = setup();
    write_file(
        &config.remote_root.join("2024").join("Anna 2024").join("a.mp4"),
        100,
    );

    let summary = SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();

    let anna_local = config.local_root.join("2024").join("Anna 2024");
    assert_eq!(summary.missing_destinations, vec![anna_local.clone()]);
    assert_eq!(summary.created_destinations, vec![anna_local.clone()]);
    assert!(anna_local.join("a.mp4").exists());
}

#[test]
fn test_broken_shortcut_does_not_stop_the_pass() {
    let (_dir, config) = setup();
    let year = config.remote_root.join("2024");
    fs::write(year.join("Broken 2024.lnk"), b"junk").unwrap();

    let summary = SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].folder_name, "Broken 2024");
    assert_eq!(summary.copied(), 1);
}

#[cfg(unix)]
#[test]
fn test_symlinked_person_folder_is_followed() {
    let (dir, config) = setup();
    let elsewhere = dir.path().join("shared").join("Zoe");
    write_file(&elsewhere.join("zoe.mp4"), 300);
    std::os::unix::fs::symlink(&elsewhere, config.remote_root.join("2024").join("Zoe 2024"))
        .unwrap();

    SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();

    assert!(config
        .local_root
        .join("2024")
        .join("Zoe 2024")
        .join("zoe.mp4")
        .exists());
}

#[cfg(unix)]
#[test]
fn test_demoted_file_behind_symlink_is_not_copied_back() {
    let (dir, config) = setup();
    let elsewhere = dir.path().join("shared").join("Zoe");
    write_file(&elsewhere.join("zoe.mp4"), 1_000);
    write_file(&elsewhere.join("zoe_edit.mp4"), 1_010);
    std::os::unix::fs::symlink(&elsewhere, config.remote_root.join("2024").join("Zoe 2024"))
        .unwrap();
    let zoe_local = config.local_root.join("2024").join("Zoe 2024");

    let first = SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();
    let zoe = first
        .persons
        .iter()
        .find(|p| p.folder_name == "Zoe 2024")
        .unwrap();
    assert_eq!(zoe.demoted(), 1);
    assert_eq!(zoe.copied, 1);
    assert!(zoe_local.join("zoe_edit.mp4").exists());
    assert!(!elsewhere.join("zoe.mp4").exists());

    // The demoted name shows up again and its keeper is gone.
    write_file(&elsewhere.join("zoe.mp4"), 1_000);
    fs::remove_file(elsewhere.join("zoe_edit.mp4")).unwrap();

    let second = SyncOrchestrator::new(config.clone(), false)
        .run(None, &SilentReporter)
        .unwrap();
    let zoe = second
        .persons
        .iter()
        .find(|p| p.folder_name == "Zoe 2024")
        .unwrap();
    assert_eq!(zoe.copied, 0);
    assert!(!zoe_local.join("zoe.mp4").exists());
}

#[test]
fn test_year_filter_limits_the_pass() {
    let (_dir, config) = setup();
    write_file(
        &config.remote_root.join("2023").join("Bob 2023").join("b.mp4"),
        100,
    );

    let summary = SyncOrchestrator::new(config.clone(), false)
        .run(Some(2023), &SilentReporter)
        .unwrap();

    assert_eq!(summary.persons.len(), 1);
    assert_eq!(summary.persons[0].year, 2023);
    assert!(!michael_local(&config).join("clip_edited.mp4").exists());
}

#[test]
fn test_unmounted_mirror_aborts_before_any_write() {
    let dir = tempdir().unwrap();
    let config = AppConfig::new(dir.path().join("not-mounted"), dir.path().join("local"));

    let result = SyncOrchestrator::new(config.clone(), false).run(None, &SilentReporter);

    assert!(matches!(result, Err(Error::MirrorUnavailable(_))));
    assert!(!config.local_root.exists());
}
