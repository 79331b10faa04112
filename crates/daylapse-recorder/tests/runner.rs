//! Full run: recording, report and post-recording commands.

mod common;

use daylapse_models::ReportKey;
use daylapse_recorder::{record_and_publish, LogFormat, SessionLog};

use common::{settings_in, FakeCamera, FakeClock};

#[tokio::test]
async fn test_run_writes_report_and_runs_commands() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = settings_in(dir.path(), 6.0, 6.5);
    settings.report_keys = Some(vec![
        "device".to_string(),
        "frameCount".to_string(),
        "moonPhase".to_string(),
    ]);
    let clock = FakeClock::at(6, 0);
    let camera = FakeCamera::new(clock.clone());
    let calls = camera.calls.clone();

    let log_path = dir.path().join("auto_record.log");
    let log = SessionLog::create(&log_path, LogFormat::new(settings.log_format.clone())).unwrap();

    // The failing upload command does not fail the run
    let summary = record_and_publish(&settings, Box::new(camera), clock.clone(), &log)
        .await
        .unwrap();

    assert_eq!(summary.frames_captured, 30);
    assert_eq!(calls.shutdowns(), 1);
    assert!(dir.path().join("video.mp4").exists());

    let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
    assert_eq!(report, "Device: Test rig\nFrames: 30\n");
    assert_eq!(settings.report_keys(), vec![ReportKey::Device, ReportKey::FrameCount]);

    let log_text = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = log_text.lines().collect();
    assert!(lines[0].starts_with("[2024-06-01 06:00:00"));
    assert!(lines.iter().any(|l| l.ends_with("Starting recording session")));
    assert!(lines.iter().any(|l| l.ends_with("Ending recording session")));
    assert!(lines
        .iter()
        .any(|l| l.contains("Creating video with command 'touch ")));
    assert!(lines
        .iter()
        .any(|l| l.ends_with("Uploading video with command 'exit 7'")));
}

#[tokio::test]
async fn test_failed_session_skips_publishing() {
    let dir = tempfile::tempdir().unwrap();
    let settings = settings_in(dir.path(), 6.0, 6.5);
    let clock = FakeClock::at(6, 0);
    let camera = FakeCamera::new(clock.clone()).failing_on(1);
    let log = SessionLog::discard(LogFormat::default());

    let result = record_and_publish(&settings, Box::new(camera), clock.clone(), &log).await;

    assert!(result.is_err());
    assert!(!dir.path().join("report.txt").exists());
    assert!(!dir.path().join("video.mp4").exists());
}
