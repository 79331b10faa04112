//! One full run: record, report, assemble, upload.

use std::sync::Arc;

use daylapse_media::CameraDevice;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::commands::run_shell_command;
use crate::config::Settings;
use crate::error::RecorderResult;
use crate::logging::SessionLog;
use crate::metrics;
use crate::report::SessionReport;
use crate::scheduler::{RecordingPlan, RecordingScheduler, SessionSummary};

/// Record one daylight session, then hand the frames to the external tools.
///
/// Video and upload command failures are logged and do not fail the run.
pub async fn record_and_publish(
    settings: &Settings,
    camera: Box<dyn CameraDevice>,
    clock: Arc<dyn Clock>,
    log: &SessionLog,
) -> RecorderResult<SessionSummary> {
    let mut scheduler = RecordingScheduler::new(
        RecordingPlan::from_settings(settings),
        Arc::clone(&clock),
        log,
    );
    let summary = scheduler.run(camera).await?;

    let report = SessionReport::new(settings, &summary);
    report
        .write(&settings.report_file, &settings.report_keys())
        .await?;
    log.event_at(
        &clock.now(),
        &format!("Wrote report to {}", settings.report_file.display()),
    );

    publish(
        log,
        clock.as_ref(),
        "video",
        &format!("Creating video with command '{}'", settings.create_video_command),
        &settings.create_video_command,
    )
    .await;
    publish(
        log,
        clock.as_ref(),
        "upload",
        &format!("Uploading video with command '{}'", settings.upload_video_command),
        &settings.upload_video_command,
    )
    .await;

    info!(frames = summary.frames_captured, "Run complete");
    Ok(summary)
}

async fn publish(log: &SessionLog, clock: &dyn Clock, stage: &str, message: &str, command: &str) {
    log.event_at(&clock.now(), message);
    match run_shell_command(command).await {
        Ok(Some(status)) if !status.success() => metrics::record_command_failure(stage),
        Ok(_) => {}
        Err(e) => {
            warn!("Failed to run {} command: {}", stage, e);
            metrics::record_command_failure(stage);
        }
    }
}
