//! Daylight time-lapse recorder binary.

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use daylapse_media::{create_camera, create_sensor};
use daylapse_recorder::metrics::install_exporter;
use daylapse_recorder::{
    record_and_publish, LogFormat, RuntimeConfig, SessionLog, Settings, SystemClock,
};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = RuntimeConfig::from_env().with_args(std::env::args().skip(1));
    init_tracing(config.json_logs);

    info!("Starting daylapse");
    info!("Runtime config: {:?}", config);

    if let Err(e) = run(config).await {
        error!("Recording failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: RuntimeConfig) -> anyhow::Result<()> {
    if let Some(port) = config.metrics_port {
        install_exporter(port)?;
        info!("Metrics listening on port {}", port);
    }

    // Settings errors abort before any hardware is touched
    let settings = Settings::load(&config.settings_path)
        .await
        .with_context(|| format!("loading {}", config.settings_path.display()))?;

    let log = SessionLog::create(&config.log_file, LogFormat::new(settings.log_format.clone()))
        .with_context(|| format!("opening session log {}", config.log_file.display()))?;

    let sensor = create_sensor(&settings.sensor).context("selecting sensor")?;
    let camera = create_camera(settings.capture_mode, sensor, settings.fusion.clone());
    info!(
        device = %settings.device,
        mode = %settings.capture_mode,
        "Using sensor {}",
        camera.name()
    );

    let summary = record_and_publish(&settings, camera, Arc::new(SystemClock), &log).await?;
    info!(
        frames = summary.frames_captured,
        sensor = %summary.sensor,
        "Session finished"
    );
    Ok(())
}

fn init_tracing(use_json: bool) {
    let env_filter = EnvFilter::from_default_env().add_directive(
        "daylapse=info"
            .parse()
            .unwrap_or_else(|_| LevelFilter::INFO.into()),
    );

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}
