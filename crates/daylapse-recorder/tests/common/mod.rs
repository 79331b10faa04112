//! Shared fakes for the recorder integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use daylapse_media::{CameraDevice, Frame, MediaError, MediaResult};
use daylapse_models::Resolution;
use daylapse_recorder::{Clock, Settings};

/// Clock that only moves when slept on or advanced by hand.
pub struct FakeClock {
    now: Mutex<DateTime<FixedOffset>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn at(hour: u32, minute: u32) -> Arc<Self> {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 1, hour, minute, 0)
            .unwrap();
        Arc::new(Self {
            now: Mutex::new(now),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(duration).unwrap();
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        self.advance(duration);
    }
}

/// Call counters shared between a fake camera and its test.
#[derive(Default)]
pub struct CameraCalls {
    pub inits: AtomicUsize,
    pub captures: AtomicUsize,
    pub shutdowns: AtomicUsize,
}

impl CameraCalls {
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

/// Camera returning a fixed-colour frame.
pub struct FakeCamera {
    pub calls: Arc<CameraCalls>,
    clock: Arc<FakeClock>,
    resolution: Resolution,
    /// Time each capture takes on the fake clock
    capture_cost: Duration,
    /// 1-based capture calls that fail
    failing_calls: Vec<usize>,
    fail_init: bool,
}

impl FakeCamera {
    pub fn new(clock: Arc<FakeClock>) -> Self {
        Self {
            calls: Arc::new(CameraCalls::default()),
            clock,
            resolution: Resolution::new(8, 6),
            capture_cost: Duration::ZERO,
            failing_calls: Vec::new(),
            fail_init: false,
        }
    }

    pub fn with_capture_cost(mut self, cost: Duration) -> Self {
        self.capture_cost = cost;
        self
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.failing_calls.push(call);
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }
}

#[async_trait]
impl CameraDevice for FakeCamera {
    fn name(&self) -> &str {
        "fake"
    }

    fn implementation(&self) -> &'static str {
        "Fixed colour"
    }

    async fn init(&mut self, resolution: Resolution) -> MediaResult<()> {
        self.calls.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(MediaError::device_init("sensor unplugged"));
        }
        self.resolution = resolution;
        Ok(())
    }

    async fn capture(&mut self) -> MediaResult<Frame> {
        let call = self.calls.captures.fetch_add(1, Ordering::SeqCst) + 1;
        self.clock.advance(self.capture_cost);
        if self.failing_calls.contains(&call) {
            return Err(MediaError::capture(format!("capture {} failed", call)));
        }
        Ok(Frame::filled(self.resolution, [40, 120, 200]))
    }

    async fn shutdown(&mut self) -> MediaResult<()> {
        self.calls.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Settings writing frames into `dir`, recording between the given hours.
pub fn settings_in(dir: &Path, start_hour: f64, end_hour: f64) -> Settings {
    let json = format!(
        r#"{{
            "width": 8,
            "height": 6,
            "frameRate": 1,
            "timeScale": 60,
            "latitude": 52.52,
            "longitude": 13.405,
            "dawnBufferMinutes": 0,
            "duskBufferMinutes": 0,
            "imageTemplate": "{frames}/frame_%d.png",
            "logFormat": "[{{time}}] {{message}}",
            "createVideoCommand": "touch {dir}/video.mp4",
            "uploadVideoCommand": "exit 7",
            "reportFile": "{dir}/report.txt",
            "device": "Test rig",
            "fixedWindow": {{"startHour": {start}, "endHour": {end}}}
        }}"#,
        frames = dir.join("frames").display(),
        dir = dir.display(),
        start = start_hour,
        end = end_hour,
    );
    Settings::from_json(&json).unwrap()
}

pub fn frame_path(dir: &Path, index: u64) -> std::path::PathBuf {
    dir.join("frames").join(format!("frame_{}.png", index))
}
