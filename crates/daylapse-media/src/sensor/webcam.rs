//! Sensor backend for USB webcams using nokhwa.
//!
//! nokhwa cameras are not `Send`, so the device lives on a dedicated thread
//! and the async side talks to it over a request channel.

use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use async_trait::async_trait;
use daylapse_models::Resolution;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{ExposureSettings, StillSensor};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

enum Request {
    Grab(oneshot::Sender<MediaResult<Frame>>),
    Close,
}

struct Worker {
    requests: mpsc::Sender<Request>,
    handle: JoinHandle<()>,
}

/// Still sensor backed by a webcam at a device index.
///
/// Webcams run with automatic exposure; manual settings are ignored and
/// the sensor cannot report a metered exposure time.
pub struct WebcamSensor {
    index: u32,
    name: String,
    worker: Option<Worker>,
}

impl WebcamSensor {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            name: format!("webcam {}", index),
            worker: None,
        }
    }

    /// List available webcam devices.
    pub fn list_devices() -> MediaResult<Vec<String>> {
        let devices = nokhwa::query(ApiBackend::Auto)
            .map_err(|e| MediaError::SensorNotFound(e.to_string()))?;

        Ok(devices
            .into_iter()
            .map(|info| format!("{}: {}", info.index(), info.human_name()))
            .collect())
    }

    fn worker(&self) -> MediaResult<&Worker> {
        self.worker.as_ref().ok_or(MediaError::NotInitialized)
    }
}

fn open_camera(index: u32) -> MediaResult<Camera> {
    let requested =
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
    let mut camera = Camera::new(CameraIndex::Index(index), requested)
        .map_err(|e| MediaError::device_init(e.to_string()))?;
    camera
        .open_stream()
        .map_err(|e| MediaError::device_init(e.to_string()))?;
    Ok(camera)
}

fn read_frame(camera: &mut Camera) -> MediaResult<Frame> {
    let buffer = camera
        .frame()
        .map_err(|e| MediaError::capture(e.to_string()))?;
    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| MediaError::capture(e.to_string()))?;

    let resolution = Resolution::new(decoded.width(), decoded.height());
    Frame::from_raw(resolution, decoded.into_raw())
}

/// Device thread: opens the camera, then serves grabs until closed.
fn serve(
    index: u32,
    ready: oneshot::Sender<MediaResult<Resolution>>,
    requests: mpsc::Receiver<Request>,
) {
    let mut camera = match open_camera(index) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let native = camera.resolution();
    let _ = ready.send(Ok(Resolution::new(native.width(), native.height())));

    while let Ok(request) = requests.recv() {
        match request {
            Request::Grab(reply) => {
                let _ = reply.send(read_frame(&mut camera));
            }
            Request::Close => break,
        }
    }

    if let Err(e) = camera.stop_stream() {
        warn!("Failed to stop webcam {} stream: {}", index, e);
    }
}

#[async_trait]
impl StillSensor for WebcamSensor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&mut self, resolution: Resolution) -> MediaResult<()> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (requests, receiver) = mpsc::channel();
        let (ready, opened) = oneshot::channel();
        let index = self.index;
        let handle = std::thread::Builder::new()
            .name(format!("webcam-{}", index))
            .spawn(move || serve(index, ready, receiver))?;

        let native = match opened.await {
            Ok(Ok(native)) => native,
            Ok(Err(e)) => {
                let _ = handle.join();
                let available = Self::list_devices().unwrap_or_default();
                return Err(MediaError::device_init(format!(
                    "cannot open {}: {} (available: [{}])",
                    self.name,
                    e,
                    available.join(", ")
                )));
            }
            Err(_) => return Err(MediaError::device_init("webcam thread exited")),
        };

        info!(
            "Opened {} at {} (requested {}, frames are shaped afterwards)",
            self.name, native, resolution
        );
        self.worker = Some(Worker { requests, handle });
        Ok(())
    }

    async fn grab(&mut self, exposure: &ExposureSettings) -> MediaResult<Frame> {
        if exposure.is_manual() {
            debug!("{} ignores manual exposure settings", self.name);
        }

        let (reply, frame) = oneshot::channel();
        self.worker()?
            .requests
            .send(Request::Grab(reply))
            .map_err(|_| MediaError::capture("webcam thread is gone"))?;
        frame
            .await
            .map_err(|_| MediaError::capture("webcam thread dropped the request"))?
    }

    async fn metered_exposure(&mut self) -> MediaResult<Duration> {
        Err(MediaError::capture(format!(
            "{} does not report exposure time",
            self.name
        )))
    }

    fn supports_metering(&self) -> bool {
        false
    }

    async fn close(&mut self) -> MediaResult<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let _ = worker.requests.send(Request::Close);
        tokio::task::spawn_blocking(move || worker.handle.join())
            .await
            .map_err(|e| MediaError::internal(format!("webcam join failed: {}", e)))?
            .map_err(|_| MediaError::internal("webcam thread panicked"))?;

        info!("Closed {}", self.name);
        Ok(())
    }
}

impl Drop for WebcamSensor {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.requests.send(Request::Close);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grab_requires_open() {
        let mut sensor = WebcamSensor::new(3);
        let err = sensor.grab(&ExposureSettings::auto()).await.unwrap_err();

        assert!(matches!(err, MediaError::NotInitialized));
        assert_eq!(sensor.name(), "webcam 3");
        assert!(!sensor.supports_metering());
    }

    #[tokio::test]
    async fn test_close_without_open_is_noop() {
        let mut sensor = WebcamSensor::new(0);
        assert!(sensor.close().await.is_ok());
        assert!(sensor.metered_exposure().await.is_err());
    }
}
