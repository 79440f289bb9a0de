use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::camera::domain::camera::{Camera, CameraError};
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

type ReadResult = Result<Option<Frame>, CameraError>;

/// Decorator that bounds how long a single `read` may block.
///
/// After a successful `open` the inner camera moves to a worker thread that
/// performs one read per request. The caller waits at most `max_wait` for
/// the answer. A timed-out worker is abandoned: it releases the inner camera
/// if its pending read ever returns, and this camera reports `NotOpened`
/// from then on.
pub struct TimeoutCamera {
    inner: Option<Box<dyn Camera>>,
    max_wait: Duration,
    worker: Option<Worker>,
}

struct Worker {
    requests: Sender<()>,
    responses: Receiver<ReadResult>,
    handle: JoinHandle<()>,
}

impl TimeoutCamera {
    pub fn new(inner: Box<dyn Camera>, max_wait: Duration) -> Self {
        Self {
            inner: Some(inner),
            max_wait,
            worker: None,
        }
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }
}

fn spawn_worker(mut camera: Box<dyn Camera>) -> Worker {
    let (request_tx, request_rx) = crossbeam_channel::bounded::<()>(1);
    let (response_tx, response_rx) = crossbeam_channel::bounded::<ReadResult>(1);
    let handle = std::thread::spawn(move || {
        for () in request_rx {
            if response_tx.send(camera.read()).is_err() {
                break;
            }
        }
        camera.release();
    });
    Worker {
        requests: request_tx,
        responses: response_rx,
        handle,
    }
}

impl Camera for TimeoutCamera {
    fn open(&mut self, device: &str) -> Result<StreamInfo, CameraError> {
        let camera = self.inner.as_mut().ok_or_else(|| CameraError::Open {
            device: device.to_string(),
            message: "camera was already handed to a capture worker".to_string(),
        })?;
        let info = camera.open(device)?;
        if let Some(camera) = self.inner.take() {
            self.worker = Some(spawn_worker(camera));
        }
        Ok(info)
    }

    fn read(&mut self) -> Result<Option<Frame>, CameraError> {
        let worker = self.worker.as_ref().ok_or(CameraError::NotOpened)?;
        if worker.requests.send(()).is_err() {
            return Err(CameraError::Read("capture worker stopped".to_string()));
        }
        match worker.responses.recv_timeout(self.max_wait) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("No frame within {:?}; abandoning capture worker", self.max_wait);
                // Dropping the channels lets the worker release the camera
                // once its blocked read returns.
                self.worker = None;
                Err(CameraError::Timeout(self.max_wait))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(CameraError::Read("capture worker stopped".to_string()))
            }
        }
    }

    fn release(&mut self) {
        if let Some(worker) = self.worker.take() {
            drop(worker.requests);
            if worker.handle.join().is_err() {
                log::error!("Capture worker panicked");
            }
        }
        if let Some(mut camera) = self.inner.take() {
            camera.release();
        }
    }
}
