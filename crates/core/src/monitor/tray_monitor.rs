use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::camera::domain::camera::{Camera, CameraError};
use crate::camera::domain::camera_session::CameraSession;
use crate::detection::domain::region_detector::{DetectError, RegionDetector};
use crate::monitor::frame_report::{FrameReport, RegionReport};
use crate::monitor::monitor_config::MonitorConfig;
use crate::monitor::monitor_logger::{MonitorLogger, NullMonitorLogger};
use crate::monitor::presenter::Presenter;
use crate::shared::frame::Frame;
use crate::shared::region::RegionSpec;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(#[source] CameraError),
    #[error("detection failed in region '{region}': {source}")]
    Detect {
        region: String,
        #[source]
        source: DetectError,
    },
    #[error("presenter failed: {0}")]
    Presenter(String),
    #[error("monitor has already stopped")]
    AlreadyStopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StreamEnded,
    /// The camera failed to deliver a frame (disconnect, decode failure or
    /// acquisition timeout).
    AcquisitionFailed,
    Cancelled,
    FrameLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::StreamEnded => write!(f, "stream ended"),
            StopReason::AcquisitionFailed => write!(f, "frame acquisition failed"),
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::FrameLimit => write!(f, "frame limit reached"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: usize,
    pub alerts_raised: usize,
    pub reason: StopReason,
}

/// Per-frame work: slice every region, detect, evaluate the threshold.
struct RegionCounter {
    regions: Vec<RegionSpec>,
    detector: Box<dyn RegionDetector>,
    low_threshold: usize,
}

impl RegionCounter {
    fn count(&self, frame: &Frame) -> Result<FrameReport, MonitorError> {
        let mut reports = Vec::with_capacity(self.regions.len());
        for spec in &self.regions {
            let detection = frame
                .crop(&spec.rect)
                .map_err(DetectError::from)
                .and_then(|roi| self.detector.detect(&roi))
                .map_err(|source| MonitorError::Detect {
                    region: spec.name.clone(),
                    source,
                })?;
            reports.push(RegionReport::new(spec, detection, self.low_threshold));
        }
        Ok(FrameReport::new(frame.index(), reports, self.low_threshold))
    }
}

/// Watches a camera and reports per-region item counts until the stream
/// ends, the run is cancelled, or the optional frame limit is hit.
///
/// A monitor runs once: `Idle` until `run` opens the camera, `Running` while
/// frames flow, then `Stopped` for good. The camera is released exactly once
/// on every way out of `run`.
pub struct TrayMonitor {
    camera: Box<dyn Camera>,
    counter: RegionCounter,
    presenter: Box<dyn Presenter>,
    logger: Box<dyn MonitorLogger>,
    device: String,
    cancelled: Arc<AtomicBool>,
    max_frames: Option<usize>,
    state: MonitorState,
}

impl TrayMonitor {
    pub fn new(
        camera: Box<dyn Camera>,
        detector: Box<dyn RegionDetector>,
        presenter: Box<dyn Presenter>,
        config: &MonitorConfig,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            camera,
            counter: RegionCounter {
                regions: config.regions.clone(),
                detector,
                low_threshold: config.low_threshold,
            },
            presenter,
            logger: Box::new(NullMonitorLogger),
            device: config.device.clone(),
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            max_frames: None,
            state: MonitorState::Idle,
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn MonitorLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_max_frames(mut self, max_frames: Option<usize>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn regions(&self) -> &[RegionSpec] {
        &self.counter.regions
    }

    /// Runs detection and alert evaluation on one frame without touching the
    /// camera or the presenter.
    pub fn process_frame(&self, frame: &Frame) -> Result<FrameReport, MonitorError> {
        self.counter.count(frame)
    }

    pub fn run(&mut self) -> Result<RunSummary, MonitorError> {
        if self.state != MonitorState::Idle {
            return Err(MonitorError::AlreadyStopped);
        }

        let mut session = match CameraSession::open(self.camera.as_mut(), &self.device) {
            Ok(session) => session,
            Err(e) => {
                self.state = MonitorState::Stopped;
                return Err(MonitorError::CameraUnavailable(e));
            }
        };
        self.state = MonitorState::Running;
        let info = session.info();
        self.logger.info(&format!(
            "Monitoring {} ({}x{}) across {} regions",
            info.source,
            info.width,
            info.height,
            self.counter.regions.len()
        ));

        let mut frames_processed = 0usize;
        let mut alerts_raised = 0usize;
        let mut frames = session.frames();
        let outcome = loop {
            let read_start = Instant::now();
            let frame = match frames.next() {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    log::warn!("Stopping: {e}");
                    break Ok(StopReason::AcquisitionFailed);
                }
                None => break Ok(StopReason::StreamEnded),
            };
            self.logger
                .timing("read", read_start.elapsed().as_secs_f64() * 1000.0);

            let detect_start = Instant::now();
            let report = match self.counter.count(&frame) {
                Ok(report) => report,
                Err(e) => break Err(e),
            };
            self.logger
                .timing("detect", detect_start.elapsed().as_secs_f64() * 1000.0);

            let present_start = Instant::now();
            if let Err(e) = self.presenter.present(&frame, &report) {
                break Err(MonitorError::Presenter(e.to_string()));
            }
            self.logger
                .timing("present", present_start.elapsed().as_secs_f64() * 1000.0);

            frames_processed += 1;
            alerts_raised += report.alerts.len();
            let items: usize = report.regions.iter().map(|r| r.count).sum();
            self.logger.metric("items", items as f64);
            self.logger.metric("alerts", report.alerts.len() as f64);
            self.logger.frame_processed(frames_processed);

            if self.cancelled.load(Ordering::Relaxed) {
                break Ok(StopReason::Cancelled);
            }
            if self.max_frames.is_some_and(|limit| frames_processed >= limit) {
                break Ok(StopReason::FrameLimit);
            }
        };

        session.release();
        self.state = MonitorState::Stopped;

        let reason = outcome?;
        self.logger.info(&format!(
            "Stopped after {frames_processed} frames ({reason}), {alerts_raised} alerts"
        ));
        self.logger.summary();
        Ok(RunSummary {
            frames_processed,
            alerts_raised,
            reason,
        })
    }
}
