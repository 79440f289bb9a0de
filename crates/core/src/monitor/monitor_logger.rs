use std::collections::HashMap;
use std::time::Instant;

/// Observability hook for the monitor loop.
///
/// Keeps the orchestration free of output concerns; the CLI logs through the
/// `log` facade while tests discard everything.
pub trait MonitorLogger: Send {
    /// Called after each frame is fully processed. `frames` is the running total.
    fn frame_processed(&mut self, frames: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. total item count, alert count).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

pub struct NullMonitorLogger;

impl MonitorLogger for NullMonitorLogger {
    fn frame_processed(&mut self, _frames: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate of one timing stage or metric.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stat {
    pub count: u64,
    pub sum: f64,
    pub max: f64,
}

impl Stat {
    fn record(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Logger for long-running webcam sessions.
///
/// The stream has no known length, so progress is a frame count logged every
/// `throttle_frames` frames together with the current throughput. Samples are
/// folded into one [`Stat`] per name, so memory stays constant however long
/// the monitor runs.
pub struct StdoutMonitorLogger {
    throttle_frames: usize,
    timings: HashMap<String, Stat>,
    metrics: HashMap<String, Stat>,
    start_time: Instant,
    frames: usize,
}

impl StdoutMonitorLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
        }
    }

    fn fps(&self) -> f64 {
        let secs = self.start_time.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }

    /// Returns the formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Monitor summary ({} frames, {:.1}s total):",
            self.frames,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stat) in stages {
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                stat.mean(),
                stat.max,
                stat.sum
            ));
        }

        let mut names: Vec<_> = self.metrics.iter().collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        for (name, stat) in names {
            lines.push(format!("  {name}: avg {:.1}", stat.mean()));
        }

        if self.frames > 0 && elapsed_ms > 0.0 {
            lines.push(format!("  Throughput: {:.1} fps", self.fps()));
        }

        Some(lines.join("\n"))
    }

    pub fn timing_stat(&self, stage: &str) -> Option<Stat> {
        self.timings.get(stage).copied()
    }

    pub fn metric_stat(&self, name: &str) -> Option<Stat> {
        self.metrics.get(name).copied()
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

fn record(stats: &mut HashMap<String, Stat>, name: &str, value: f64) {
    match stats.get_mut(name) {
        Some(stat) => stat.record(value),
        None => {
            let mut stat = Stat::default();
            stat.record(value);
            stats.insert(name.to_string(), stat);
        }
    }
}

impl Default for StdoutMonitorLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl MonitorLogger for StdoutMonitorLogger {
    fn frame_processed(&mut self, frames: usize) {
        self.frames = frames;
        if frames % self.throttle_frames == 0 {
            log::info!("Processed {frames} frames ({:.1} fps)", self.fps());
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        record(&mut self.timings, stage, duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        record(&mut self.metrics, name, value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
