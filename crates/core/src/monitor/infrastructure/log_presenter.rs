use crate::monitor::frame_report::FrameReport;
use crate::monitor::presenter::Presenter;
use crate::shared::frame::Frame;

/// Headless presenter: counts at debug level, one warning per alert.
#[derive(Default)]
pub struct LogPresenter {
    alerts_logged: usize,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts_logged(&self) -> usize {
        self.alerts_logged
    }
}

pub fn format_counts(report: &FrameReport) -> String {
    report
        .regions
        .iter()
        .map(|r| format!("{}={}", r.name, r.count))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Presenter for LogPresenter {
    fn present(
        &mut self,
        _frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        log::debug!("Frame {}: {}", report.frame_index, format_counts(report));
        for alert in &report.alerts {
            log::warn!("{alert}");
        }
        self.alerts_logged += report.alerts.len();
        Ok(())
    }
}
