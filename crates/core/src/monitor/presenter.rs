use crate::monitor::frame_report::FrameReport;
use crate::shared::frame::Frame;

/// Output side of the monitor: receives every processed frame with its report.
///
/// Implementations may log, draw, or display. They must not mutate the frame.
pub trait Presenter: Send {
    fn present(
        &mut self,
        frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>>;
}

/// Forwards each frame to several presenters in order, stopping at the first
/// failure.
#[derive(Default)]
pub struct MultiPresenter {
    presenters: Vec<Box<dyn Presenter>>,
}

impl MultiPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenters.push(presenter);
        self
    }

    pub fn push(&mut self, presenter: Box<dyn Presenter>) {
        self.presenters.push(presenter);
    }

    pub fn len(&self) -> usize {
        self.presenters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presenters.is_empty()
    }
}

impl Presenter for MultiPresenter {
    fn present(
        &mut self,
        frame: &Frame,
        report: &FrameReport,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for presenter in &mut self.presenters {
            presenter.present(frame, report)?;
        }
        Ok(())
    }
}
