pub mod log_presenter;
pub mod snapshot_presenter;
