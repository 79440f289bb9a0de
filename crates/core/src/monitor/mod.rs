pub mod frame_report;
pub mod infrastructure;
pub mod monitor_config;
pub mod monitor_logger;
pub mod presenter;
pub mod tray_monitor;
