pub mod constants;
pub mod frame;
pub mod region;
pub mod stream_info;
