pub mod camera;
pub mod detection;
pub mod monitor;
pub mod shared;
