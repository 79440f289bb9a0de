pub mod ffmpeg_camera;
pub mod image_dir_camera;
pub mod timeout_camera;
