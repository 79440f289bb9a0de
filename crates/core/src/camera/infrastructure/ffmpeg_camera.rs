use crate::camera::domain::camera::{Camera, CameraError};
use crate::shared::frame::Frame;
use crate::shared::stream_info::StreamInfo;

#[cfg(target_os = "linux")]
pub const DEFAULT_INPUT_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
pub const DEFAULT_INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
pub const DEFAULT_INPUT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const DEFAULT_INPUT_FORMAT: &str = "v4l2";

/// Captures a webcam through libavdevice and converts frames to RGB24.
pub struct FfmpegCamera {
    input_format: String,
    options: Vec<(String, String)>,
    capture: Option<Capture>,
}

struct Capture {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_index: usize,
    flushing: bool,
}

// Safety: FfmpegCamera is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegCamera {}

impl FfmpegCamera {
    pub fn new() -> Self {
        Self {
            input_format: DEFAULT_INPUT_FORMAT.to_string(),
            options: Vec::new(),
            capture: None,
        }
    }

    /// Overrides the libavdevice demuxer (e.g. `v4l2`, `avfoundation`).
    pub fn with_input_format(mut self, format: impl Into<String>) -> Self {
        self.input_format = format.into();
        self
    }

    /// Passes a demuxer option such as `video_size=1280x720`.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push((key.into(), value.into()));
        self
    }

    pub fn input_format(&self) -> &str {
        &self.input_format
    }

    fn open_capture(&self, device: &str) -> Result<(Capture, StreamInfo), Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;
        ffmpeg_next::device::register_all();

        let format = find_input_format(&self.input_format)
            .ok_or_else(|| format!("input format '{}' is not available", self.input_format))?;
        let url = device_url(device, &self.input_format);

        let mut options = ffmpeg_next::Dictionary::new();
        for (key, value) in &self.options {
            options.set(key, value);
        }

        let ictx = match ffmpeg_next::format::open_with(
            &url,
            &format,
            options,
        )? {
            ffmpeg_next::format::context::Context::Input(ictx) => ictx,
            ffmpeg_next::format::context::Context::Output(_) => {
                return Err("device opened as an output".into())
            }
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;
        let stream_index = stream.index();
        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;
        let width = decoder.width();
        let height = decoder.height();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let info = StreamInfo {
            width,
            height,
            fps,
            source: url,
        };
        let capture = Capture {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            frame_index: 0,
            flushing: false,
        };
        Ok((capture, info))
    }
}

impl Default for FfmpegCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera for FfmpegCamera {
    fn open(&mut self, device: &str) -> Result<StreamInfo, CameraError> {
        let (capture, info) = self.open_capture(device).map_err(|e| CameraError::Open {
            device: device.to_string(),
            message: e.to_string(),
        })?;
        log::info!(
            "Opened {} via {} ({}x{} @ {:.1} fps)",
            info.source,
            self.input_format,
            info.width,
            info.height,
            info.fps
        );
        self.capture = Some(capture);
        Ok(info)
    }

    fn read(&mut self) -> Result<Option<Frame>, CameraError> {
        let capture = self.capture.as_mut().ok_or(CameraError::NotOpened)?;
        capture.next_frame()
    }

    fn release(&mut self) {
        if self.capture.take().is_some() {
            log::debug!("Released capture device");
        }
    }
}

impl Capture {
    fn try_receive(&mut self) -> Result<Option<Frame>, CameraError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler
            .run(&decoded, &mut rgb_frame)
            .map_err(|e| CameraError::Read(e.to_string()))?;

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CameraError> {
        loop {
            if let Some(frame) = self.try_receive()? {
                return Ok(Some(frame));
            }
            if self.flushing {
                return Ok(None);
            }

            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                continue;
            };
            if stream.index() != self.stream_index {
                continue;
            }
            // Corrupt packets from a flaky USB link are dropped by the decoder.
            let _ = self.decoder.send_packet(&packet);
        }
    }
}

fn find_input_format(name: &str) -> Option<ffmpeg_next::format::format::Format> {
    ffmpeg_next::device::input::video().find(|format| format.name().split(',').any(|n| n == name))
}

/// Maps a device id to the URL the demuxer expects.
///
/// On Linux a bare index `N` means `/dev/videoN`; other platforms take the
/// id verbatim (`0` for avfoundation, `video=<name>` for dshow).
pub fn device_url(device: &str, input_format: &str) -> String {
    let is_index = !device.is_empty() && device.chars().all(|c| c.is_ascii_digit());
    match input_format {
        "v4l2" | "video4linux2" if is_index => format!("/dev/video{device}"),
        _ => device.to_string(),
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
