//! Blocking FFmpeg pipeline that turns an RTP/H.264 (or any FFmpeg-readable)
//! input into a stream of JPEG stills.

/// Registers FFmpeg components. Call once at startup before opening inputs.
pub fn init() -> anyhow::Result<()> {
    ffmpeg_next::init().map_err(|e| anyhow::anyhow!("ffmpeg_next init: {}", e))
}

mod capture;
mod decoder;
mod input;
mod jpeg;
mod scaler;

pub use capture::{CaptureEvent, JpegCapture};
pub use input::CaptureInput;
pub use jpeg::encode_rgb;
pub use scaler::{RgbImage, Scaler};
