//! Frame sources the capture worker can drain.

use std::fmt::{Display, Formatter};

use crate::RelayError;
use crate::relay::FrameSource;

#[cfg(feature = "ffmpeg")]
mod ffmpeg;
mod pattern;

pub use pattern::PatternSource;

pub const DEFAULT_JPEG_QUALITY: u8 = 85;
pub const DEFAULT_FPS: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// RTP/H.264 (payload type 96) received on a local UDP port.
    Rtp { port: u16 },
    /// Any URL or file path FFmpeg can open.
    Url(String),
    /// Synthetic moving gradient.
    Pattern,
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Rtp { port } => write!(f, "rtp://0.0.0.0:{}", port),
            SourceKind::Url(url) => write!(f, "{}", url),
            SourceKind::Pattern => write!(f, "pattern"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub jpeg_quality: u8,
    /// Pattern source only.
    pub fps: u32,
    /// Pattern source only: report end of stream after this many frames.
    pub frames: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Pattern,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            fps: DEFAULT_FPS,
            frames: None,
        }
    }
}

/// Build the pipeline described by `config`.
pub fn open(config: &SourceConfig) -> Result<Box<dyn FrameSource>, RelayError> {
    log::info!("opening source {}", config.kind);
    match &config.kind {
        SourceKind::Pattern => Ok(Box::new(PatternSource::new(
            config.jpeg_quality,
            config.fps,
            config.frames,
        ))),
        #[cfg(feature = "ffmpeg")]
        kind => ffmpeg::open(kind, config.jpeg_quality),
        #[cfg(not(feature = "ffmpeg"))]
        kind => Err(RelayError::pipeline(anyhow::anyhow!(
            "source {} needs FFmpeg; rebuild with `--features ffmpeg`",
            kind
        ))),
    }
}
