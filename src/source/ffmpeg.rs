use ffmpeg_capture::{CaptureEvent, CaptureInput, JpegCapture};

use crate::RelayError;
use crate::relay::{FrameSource, Pull};
use crate::source::SourceKind;

pub(super) fn open(kind: &SourceKind, quality: u8) -> Result<Box<dyn FrameSource>, RelayError> {
    let input = match kind {
        SourceKind::Rtp { port } => CaptureInput::Rtp { port: *port },
        SourceKind::Url(url) => CaptureInput::Url(url.clone()),
        SourceKind::Pattern => {
            return Err(RelayError::pipeline(anyhow::anyhow!(
                "pattern source is not an ffmpeg input"
            )));
        }
    };
    ffmpeg_capture::init().map_err(RelayError::pipeline)?;
    let capture = JpegCapture::open(input, quality).map_err(RelayError::pipeline)?;
    Ok(Box::new(capture))
}

impl FrameSource for JpegCapture {
    fn pull(&mut self) -> anyhow::Result<Pull> {
        Ok(match JpegCapture::pull(self)? {
            CaptureEvent::Jpeg(jpeg) => Pull::Frame(jpeg),
            CaptureEvent::Pending => Pull::Pending,
            CaptureEvent::Eof => Pull::End,
        })
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}
