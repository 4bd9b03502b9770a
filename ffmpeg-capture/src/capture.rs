use bytes::Bytes;

use crate::{
    decoder::{Decoded, VideoDecoder},
    input::{CaptureInput, Input},
    jpeg,
    scaler::Scaler,
};

#[derive(Debug)]
pub enum CaptureEvent {
    Jpeg(Bytes),
    /// A packet was consumed without producing a picture.
    Pending,
    /// Input ended and the decoder is flushed.
    Eof,
}

/// input -> video decoder -> RGB24 -> JPEG, one blocking step per `pull`.
pub struct JpegCapture {
    input: Input,
    decoder: VideoDecoder,
    scaler: Scaler,
    quality: u8,
    flushing: bool,
    finished: bool,
    source: CaptureInput,
}

impl JpegCapture {
    pub fn open(source: CaptureInput, quality: u8) -> anyhow::Result<Self> {
        let input = Input::open(&source)?;
        let decoder = VideoDecoder::new(&input.video_stream()?)?;
        Ok(Self {
            input,
            decoder,
            scaler: Scaler::new(),
            quality,
            flushing: false,
            finished: false,
            source,
        })
    }

    /// Blocks on the input read. Decoded pictures are drained before the
    /// next packet is read.
    pub fn pull(&mut self) -> anyhow::Result<CaptureEvent> {
        if self.finished {
            return Ok(CaptureEvent::Eof);
        }

        match self.decoder.receive()? {
            Decoded::Picture(picture) => {
                let rgb = self.scaler.to_rgb(&picture)?;
                return Ok(CaptureEvent::Jpeg(jpeg::encode_rgb(&rgb, self.quality)?));
            }
            Decoded::Drained => {
                self.finished = true;
                log::info!("{}: decoder drained", self.source);
                return Ok(CaptureEvent::Eof);
            }
            Decoded::NeedInput if self.flushing => return Ok(CaptureEvent::Pending),
            Decoded::NeedInput => {}
        }

        match self.input.read_video_packet() {
            Some(packet) => {
                if let Err(e) = self.decoder.send_packet(&packet) {
                    log::warn!("{}: skipping corrupt packet: {}", self.source, e);
                }
            }
            None => {
                log::info!("{}: end of input, flushing decoder", self.source);
                self.decoder.send_eof()?;
                self.flushing = true;
            }
        }
        Ok(CaptureEvent::Pending)
    }
}

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;
