use anyhow::Context;
use ffmpeg_next::{Packet, format::stream::Stream, frame};

pub(crate) enum Decoded {
    Picture(frame::Video),
    /// Feed another packet.
    NeedInput,
    /// Flushed after end of input; nothing more will come out.
    Drained,
}

pub(crate) struct VideoDecoder {
    inner: ffmpeg_next::codec::decoder::Video,
}

impl VideoDecoder {
    pub(crate) fn new(stream: &Stream) -> anyhow::Result<Self> {
        let decoder_ctx = ffmpeg_next::codec::Context::from_parameters(stream.parameters())
            .context("stage `decoder`: codec parameters")?;
        // RTP streams only learn their dimensions from the first keyframe,
        // so zero width/height is accepted here
        let inner = decoder_ctx
            .decoder()
            .video()
            .context("stage `decoder`: open video decoder")?;
        log::info!("decoder opened: {:?}", inner.id());
        Ok(Self { inner })
    }

    pub(crate) fn send_packet(&mut self, packet: &Packet) -> anyhow::Result<()> {
        self.inner.send_packet(packet)?;
        Ok(())
    }

    pub(crate) fn send_eof(&mut self) -> anyhow::Result<()> {
        self.inner.send_eof()?;
        Ok(())
    }

    pub(crate) fn receive(&mut self) -> anyhow::Result<Decoded> {
        let mut picture = frame::Video::empty();
        match self.inner.receive_frame(&mut picture) {
            Ok(()) => Ok(Decoded::Picture(picture)),
            Err(ffmpeg_next::Error::Eof) => Ok(Decoded::Drained),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::util::error::EAGAIN => {
                Ok(Decoded::NeedInput)
            }
            Err(err) => Err(err.into()),
        }
    }
}
