use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use anyhow::Context;
use ffmpeg_next::{Dictionary, Packet, media};

/// Where the capture pipeline reads from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureInput {
    /// RTP, H.264 with dynamic payload type 96, received on this local port.
    Rtp { port: u16 },
    /// Any URL or file path FFmpeg can open.
    Url(String),
}

impl Display for CaptureInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureInput::Rtp { port } => write!(f, "rtp://0.0.0.0:{}", port),
            CaptureInput::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Session description FFmpeg needs to receive a bare RTP stream.
/// Removed from disk when dropped.
struct SdpFile {
    path: PathBuf,
}

impl SdpFile {
    fn create(port: u16) -> anyhow::Result<Self> {
        let path = std::env::temp_dir().join(format!(
            "frame-relay-{}-{}.sdp",
            std::process::id(),
            port
        ));
        let sdp = format!(
            "v=0\r\n\
             o=- 0 0 IN IP4 127.0.0.1\r\n\
             s=frame-relay\r\n\
             c=IN IP4 0.0.0.0\r\n\
             t=0 0\r\n\
             m=video {} RTP/AVP 96\r\n\
             a=rtpmap:96 H264/90000\r\n",
            port
        );
        std::fs::write(&path, sdp)
            .with_context(|| format!("write sdp file {}", path.display()))?;
        Ok(Self { path })
    }
}

impl Drop for SdpFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::debug!("remove sdp file {}: {}", self.path.display(), e);
        }
    }
}

pub(crate) struct Input {
    inner: ffmpeg_next::format::context::Input,
    video_index: usize,
    _sdp: Option<SdpFile>,
}

// the demuxer is only ever used from the capture thread that owns it
unsafe impl Send for Input {}

impl Input {
    pub(crate) fn open(source: &CaptureInput) -> anyhow::Result<Self> {
        let (path, sdp) = match source {
            CaptureInput::Rtp { port } => {
                let sdp = SdpFile::create(*port).context("stage `input`")?;
                (sdp.path.clone(), Some(sdp))
            }
            CaptureInput::Url(url) => (PathBuf::from(url), None),
        };

        let mut options = Dictionary::new();
        if sdp.is_some() {
            options.set("protocol_whitelist", "file,udp,rtp");
        }
        let inner = ffmpeg_next::format::input_with_dictionary(&path, options)
            .with_context(|| format!("stage `input`: open {}", source))?;

        let video_index = inner
            .streams()
            .best(media::Type::Video)
            .map(|s| s.index())
            .ok_or_else(|| anyhow::anyhow!("stage `stream`: no video stream in {}", source))?;
        log::info!("input {} opened, video stream #{}", source, video_index);

        Ok(Self {
            inner,
            video_index,
            _sdp: sdp,
        })
    }

    pub(crate) fn video_stream(&self) -> anyhow::Result<ffmpeg_next::format::stream::Stream<'_>> {
        self.inner
            .stream(self.video_index)
            .ok_or_else(|| anyhow::anyhow!("stage `stream`: video stream vanished"))
    }

    /// Next packet of the video stream; packets of other streams are skipped.
    /// `None` at end of input.
    pub(crate) fn read_video_packet(&mut self) -> Option<Packet> {
        for (stream, packet) in self.inner.packets() {
            if stream.index() == self.video_index {
                return Some(packet);
            }
        }
        None
    }
}
