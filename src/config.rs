//! Command line and config file handling.
//!
//! Precedence is CLI flag, then config file (`--config`, JSON), then the
//! built-in default.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::RelayError;
use crate::relay::{
    ByteOrder, DrainPolicy, ForwardOptions, Overflow, QueueConfig, RelayOptions,
    forward::{DEFAULT_DRAIN_TIMEOUT, DEFAULT_POLL_INTERVAL},
};
use crate::source::{DEFAULT_FPS, DEFAULT_JPEG_QUALITY, SourceConfig, SourceKind};

pub const DEFAULT_PORT: u32 = 4000;
pub const DEFAULT_DEST_PORT: u16 = 4008;
pub const DEFAULT_DEST: &str = "127.0.0.1:4008";

#[derive(Parser, Debug)]
#[command(name = "frame-relay", version)]
#[command(about = "Relay JPEG stills from a capture pipeline to a UDP receiver")]
pub struct Args {
    /// Local UDP port the RTP capture pipeline listens on [default: 4000]
    pub port: Option<u32>,

    /// Where frames are forwarded, `ip:port` or a bare IPv4 address [default: 127.0.0.1:4008]
    #[arg(long)]
    pub dest: Option<String>,

    /// Frame source
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    /// Input URL or file for `--source url`
    #[arg(long)]
    pub url: Option<String>,

    /// Header byte order: network or little
    #[arg(long)]
    pub byte_order: Option<ByteOrder>,

    /// Bound the frame queue; unbounded when omitted
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// What a full queue drops: drop-oldest or drop-newest
    #[arg(long, value_parser = parse_overflow)]
    pub overflow: Option<Overflow>,

    /// Forwarder idle re-check interval
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Discard queued frames at shutdown instead of draining them
    #[arg(long)]
    pub no_drain: bool,

    /// Upper bound on draining at shutdown
    #[arg(long)]
    pub drain_timeout_ms: Option<u64>,

    /// JPEG quality, 1-100
    #[arg(long)]
    pub jpeg_quality: Option<u8>,

    /// Pattern source frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Pattern source: stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceArg {
    Rtp,
    Url,
    Pattern,
}

fn parse_overflow(s: &str) -> Result<Overflow, String> {
    match s {
        "drop-oldest" | "oldest" => Ok(Overflow::DropOldest),
        "drop-newest" | "newest" => Ok(Overflow::DropNewest),
        other => Err(format!("unknown overflow policy {:?}", other)),
    }
}

/// Same keys as the long CLI flags, in snake_case.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u32>,
    pub dest: Option<String>,
    pub source: Option<SourceArg>,
    pub url: Option<String>,
    pub byte_order: Option<ByteOrder>,
    pub queue_capacity: Option<usize>,
    pub overflow: Option<Overflow>,
    pub poll_interval_ms: Option<u64>,
    pub drain: Option<bool>,
    pub drain_timeout_ms: Option<u64>,
    pub jpeg_quality: Option<u8>,
    pub fps: Option<u32>,
    pub frames: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
            .map_err(|e| RelayError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<Self, RelayError> {
        serde_json::from_str(text).map_err(|e| RelayError::Config(e.to_string()))
    }
}

/// Everything the binary needs to build and run a relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    pub source: SourceConfig,
    pub destination: SocketAddr,
    pub relay: RelayOptions,
}

impl RelayConfig {
    pub fn resolve(args: &Args) -> Result<Self, RelayError> {
        let file = match &args.config {
            Some(path) => {
                log::info!("loading config file {}", path.display());
                FileConfig::load(path)?
            }
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: &Args, file: FileConfig) -> Result<Self, RelayError> {
        let port = validate_port(args.port.or(file.port).unwrap_or(DEFAULT_PORT))?;
        let destination = parse_destination(
            args.dest
                .as_deref()
                .or(file.dest.as_deref())
                .unwrap_or(DEFAULT_DEST),
        )?;

        let url = args.url.clone().or(file.url);
        let kind = match args.source.or(file.source) {
            Some(SourceArg::Rtp) => SourceKind::Rtp { port },
            Some(SourceArg::Pattern) => SourceKind::Pattern,
            Some(SourceArg::Url) => SourceKind::Url(
                url.ok_or_else(|| RelayError::Config("`--source url` needs `--url`".into()))?,
            ),
            None => match url {
                Some(url) => SourceKind::Url(url),
                None if cfg!(feature = "ffmpeg") => SourceKind::Rtp { port },
                None => SourceKind::Pattern,
            },
        };

        let jpeg_quality = args
            .jpeg_quality
            .or(file.jpeg_quality)
            .unwrap_or(DEFAULT_JPEG_QUALITY);
        if !(1..=100).contains(&jpeg_quality) {
            return Err(RelayError::Config(format!(
                "jpeg quality {} out of range 1-100",
                jpeg_quality
            )));
        }
        let source = SourceConfig {
            kind,
            jpeg_quality,
            fps: args.fps.or(file.fps).unwrap_or(DEFAULT_FPS),
            frames: args.frames.or(file.frames),
        };

        let queue = match args.queue_capacity.or(file.queue_capacity) {
            Some(0) => return Err(RelayError::Config("queue capacity must be at least 1".into())),
            Some(capacity) => QueueConfig::bounded(
                capacity,
                args.overflow.or(file.overflow).unwrap_or_default(),
            ),
            None => QueueConfig::unbounded(),
        };

        let poll_interval = match args.poll_interval_ms.or(file.poll_interval_ms) {
            Some(0) => return Err(RelayError::Config("poll interval must be at least 1ms".into())),
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_POLL_INTERVAL,
        };
        let drain = if args.no_drain || file.drain == Some(false) {
            DrainPolicy::Discard
        } else {
            DrainPolicy::Drain {
                timeout: args
                    .drain_timeout_ms
                    .or(file.drain_timeout_ms)
                    .map(Duration::from_millis)
                    .unwrap_or(DEFAULT_DRAIN_TIMEOUT),
            }
        };

        Ok(Self {
            source,
            destination,
            relay: RelayOptions {
                queue,
                forward: ForwardOptions {
                    byte_order: args.byte_order.or(file.byte_order).unwrap_or_default(),
                    poll_interval,
                    drain,
                },
            },
        })
    }
}

/// Ports are valid in the open interval (0, 65535).
pub fn validate_port(port: u32) -> Result<u16, RelayError> {
    if port == 0 || port >= 65535 {
        return Err(RelayError::InvalidPort(port));
    }
    Ok(port as u16)
}

/// `ip:port`, or a bare IP address which gets the default destination port.
pub fn parse_destination(s: &str) -> Result<SocketAddr, RelayError> {
    let addr = match s.parse::<SocketAddr>() {
        Ok(addr) => addr,
        Err(_) => s
            .parse::<IpAddr>()
            .map(|ip| SocketAddr::new(ip, DEFAULT_DEST_PORT))
            .map_err(|_| RelayError::InvalidAddress(s.to_string()))?,
    };
    validate_port(addr.port() as u32)?;
    Ok(addr)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
