use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

use crate::relay::{RelayState, wire::MAX_UDP_PAYLOAD};

/// Failures the relay reports by kind, so the binary can name the failing stage.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("invalid port {0}: must be in 1..=65534")]
    InvalidPort(u32),

    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("{0:#}")]
    PipelineBuild(#[source] anyhow::Error),

    #[error("cannot open a udp socket towards {destination}: {source}")]
    Socket {
        destination: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("frame of {0} bytes exceeds the {max} byte datagram limit", max = MAX_UDP_PAYLOAD)]
    FrameTooLarge(usize),

    #[error("send failed: {0}")]
    Send(#[from] std::io::Error),

    #[error("relay is {actual}, expected {expected}")]
    InvalidState {
        actual: RelayState,
        expected: RelayState,
    },
}

impl RelayError {
    pub fn pipeline(source: impl Into<anyhow::Error>) -> Self {
        Self::PipelineBuild(source.into())
    }

    /// The startup stage this error belongs to, if it is a startup error.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            RelayError::InvalidPort(_) | RelayError::InvalidAddress(_) | RelayError::Config(_) => {
                Some(Stage::Config)
            }
            RelayError::PipelineBuild(_) => Some(Stage::Source),
            RelayError::Socket { .. } => Some(Stage::Socket),
            RelayError::FrameTooLarge(_)
            | RelayError::Send(_)
            | RelayError::InvalidState { .. } => None,
        }
    }
}

/// Startup stage used in user facing error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Config,
    Source,
    Socket,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Config => write!(f, "config"),
            Stage::Source => write!(f, "pipeline build"),
            Stage::Socket => write!(f, "socket"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Config.to_string(), "config");
        assert_eq!(Stage::Source.to_string(), "pipeline build");
        assert_eq!(Stage::Socket.to_string(), "socket");
    }

    #[test]
    fn test_pipeline_error_keeps_cause_chain() {
        let err = RelayError::pipeline(anyhow::anyhow!("no such device").context("stage `input`"));
        assert_eq!(err.to_string(), "stage `input`: no such device");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.stage(), Some(Stage::Source));
    }

    #[test]
    fn test_each_startup_error_names_its_stage() {
        assert_eq!(RelayError::InvalidPort(0).stage(), Some(Stage::Config));
        assert_eq!(
            RelayError::InvalidAddress("x".into()).stage(),
            Some(Stage::Config)
        );
        assert_eq!(RelayError::Config("x".into()).stage(), Some(Stage::Config));

        let socket = RelayError::Socket {
            destination: "127.0.0.1:4008".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "no route"),
        };
        assert_eq!(socket.stage(), Some(Stage::Socket));
        assert!(socket.to_string().contains("127.0.0.1:4008"));
    }

    #[test]
    fn test_send_errors_are_not_startup_errors() {
        let err = RelayError::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(matches!(err, RelayError::Send(_)));
        assert_eq!(err.to_string(), "send failed: refused");
        assert_eq!(err.stage(), None);
        assert_eq!(RelayError::FrameTooLarge(70_000).stage(), None);
    }
}
