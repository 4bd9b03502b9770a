//! Frame relay: hands encoded still frames from a blocking capture pipeline to a
//! UDP forwarder without ever stalling the capture side.
//!
//! Data flow:
//! ```text
//! FrameSource ──► [capture worker] ──► FrameQueue ──► [forwarding worker] ──► UDP
//!   (blocking pull)   spawn_blocking       mutex + notify       async task      seq / len / payload
//! ```

pub mod config;
pub mod error;
pub mod relay;
pub mod source;

pub use error::RelayError;
