//! The relay core: queue, the two workers, wire framing and the controller
//! that owns them.

pub mod capture;
pub mod forward;
pub mod frame;
pub mod lifecycle;
pub mod queue;
pub mod sink;
pub mod stats;
pub mod wire;

pub use capture::{CaptureExit, FrameSource, Pull};
pub use forward::{DrainPolicy, ForwardExit, ForwardOptions};
pub use frame::Frame;
pub use lifecycle::{Relay, RelayOptions, RelayState};
pub use queue::{FrameQueue, Overflow, QueueConfig};
pub use sink::{DatagramSink, UdpSink};
pub use stats::{RelayStats, RelaySummary};
pub use wire::{ByteOrder, FrameHeader, FrameReassembler};

#[cfg(test)]
pub(crate) mod testing;
