//! Event channel factory for the driver's flush queue.
//!
//! The engine itself is synchronous; the driver pushes the events returned
//! by each command or tick into this channel and a separate task renders
//! them, decoupling core latency from transport latency.

use super::types::ChannelEvent;
use tokio::sync::mpsc;

/// Default buffer size for the outbound event queue.
///
/// Enough to absorb a burst (a full draft completing emits a handful of
/// events per player) while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Sender handle for outbound events.
pub type ChannelEventSender = mpsc::Sender<ChannelEvent>;
/// Receiver handle for outbound events.
pub type ChannelEventReceiver = mpsc::Receiver<ChannelEvent>;

/// Create the outbound event channel.
pub fn channel_event_channel() -> (ChannelEventSender, ChannelEventReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
