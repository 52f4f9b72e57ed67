//! Outbound event intents.
//!
//! Commands and scheduler ticks never render text; they produce the event
//! values defined here, which the driver queues and flushes to the transport
//! collaborator after the tick completes. Emission order equals generation
//! order within a command, and processing order across commands.

pub mod channels;
pub mod types;

pub use channels::{
    ChannelEventReceiver, ChannelEventSender, DEFAULT_CHANNEL_BUFFER, channel_event_channel,
};
pub use types::{ChannelEvent, NotReadyReason, PickupEvent, TeamRoster, team_name};
