//! Archipelago Hint Client
//!
//! Keeps a session with an Archipelago multiworld server and turns idle
//! time reported by the game into hint requests for the player's own
//! missing progression items.

pub mod error;
pub mod protocol;
pub mod client;
pub mod telemetry;
pub mod logging;

pub use error::{Error, Result};
pub use protocol::{
    ConnectionState, InboundPacket, OutboundPacket,
    NetworkItem, NetworkPlayer, NetworkVersion, ItemType,
    Transport, WebSocketTransport,
};
pub use client::{Session, Client, ClientBuilder, ClientConfig, SessionEvent};
pub use telemetry::{MilestoneTracker, TimerSource, FileTimer};
