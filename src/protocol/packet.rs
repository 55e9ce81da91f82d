//! Archipelago packet model and frame codec
//!
//! Every websocket message is a JSON array of frames. Each frame is an object
//! whose `cmd` field selects the command.

use std::collections::HashMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::protocol::message::PrintJson;

/// `class` marker of roster entries describing a player
pub const NETWORK_PLAYER_CLASS: &str = "NetworkPlayer";
/// `class` marker of location entries describing an item
pub const NETWORK_ITEM_CLASS: &str = "NetworkItem";
/// Fixed game tag announced in every Connect request
pub const GAME_TAG: &str = "HintGame";

/// Inbound command tags (server to client)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundCommand {
    RoomInfo,
    ConnectionRefused,
    Connected,
    PrintJson,
    Retrieved,
    LocationInfo,
    Bounced,
    RoomUpdate,
}

impl InboundCommand {
    pub fn from_cmd(cmd: &str) -> Option<Self> {
        match cmd {
            "RoomInfo" => Some(Self::RoomInfo),
            "ConnectionRefused" => Some(Self::ConnectionRefused),
            "Connected" => Some(Self::Connected),
            "PrintJSON" => Some(Self::PrintJson),
            "Retrieved" => Some(Self::Retrieved),
            "LocationInfo" => Some(Self::LocationInfo),
            "Bounced" => Some(Self::Bounced),
            "RoomUpdate" => Some(Self::RoomUpdate),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoomInfo => "RoomInfo",
            Self::ConnectionRefused => "ConnectionRefused",
            Self::Connected => "Connected",
            Self::PrintJson => "PrintJSON",
            Self::Retrieved => "Retrieved",
            Self::LocationInfo => "LocationInfo",
            Self::Bounced => "Bounced",
            Self::RoomUpdate => "RoomUpdate",
        }
    }
}

/// Protocol version object (`{"major", "minor", "build", "class"}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
    #[serde(default = "NetworkVersion::class_name")]
    pub class: String,
}

impl NetworkVersion {
    pub fn new(major: u32, minor: u32, build: u32) -> Self {
        Self {
            major,
            minor,
            build,
            class: Self::class_name(),
        }
    }

    fn class_name() -> String {
        "Version".into()
    }
}

impl std::fmt::Display for NetworkVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// A player in the multiworld roster
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkPlayer {
    pub team: i64,
    pub slot: i64,
    pub alias: String,
    pub name: String,
}

/// Item classification, carried on the wire as `flags`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ItemType {
    Filler = 0,
    Progression = 1,
    Useful = 2,
    ProgressionSkipBalancing = 3,
    Trap = 4,
}

impl ItemType {
    pub fn from_flags(flags: i64) -> Option<Self> {
        match flags {
            0 => Some(Self::Filler),
            1 => Some(Self::Progression),
            2 => Some(Self::Useful),
            3 => Some(Self::ProgressionSkipBalancing),
            4 => Some(Self::Trap),
            _ => None,
        }
    }

    /// Items worth spending a hint on
    pub fn is_hintable(self) -> bool {
        matches!(self, Self::Progression | Self::Useful)
    }
}

/// An item placed at a location somewhere in the multiworld
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkItem {
    pub item_id: i64,
    pub location_id: i64,
    pub player_id: i64,
    pub item_type: ItemType,
    /// `player_id` names the player receiving the item rather than the
    /// player whose world holds it.
    pub is_owned_by_receiver: bool,
}

#[derive(Deserialize)]
struct RawNetworkItem {
    item: i64,
    location: i64,
    player: i64,
    flags: i64,
}

// ============================================================================
// Inbound packets
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RoomInfo {
    pub password: bool,
    pub games: Vec<String>,
    pub tags: Vec<String>,
    pub version: NetworkVersion,
    pub generator_version: NetworkVersion,
    pub permissions: HashMap<String, i64>,
    pub hint_cost: i64,
    pub location_check_points: i64,
    pub datapackage_checksums: HashMap<String, String>,
    pub seed_name: String,
    /// Server clock; sent as a float timestamp, kept as received
    pub time: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionRefused {
    pub errors: Vec<String>,
}

impl ConnectionRefused {
    /// Human-readable diagnostic per refusal code, in order
    pub fn diagnostics(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|code| match code.as_str() {
                "InvalidPassword" => "Error: Invalid Password".to_string(),
                other => format!("Unknown Error: '{}'", other),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Connected {
    pub team: i64,
    pub slot: i64,
    pub missing_locations: Vec<i64>,
    pub checked_locations: Vec<i64>,
    pub slot_info: Map<String, Value>,
    pub hint_points: i64,
    pub slot_data: Value,
    #[serde(deserialize_with = "network_players")]
    pub players: Vec<NetworkPlayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retrieved {
    pub keys: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInfo {
    #[serde(rename = "locations", deserialize_with = "network_items")]
    pub items: Vec<NetworkItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bounced {
    pub slots: Vec<i64>,
}

/// Sparse update; absent fields leave session state untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomUpdate {
    #[serde(default)]
    pub hint_points: Option<i64>,
    #[serde(default)]
    pub checked_locations: Option<Vec<i64>>,
}

fn network_players<'de, D>(deserializer: D) -> std::result::Result<Vec<NetworkPlayer>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .filter(|entry| has_class(entry, NETWORK_PLAYER_CLASS))
        .map(|entry| NetworkPlayer::deserialize(entry).map_err(de::Error::custom))
        .collect()
}

fn network_items<'de, D>(deserializer: D) -> std::result::Result<Vec<NetworkItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<Value>::deserialize(deserializer)?
        .into_iter()
        .filter(|entry| has_class(entry, NETWORK_ITEM_CLASS))
        .map(|entry| -> std::result::Result<NetworkItem, D::Error> {
            let raw = RawNetworkItem::deserialize(entry).map_err(de::Error::custom)?;
            let item_type = ItemType::from_flags(raw.flags)
                .ok_or_else(|| de::Error::custom(format!("unknown item flags {}", raw.flags)))?;
            // LocationInfo always reports the receiving player
            Ok(NetworkItem {
                item_id: raw.item,
                location_id: raw.location,
                player_id: raw.player,
                item_type,
                is_owned_by_receiver: true,
            })
        })
        .collect()
}

fn has_class(entry: &Value, class: &str) -> bool {
    entry.get("class").and_then(Value::as_str) == Some(class)
}

/// A decoded server frame
#[derive(Debug, Clone)]
pub enum InboundPacket {
    RoomInfo(RoomInfo),
    ConnectionRefused(ConnectionRefused),
    Connected(Connected),
    PrintJson(PrintJson),
    Retrieved(Retrieved),
    LocationInfo(LocationInfo),
    Bounced(Bounced),
    RoomUpdate(RoomUpdate),
    /// Unrecognized `cmd`, kept for logging only
    Unknown { cmd: String },
}

impl InboundPacket {
    /// The `cmd` tag of the frame this packet was decoded from
    pub fn cmd(&self) -> &str {
        match self {
            Self::RoomInfo(_) => InboundCommand::RoomInfo.as_str(),
            Self::ConnectionRefused(_) => InboundCommand::ConnectionRefused.as_str(),
            Self::Connected(_) => InboundCommand::Connected.as_str(),
            Self::PrintJson(_) => InboundCommand::PrintJson.as_str(),
            Self::Retrieved(_) => InboundCommand::Retrieved.as_str(),
            Self::LocationInfo(_) => InboundCommand::LocationInfo.as_str(),
            Self::Bounced(_) => InboundCommand::Bounced.as_str(),
            Self::RoomUpdate(_) => InboundCommand::RoomUpdate.as_str(),
            Self::Unknown { cmd } => cmd.as_str(),
        }
    }
}

// ============================================================================
// Outbound packets
// ============================================================================

/// A client request. Serializes with `cmd` first, then fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum OutboundPacket {
    Connect {
        game: String,
        items_handling: u8,
        name: String,
        password: String,
        slot_data: bool,
        tags: Vec<String>,
        uuid: u64,
        version: NetworkVersion,
    },
    LocationChecks {
        locations: Vec<i64>,
    },
    SetNotify {
        keys: Vec<String>,
    },
    Get {
        keys: Vec<String>,
    },
    LocationScouts {
        locations: Vec<i64>,
        create_as_hint: u8,
    },
}

impl OutboundPacket {
    pub fn cmd(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "Connect",
            Self::LocationChecks { .. } => "LocationChecks",
            Self::SetNotify { .. } => "SetNotify",
            Self::Get { .. } => "Get",
            Self::LocationScouts { .. } => "LocationScouts",
        }
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Decode one websocket message (a JSON array of frames)
pub fn decode_frames(message: &str) -> Result<Vec<InboundPacket>> {
    let frames: Vec<Value> = serde_json::from_str(message)
        .map_err(|e| Error::InvalidFrame(format!("message is not a frame list: {}", e)))?;
    frames.into_iter().map(decode_frame).collect()
}

/// Decode a single frame, routing on its `cmd` field
pub fn decode_frame(frame: Value) -> Result<InboundPacket> {
    let cmd = match frame.get("cmd").and_then(Value::as_str) {
        Some(cmd) => cmd.to_string(),
        None => return Err(Error::InvalidFrame("frame has no string 'cmd' field".into())),
    };

    let Some(command) = InboundCommand::from_cmd(&cmd) else {
        return Ok(InboundPacket::Unknown { cmd });
    };

    let packet = match command {
        InboundCommand::RoomInfo => InboundPacket::RoomInfo(parse(&cmd, frame)?),
        InboundCommand::ConnectionRefused => InboundPacket::ConnectionRefused(parse(&cmd, frame)?),
        InboundCommand::Connected => InboundPacket::Connected(parse(&cmd, frame)?),
        InboundCommand::PrintJson => InboundPacket::PrintJson(PrintJson::from_frame(frame)?),
        InboundCommand::Retrieved => InboundPacket::Retrieved(parse(&cmd, frame)?),
        InboundCommand::LocationInfo => InboundPacket::LocationInfo(parse(&cmd, frame)?),
        InboundCommand::Bounced => InboundPacket::Bounced(parse(&cmd, frame)?),
        InboundCommand::RoomUpdate => InboundPacket::RoomUpdate(parse(&cmd, frame)?),
    };
    Ok(packet)
}

pub(crate) fn parse<T: serde::de::DeserializeOwned>(cmd: &str, frame: Value) -> Result<T> {
    serde_json::from_value(frame).map_err(|e| Error::malformed(cmd, e))
}

/// Encode one request as a frame object
pub fn encode_frame(packet: &OutboundPacket) -> Result<Value> {
    serde_json::to_value(packet).map_err(|e| Error::Encode(e.to_string()))
}

/// Encode requests as one websocket message
pub fn encode_frames(packets: &[OutboundPacket]) -> Result<String> {
    serde_json::to_string(packets).map_err(|e| Error::Encode(e.to_string()))
}
