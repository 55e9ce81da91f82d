//! PrintJSON text messages
//!
//! A PrintJSON frame carries an ordered list of text fragments. Hint messages
//! refer to players by slot number, which is resolved against the roster.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::protocol::packet::{parse, InboundCommand, NetworkPlayer};

/// Fragment type marking the text as a player slot reference
const PLAYER_ID_FRAGMENT: &str = "player_id";

/// One piece of a PrintJSON message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JsonMessagePart {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl JsonMessagePart {
    pub fn is_player_reference(&self) -> bool {
        self.kind.as_deref() == Some(PLAYER_ID_FRAGMENT)
    }
}

/// PrintJSON message type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintJsonKind {
    Join {
        team: i64,
        slot: i64,
        tags: Vec<String>,
    },
    Tutorial,
    Hint,
    Other(String),
}

#[derive(Deserialize)]
struct RawPrintJson {
    data: Vec<JsonMessagePart>,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct JoinFields {
    team: i64,
    slot: i64,
    tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJson {
    pub data: Vec<JsonMessagePart>,
    pub kind: PrintJsonKind,
}

impl PrintJson {
    pub(crate) fn from_frame(frame: Value) -> Result<Self> {
        let cmd = InboundCommand::PrintJson.as_str();
        let raw: RawPrintJson = parse(cmd, frame.clone())?;

        let kind = match raw.kind.as_str() {
            "Join" => {
                let join: JoinFields = parse(cmd, frame)?;
                PrintJsonKind::Join {
                    team: join.team,
                    slot: join.slot,
                    tags: join.tags,
                }
            }
            "Tutorial" => PrintJsonKind::Tutorial,
            "Hint" => PrintJsonKind::Hint,
            other => PrintJsonKind::Other(other.to_string()),
        };

        Ok(Self { data: raw.data, kind })
    }

    /// Flatten the message into output lines.
    ///
    /// Hints collapse into a single line with player references replaced by
    /// display names. Every other type yields one line per fragment.
    pub fn render(&self, players: &IndexMap<i64, NetworkPlayer>) -> Vec<String> {
        match &self.kind {
            PrintJsonKind::Hint => {
                let line = self
                    .data
                    .iter()
                    .map(|part| resolve_player(part, players))
                    .collect::<String>();
                vec![line]
            }
            PrintJsonKind::Other(kind) => {
                warn!("Unknown PrintJSON type: {}", kind);
                self.plain_lines()
            }
            PrintJsonKind::Join { .. } | PrintJsonKind::Tutorial => self.plain_lines(),
        }
    }

    fn plain_lines(&self) -> Vec<String> {
        self.data.iter().map(|part| part.text.clone()).collect()
    }
}

// Location references stay numeric: item names are not part of the session state.
fn resolve_player<'a>(part: &'a JsonMessagePart, players: &'a IndexMap<i64, NetworkPlayer>) -> &'a str {
    if !part.is_player_reference() {
        return &part.text;
    }
    let player = part
        .text
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|slot| players.get(&slot));
    match player {
        Some(player) => &player.name,
        None => {
            debug!("no roster entry for player reference '{}'", part.text);
            &part.text
        }
    }
}
