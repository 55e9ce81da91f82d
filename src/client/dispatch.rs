//! Inbound command handling
//!
//! [`apply`] folds one decoded packet into the session. Replies are queued
//! on the session and go out on later ticks.

use tracing::{debug, info, warn};

use crate::client::events::SessionEvent;
use crate::client::session::Session;
use crate::error::{Error, Result};
use crate::protocol::{
    ConnectionState, Connected, InboundPacket, OutboundPacket, RoomInfo, RoomUpdate, GAME_TAG,
};

/// Apply one inbound packet to the session.
///
/// Returns `Error::ConnectionRefused` when the server rejects the slot; that
/// is the only command that ends the session.
pub fn apply(session: &mut Session, packet: InboundPacket) -> Result<()> {
    debug!("dispatching {}", packet.cmd());
    match packet {
        InboundPacket::RoomInfo(info) => on_room_info(session, info),
        InboundPacket::ConnectionRefused(refused) => {
            return Err(Error::ConnectionRefused {
                diagnostics: refused.diagnostics(),
            });
        }
        InboundPacket::Connected(connected) => on_connected(session, connected),
        InboundPacket::PrintJson(msg) => {
            for line in msg.render(&session.players) {
                session.emit(SessionEvent::Message(line));
            }
        }
        InboundPacket::Retrieved(retrieved) => {
            for (key, value) in retrieved.keys {
                session.remote_keys.insert(key, value);
            }
        }
        InboundPacket::LocationInfo(info) => {
            debug!("scouted {} items", info.items.len());
            session.network_items.extend(info.items);
        }
        InboundPacket::Bounced(bounced) => {
            debug!("bounce for slots {:?} ignored", bounced.slots);
        }
        InboundPacket::RoomUpdate(update) => on_room_update(session, update),
        InboundPacket::Unknown { cmd } => warn!("Unknown command received: {}", cmd),
    }
    Ok(())
}

/// Connect request answering a RoomInfo
pub fn connect_request(session: &Session) -> OutboundPacket {
    let identity = &session.identity;
    OutboundPacket::Connect {
        game: String::new(),
        items_handling: 0,
        name: identity.slot_name.clone(),
        password: identity.password.clone(),
        slot_data: true,
        tags: vec![GAME_TAG.to_string(), identity.client_tag.clone()],
        uuid: identity.uuid,
        version: identity.version.clone(),
    }
}

fn on_room_info(session: &mut Session, info: RoomInfo) {
    info!(
        "room {} (server {}, hint cost {}%)",
        info.seed_name, info.version, info.hint_cost
    );
    session.seed_name = Some(info.seed_name);
    let request = connect_request(session);
    session.enqueue(request);
}

fn on_connected(session: &mut Session, connected: Connected) {
    session.set_status(ConnectionState::Connected);

    session.team_id = connected.team;
    session.slot_id = connected.slot;
    session.checked_locations = connected.checked_locations.iter().copied().collect();
    session.missing_locations = connected.missing_locations.iter().copied().collect();
    session.hint_points = Some(connected.hint_points);
    session.adopt_players(connected.players);

    info!(
        "connected as team {} slot {} ({} checked, {} missing)",
        connected.team,
        connected.slot,
        connected.checked_locations.len(),
        connected.missing_locations.len()
    );
    session.emit(SessionEvent::Connected {
        team: connected.team,
        slot: connected.slot,
    });

    // Subscribe to each key before reading it
    let hints_key = format!("_read_hints_{}_{}", connected.team, connected.slot);
    let settings_key = session.identity.settings_key();

    let mut scouted = connected.checked_locations.clone();
    scouted.extend_from_slice(&connected.missing_locations);

    let startup = [
        OutboundPacket::LocationChecks {
            locations: connected.checked_locations,
        },
        OutboundPacket::SetNotify {
            keys: vec![hints_key.clone()],
        },
        OutboundPacket::Get {
            keys: vec![hints_key],
        },
        OutboundPacket::SetNotify {
            keys: vec![settings_key.clone()],
        },
        OutboundPacket::Get {
            keys: vec![settings_key],
        },
        OutboundPacket::LocationScouts {
            locations: scouted,
            create_as_hint: 0,
        },
    ];
    for packet in startup {
        session.enqueue(packet);
    }
}

fn on_room_update(session: &mut Session, update: RoomUpdate) {
    if let Some(points) = update.hint_points {
        session.hint_points = Some(points);
    }
    if let Some(checked) = update.checked_locations {
        session.checked_locations = checked.into_iter().collect();
    }
}
