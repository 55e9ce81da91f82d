use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use indexmap::{IndexMap, IndexSet};
use rand::Rng;
use serde_json::Value;
use tracing::{info, warn};

use crate::client::events::{EventCollector, EventHandler, SessionEvent};
use crate::protocol::{ConnectionState, NetworkItem, NetworkPlayer, NetworkVersion, OutboundPacket};

pub const DEFAULT_HOST: &str = "archipelago.gg";
pub const DEFAULT_CLIENT_TAG: &str = "APNothing";

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub slot_name: String,
    pub password: String,
    /// Use wss:// instead of ws://
    pub secure: bool,
    pub receive_timeout: Duration,
    pub handshake_timeout: Duration,
    pub client_tag: String,
    pub version: NetworkVersion,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16, slot_name: impl Into<String>) -> Self {
        let host = host.into();
        Self {
            host: if host.is_empty() { DEFAULT_HOST.into() } else { host },
            port,
            slot_name: slot_name.into(),
            password: String::new(),
            secure: true,
            receive_timeout: Duration::from_millis(100),
            handshake_timeout: Duration::from_secs(1),
            client_tag: DEFAULT_CLIENT_TAG.into(),
            version: NetworkVersion::new(0, 6, 1),
        }
    }

    pub fn url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Builder for creating client sessions
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new(host: impl Into<String>, port: u16, slot_name: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(host, port, slot_name),
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.receive_timeout = timeout;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

/// Who we are to the server
#[derive(Debug, Clone)]
pub struct Identity {
    pub slot_name: String,
    pub password: String,
    /// Random 10-digit id, stable for the process lifetime
    pub uuid: u64,
    pub version: NetworkVersion,
    pub client_tag: String,
}

impl Identity {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            slot_name: config.slot_name.clone(),
            password: config.password.clone(),
            uuid: rand::rng().random_range(1_000_000_000..=9_999_999_999),
            version: config.version.clone(),
            client_tag: config.client_tag.clone(),
        }
    }

    /// Remote key holding this client's settings
    pub fn settings_key(&self) -> String {
        format!("{}_Settings", self.client_tag)
    }
}

/// Session state for one server connection
#[derive(Debug)]
pub struct Session {
    status: ConnectionState,
    pub identity: Identity,

    pub team_id: i64,
    pub slot_id: i64,

    pub checked_locations: IndexSet<i64>,
    pub missing_locations: IndexSet<i64>,

    /// Roster keyed by slot
    pub players: IndexMap<i64, NetworkPlayer>,
    pub network_items: Vec<NetworkItem>,
    pub remote_keys: HashMap<String, Value>,

    /// Server-side hint point balance, once known
    pub hint_points: Option<i64>,
    /// Hints earned by idling and not yet requested
    pub hint_credits: u32,

    /// Seed of the room we joined, from RoomInfo
    pub seed_name: Option<String>,

    outgoing: VecDeque<OutboundPacket>,
    events: EventCollector,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            status: ConnectionState::Disconnected,
            identity,
            team_id: -1,
            slot_id: -1,
            checked_locations: IndexSet::new(),
            missing_locations: IndexSet::new(),
            players: IndexMap::new(),
            network_items: Vec::new(),
            remote_keys: HashMap::new(),
            hint_points: None,
            hint_credits: 0,
            seed_name: None,
            outgoing: VecDeque::new(),
            events: EventCollector::new(),
        }
    }

    pub fn status(&self) -> ConnectionState {
        self.status
    }

    /// Move to `next`, logging transitions outside the lifecycle
    pub fn set_status(&mut self, next: ConnectionState) {
        if self.status == next {
            return;
        }
        if !self.status.can_transition_to(next) {
            warn!("unexpected state transition {:?} -> {:?}", self.status, next);
        }
        info!("session state {:?} -> {:?}", self.status, next);
        self.status = next;
    }

    /// Tear the session down after a fatal error
    pub fn disconnect(&mut self, reason: impl Into<String>) {
        if self.status == ConnectionState::Disconnected {
            return;
        }
        self.set_status(ConnectionState::Disconnecting);
        self.set_status(ConnectionState::Disconnected);
        self.emit(SessionEvent::Disconnected { reason: reason.into() });
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_authenticated()
    }

    /// Queue a request for a later tick
    pub fn enqueue(&mut self, packet: OutboundPacket) {
        self.outgoing.push_back(packet);
    }

    pub fn dequeue(&mut self) -> Option<OutboundPacket> {
        self.outgoing.pop_front()
    }

    /// Pending requests, oldest first
    pub fn queued(&self) -> impl Iterator<Item = &OutboundPacket> {
        self.outgoing.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.outgoing.len()
    }

    pub fn emit(&mut self, event: SessionEvent) {
        self.events.on_event(event);
    }

    /// Drain pending events
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain()
    }

    /// Replace the roster, indexing players by slot
    pub fn adopt_players(&mut self, players: Vec<NetworkPlayer>) {
        self.players = players.into_iter().map(|p| (p.slot, p)).collect();
    }

    /// Display name for a slot
    pub fn player_name(&self, slot: i64) -> Option<&str> {
        self.players.get(&slot).map(|p| p.name.as_str())
    }
}
