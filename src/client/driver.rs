use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error};

use crate::client::dispatch;
use crate::client::events::SessionEvent;
use crate::client::hints;
use crate::client::session::{ClientConfig, Identity, Session};
use crate::error::{Error, Result};
use crate::protocol::{decode_frames, encode_frames, ConnectionState, Transport, WebSocketTransport};
use crate::telemetry::{MilestoneTracker, TimerSource};

/// Session driver: owns the transport and ticks the session
pub struct Client<T> {
    session: Session,
    transport: T,
    receive_timeout: Duration,
    rng: StdRng,
}

impl Client<WebSocketTransport> {
    /// Open the websocket and process the server's greeting
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let mut session = Session::new(Identity::new(&config));
        session.set_status(ConnectionState::SocketConnecting);

        let url = config.url();
        debug!("connecting to {}", url);
        let transport = match WebSocketTransport::connect(&url).await {
            Ok(transport) => transport,
            Err(e) => {
                session.disconnect(e.to_string());
                return Err(e);
            }
        };

        let mut client = Self::new(session, transport, config.receive_timeout);
        client.session.set_status(ConnectionState::Connecting);
        client.receive(config.handshake_timeout).await?;
        Ok(client)
    }
}

impl<T: Transport> Client<T> {
    pub fn new(session: Session, transport: T, receive_timeout: Duration) -> Self {
        Self {
            session,
            transport,
            receive_timeout,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replace the hint selection rng
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn add_hint_credits(&mut self, credits: u32) {
        self.session.hint_credits += credits;
    }

    /// One tick: maybe queue a hint, send at most one request, then
    /// receive and dispatch whatever arrived.
    ///
    /// Requests queued while dispatching go out on a later tick.
    pub async fn tick(&mut self) -> Result<()> {
        if !self.session.status().is_active() {
            return Err(Error::NotConnected);
        }

        hints::request_hint(&mut self.session, &mut self.rng);

        if let Some(request) = self.session.dequeue() {
            debug!("sending {} ({} still queued)", request.cmd(), self.session.queue_len());
            let message = encode_frames(std::slice::from_ref(&request))?;
            let sent = self.transport.send(message).await;
            self.fail_on_error(sent)?;
        }

        self.receive(self.receive_timeout).await
    }

    async fn receive(&mut self, timeout: Duration) -> Result<()> {
        let received = self.transport.recv_timeout(timeout).await;
        let Some(message) = self.fail_on_error(received)? else {
            return Ok(());
        };

        let packets = self.fail_on_error(decode_frames(&message))?;
        for packet in packets {
            let applied = dispatch::apply(&mut self.session, packet);
            self.fail_on_error(applied)?;
        }
        Ok(())
    }

    fn fail_on_error<V>(&mut self, result: Result<V>) -> Result<V> {
        if let Err(e) = &result {
            error!("session failed: {}", e);
            self.session.disconnect(e.to_string());
        }
        result
    }

    /// Drain pending events
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.session.drain_events()
    }
}

/// Tick forever, feeding idle-timer credits into the session.
///
/// Returns only on a fatal error.
pub async fn run<T, S, F>(
    client: &mut Client<T>,
    idle: &mut MilestoneTracker<S>,
    mut on_event: F,
) -> Result<()>
where
    T: Transport,
    S: TimerSource,
    F: FnMut(SessionEvent),
{
    loop {
        let ticked = client.tick().await;
        client.drain_events().into_iter().for_each(&mut on_event);
        ticked?;

        let earned = idle.poll()?;
        for _ in 0..earned {
            on_event(SessionEvent::HintEarned);
        }
        client.add_hint_credits(earned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use serde_json::{json, Value};

    use crate::protocol::OutboundPacket;

    /// In-memory transport: scripted replies, recorded sends
    #[derive(Default)]
    struct ScriptedTransport {
        incoming: VecDeque<Option<String>>,
        sent: Vec<String>,
    }

    impl ScriptedTransport {
        fn reply(mut self, frames: Value) -> Self {
            self.incoming.push_back(Some(frames.to_string()));
            self
        }

        fn silence(mut self) -> Self {
            self.incoming.push_back(None);
            self
        }

        fn sent_cmds(&self) -> Vec<String> {
            self.sent
                .iter()
                .map(|msg| {
                    let frames: Vec<Value> = serde_json::from_str(msg).unwrap();
                    assert_eq!(frames.len(), 1);
                    frames[0]["cmd"].as_str().unwrap().to_string()
                })
                .collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&mut self, message: String) -> Result<()> {
            self.sent.push(message);
            Ok(())
        }

        async fn recv_timeout(&mut self, _timeout: Duration) -> Result<Option<String>> {
            Ok(self.incoming.pop_front().flatten())
        }
    }

    fn client(transport: ScriptedTransport) -> Client<ScriptedTransport> {
        let config = ClientConfig::new("localhost", 38281, "Runner");
        let mut session = Session::new(Identity::new(&config));
        session.set_status(ConnectionState::SocketConnecting);
        session.set_status(ConnectionState::Connecting);
        Client::new(session, transport, Duration::ZERO).with_rng(StdRng::seed_from_u64(9))
    }

    fn room_info() -> Value {
        json!([{
            "cmd": "RoomInfo",
            "password": false,
            "games": ["Nothing"],
            "tags": [],
            "version": {"major": 0, "minor": 6, "build": 1, "class": "Version"},
            "generator_version": {"major": 0, "minor": 6, "build": 1, "class": "Version"},
            "permissions": {},
            "hint_cost": 10,
            "location_check_points": 1,
            "datapackage_checksums": {},
            "seed_name": "seed",
            "time": "0"
        }])
    }

    fn connected() -> Value {
        json!([{
            "cmd": "Connected",
            "team": 0,
            "slot": 1,
            "missing_locations": [3, 4],
            "checked_locations": [1, 2],
            "slot_info": {},
            "hint_points": 0,
            "slot_data": {},
            "players": [{"class": "NetworkPlayer", "team": 0, "slot": 1, "alias": "R", "name": "Runner"}]
        }])
    }

    #[tokio::test]
    async fn test_handshake_sends_one_request_per_tick() {
        let transport = ScriptedTransport::default().reply(room_info()).silence().reply(connected());
        let mut client = client(transport);

        // Tick 1: nothing queued yet, RoomInfo arrives and arms Connect
        client.tick().await.unwrap();
        assert!(client.transport().sent.is_empty());
        assert_eq!(client.session().queue_len(), 1);

        // Tick 2: Connect goes out
        client.tick().await.unwrap();
        assert_eq!(client.transport().sent_cmds(), vec!["Connect"]);

        // Tick 3: queue empty, Connected arrives and queues six requests
        client.tick().await.unwrap();
        assert_eq!(client.transport().sent.len(), 1);
        assert_eq!(client.session().status(), ConnectionState::Connected);
        assert_eq!(client.session().queue_len(), 6);

        for _ in 0..6 {
            client.tick().await.unwrap();
        }
        assert_eq!(
            client.transport().sent_cmds(),
            vec!["Connect", "LocationChecks", "SetNotify", "Get", "SetNotify", "Get", "LocationScouts"]
        );
        assert_eq!(client.session().queue_len(), 0);
        assert_eq!(
            client.drain_events(),
            vec![SessionEvent::Connected { team: 0, slot: 1 }]
        );
    }

    #[tokio::test]
    async fn test_hint_credit_spent_after_scouting() {
        let transport = ScriptedTransport::default()
            .reply(connected())
            .reply(json!([{
                "cmd": "LocationInfo",
                "locations": [
                    {"class": "NetworkItem", "item": 50, "location": 3, "player": 1, "flags": 1},
                    {"class": "NetworkItem", "item": 51, "location": 4, "player": 1, "flags": 0}
                ]
            }]));
        let mut client = client(transport);

        client.tick().await.unwrap();
        client.tick().await.unwrap();
        assert_eq!(client.session().network_items.len(), 2);

        while client.session().queue_len() > 0 {
            client.tick().await.unwrap();
        }
        client.add_hint_credits(1);
        client.tick().await.unwrap();

        assert_eq!(client.session().hint_credits, 0);
        let last: Vec<OutboundPacket> =
            serde_json::from_str(client.transport().sent.last().unwrap()).unwrap();
        assert_eq!(
            last,
            vec![OutboundPacket::LocationScouts { locations: vec![3], create_as_hint: 1 }]
        );
    }

    #[tokio::test]
    async fn test_refusal_disconnects() {
        let transport = ScriptedTransport::default()
            .reply(json!([{"cmd": "ConnectionRefused", "errors": ["InvalidSlot"]}]));
        let mut client = client(transport);

        let err = client.tick().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionRefused { .. }));
        assert_eq!(client.session().status(), ConnectionState::Disconnected);
        assert!(matches!(client.tick().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_malformed_frame_is_fatal() {
        let transport = ScriptedTransport::default().reply(json!([{"cmd": "Connected", "team": 0}]));
        let mut client = client(transport);

        assert!(matches!(client.tick().await, Err(Error::MalformedFrame { .. })));
        assert_eq!(client.session().status(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_timeout_and_unknown_commands_keep_running() {
        let transport = ScriptedTransport::default()
            .silence()
            .reply(json!([]))
            .reply(json!([{"cmd": "DataPackage", "data": {}}]));
        let mut client = client(transport);

        for _ in 0..3 {
            client.tick().await.unwrap();
        }
        assert_eq!(client.session().status(), ConnectionState::Connecting);
    }

    #[test]
    fn test_run_stops_on_idle_timer_failure() {
        struct Broken;
        impl TimerSource for Broken {
            fn read_seconds(&mut self) -> Result<f32> {
                Err(Error::Telemetry("gone".into()))
            }
        }

        let mut client = client(ScriptedTransport::default());
        let mut idle = MilestoneTracker::new(Broken, 300);
        let mut events = Vec::new();

        let result = tokio_test::block_on(run(&mut client, &mut idle, |e| events.push(e)));
        assert!(matches!(result, Err(Error::Telemetry(_))));
        assert!(events.is_empty());
    }

    #[test]
    fn test_run_turns_idle_milestones_into_credits() {
        struct Samples(VecDeque<f32>);
        impl TimerSource for Samples {
            fn read_seconds(&mut self) -> Result<f32> {
                self.0
                    .pop_front()
                    .ok_or_else(|| Error::Telemetry("out of samples".into()))
            }
        }

        // Not yet authenticated, so the credit is banked rather than spent
        let mut client = client(ScriptedTransport::default());
        let mut idle = MilestoneTracker::new(Samples(VecDeque::from([0.0, 6.0])), 5);
        let mut events = Vec::new();

        let result = tokio_test::block_on(run(&mut client, &mut idle, |e| events.push(e)));
        assert!(matches!(result, Err(Error::Telemetry(_))));
        assert_eq!(events, vec![SessionEvent::HintEarned]);
        assert_eq!(client.session().hint_credits, 1);
        assert!(client.transport().sent.is_empty());
    }
}
