/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected to any server
    #[default]
    Disconnected,
    /// Opening the websocket
    SocketConnecting,
    /// Socket open, waiting for RoomInfo and the Connect handshake
    Connecting,
    /// Authenticated for the selected slot
    Connected,
    /// Actively playing (never entered by the commands handled here)
    Playing,
    /// Tearing down after a fatal error
    Disconnecting,
}

impl ConnectionState {
    /// Whether a transition from `self` to `next` is part of the lifecycle
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Disconnected, SocketConnecting) => true,
            (SocketConnecting, Connecting) => true,
            (Connecting | Connected | Playing, Connected) => true,
            (Connected, Playing) => true,
            (Disconnecting, Disconnected) => true,
            (Disconnecting, Disconnecting) => false,
            (_, Disconnecting) => true,
            _ => false,
        }
    }

    /// States in which the tick loop runs
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Playing)
    }

    /// States in which hints may be requested
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Connected | Self::Playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        use ConnectionState::*;
        assert!(Disconnected.can_transition_to(SocketConnecting));
        assert!(SocketConnecting.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Connected));
        assert!(Connected.can_transition_to(Playing));
        assert!(Playing.can_transition_to(Disconnecting));
        assert!(Disconnecting.can_transition_to(Disconnected));

        assert!(!Disconnected.can_transition_to(Connected));
        assert!(!Connected.can_transition_to(Disconnected));
    }

    #[test]
    fn test_connected_and_playing_behave_alike() {
        assert!(ConnectionState::Connected.is_authenticated());
        assert!(ConnectionState::Playing.is_authenticated());
        assert!(!ConnectionState::Connecting.is_authenticated());
        assert!(ConnectionState::Connecting.is_active());
        assert!(!ConnectionState::Disconnected.is_active());
    }
}
