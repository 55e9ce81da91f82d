#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection refused: {}", .diagnostics.join("; "))]
    ConnectionRefused { diagnostics: Vec<String> },

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("malformed {cmd} frame: {reason}")]
    MalformedFrame { cmd: String, reason: String },

    #[error("failed to encode frame: {0}")]
    Encode(String),

    #[error("disconnected: {reason}")]
    Disconnected { reason: String },

    #[error("not connected")]
    NotConnected,

    #[error("idle timer unavailable: {0}")]
    Telemetry(String),

    #[error("platform '{os}' has no idle timer reader, pass --timer-file")]
    UnsupportedPlatform { os: String },

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    pub(crate) fn malformed(cmd: &str, reason: impl ToString) -> Self {
        Self::MalformedFrame {
            cmd: cmd.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
