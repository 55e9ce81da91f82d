pub mod packet;
pub mod message;
pub mod transport;
pub mod connection;

pub use packet::{
    InboundCommand, InboundPacket, OutboundPacket,
    ItemType, NetworkItem, NetworkPlayer, NetworkVersion,
    RoomInfo, ConnectionRefused, Connected, Retrieved, LocationInfo, Bounced, RoomUpdate,
    decode_frame, decode_frames, encode_frame, encode_frames, GAME_TAG,
};
pub use message::{PrintJson, PrintJsonKind, JsonMessagePart};
pub use transport::{Transport, WebSocketTransport};
pub use connection::ConnectionState;
