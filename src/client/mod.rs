pub mod session;
pub mod events;
pub mod dispatch;
pub mod hints;
pub mod driver;

pub use session::{Session, ClientBuilder, ClientConfig, Identity};
pub use events::{SessionEvent, EventHandler, EventCollector};
pub use dispatch::apply;
pub use hints::request_hint;
pub use driver::{Client, run};
