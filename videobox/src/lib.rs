//! Two-device camera control over a local discovery transport.
//!
//! One device takes the source role and owns the camera; the other takes
//! the controller role and drives it remotely. Once the peering layer
//! reports a connection, the two sides run a small cooperative handshake
//! over the transport's pub-sub primitive and the controller can start
//! and stop recordings on the source.

pub mod config;
pub mod control_message;
pub mod error;
pub mod notification;
pub mod protocol;
pub mod role;
pub mod ui;

pub use config::SessionConfig;
pub use control_message::ControlMessage;
pub use error::{Result, VideoBoxError};
pub use notification::Notification;
pub use protocol::{ControlProtocol, MessageHandler};
pub use role::{Role, RoleController};
pub use ui::{HostUi, Permission};
