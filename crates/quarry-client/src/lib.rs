//! Client connection engine: the per-connection I/O tasks, the default login
//! session, key exchange and configuration.

pub mod config;
pub mod connection;
pub mod crypto;
mod network;
pub mod session;
pub mod status;

pub use config::{ClientConfig, NetworkSettings};
pub use connection::{ConnectIntent, Connection, ConnectionError, PacketHandler};
pub use session::{Session, SessionEvent};
pub use status::ServerStatus;
