pub mod adapter;
pub mod cipher;
pub mod codec;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod packets;
pub mod registry;
pub mod state;
pub mod transport;
pub mod version;
pub mod versioned;

pub use adapter::ProtocolAdapter;
pub use cipher::{session_ciphers, Cfb8Cipher, Decryptor, Encryptor};
pub use codec::*;
pub use error::{InvalidTransition, ProtocolError, RegistryError};
pub use frame::{FrameCodec, FrameError, DEFAULT_MAX_PACKET_SIZE};
pub use metadata::*;
pub use packets::*;
pub use registry::{PacketRegistry, RegistryBuilder};
pub use state::{AtomicState, ConnectionState};
pub use transport::{FramedReader, FramedWriter};
pub use version::{ProtocolVersion, VersionRegistry};
pub use versioned::VersionedValue;
