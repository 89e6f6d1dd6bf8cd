use crate::codec::CodecError;
use crate::frame::FrameError;
use crate::packets::{PacketDirection, PacketKind};
use crate::state::ConnectionState;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid state transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Defects in the static protocol tables. These surface while the tables are
/// built at startup, never on a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("No protocol versions registered")]
    NoVersions,
    #[error("Protocol {protocol} registered twice ({first} and {second})")]
    DuplicateVersion {
        protocol: u32,
        first: &'static str,
        second: &'static str,
    },
    #[error("Protocol {protocol}: {direction:?}/{state:?} id 0x{id:02X} assigned to both {existing:?} and {new:?}")]
    DuplicateId {
        protocol: u32,
        direction: PacketDirection,
        state: ConnectionState,
        id: i32,
        existing: PacketKind,
        new: PacketKind,
    },
    #[error("Protocol {protocol}: {kind:?} registered twice")]
    DuplicateKind { protocol: u32, kind: PacketKind },
    #[error("Protocol {protocol}: {direction:?} counter advanced before any packet was registered")]
    AdvanceWithoutState {
        protocol: u32,
        direction: PacketDirection,
    },
    #[error("No packet table covers protocol {0}")]
    MissingTable(u32),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown {direction:?} packet 0x{id:02X} in {state:?} (protocol {protocol})")]
    UnknownPacket {
        direction: PacketDirection,
        state: ConnectionState,
        id: i32,
        protocol: u32,
    },
    #[error("{kind:?} is not part of protocol {protocol}")]
    Unregistered { kind: PacketKind, protocol: u32 },
    #[error("Malformed {kind:?}: {source}")]
    Malformed {
        kind: PacketKind,
        #[source]
        source: CodecError,
    },
    #[error("{remaining} unread bytes after {kind:?}")]
    LeftoverBytes { kind: PacketKind, remaining: usize },
    #[error("Malformed packet header: {0}")]
    Header(#[source] CodecError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl ProtocolError {
    /// Whether this error must end a connection that is currently in `state`.
    ///
    /// Framing errors always desync the stream. Unknown or malformed packets
    /// are tolerated in Play, where servers and forks add packets freely, but
    /// not while negotiating.
    pub fn is_fatal(&self, state: ConnectionState) -> bool {
        match self {
            ProtocolError::Frame(_) => true,
            ProtocolError::Header(CodecError::VarIntTooLong) => true,
            ProtocolError::Unregistered { .. } => false,
            ProtocolError::UnknownPacket { .. }
            | ProtocolError::Malformed { .. }
            | ProtocolError::LeftoverBytes { .. }
            | ProtocolError::Header(_) => state != ConnectionState::Play,
        }
    }
}
