use crate::error::InvalidTransition;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Handshaking = 2,
    Status = 3,
    Login = 4,
    Play = 5,
    Disconnecting = 6,
    Failed = 7,
}

impl ConnectionState {
    pub fn from_handshake_next(next: i32) -> Option<Self> {
        match next {
            1 => Some(ConnectionState::Status),
            2 => Some(ConnectionState::Login),
            _ => None,
        }
    }

    /// The `next_state` value a handshake carries to request this state.
    pub fn handshake_next(self) -> Option<i32> {
        match self {
            ConnectionState::Status => Some(1),
            ConnectionState::Login => Some(2),
            _ => None,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Handshaking,
            3 => ConnectionState::Status,
            4 => ConnectionState::Login,
            5 => ConnectionState::Play,
            6 => ConnectionState::Disconnecting,
            7 => ConnectionState::Failed,
            _ => ConnectionState::Disconnected,
        }
    }

    /// States with a live socket and a packet table.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Handshaking
                | ConnectionState::Status
                | ConnectionState::Login
                | ConnectionState::Play
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }

    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Disconnected, Connecting) => true,
            (Connecting, Handshaking) => true,
            (Handshaking, Status | Login) => true,
            (Login, Play) => true,
            (Connecting | Handshaking | Status | Login | Play, Disconnecting) => true,
            (Connecting | Handshaking | Status | Login | Play | Disconnecting, Disconnected) => {
                true
            }
            (Connecting | Handshaking | Status | Login | Play | Disconnecting, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A `ConnectionState` shared between tasks. Every change is a validated
/// compare-and-swap, so both I/O paths observe a single linear history.
#[derive(Debug)]
pub struct AtomicState(AtomicU8);

impl AtomicState {
    pub fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` if that is a legal transition from the current state.
    /// Returns the previous state.
    pub fn advance(&self, next: ConnectionState) -> Result<ConnectionState, InvalidTransition> {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let from = ConnectionState::from_u8(current);
            if !from.can_transition_to(next) {
                return Err(InvalidTransition { from, to: next });
            }
            match self.0.compare_exchange_weak(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(from),
                Err(actual) => current = actual,
            }
        }
    }
}
