use crate::config::NetworkSettings;
use crate::network;
use bytes::BytesMut;
use quarry_protocol_core::{
    AtomicState, ClientboundPacket, ConnectionState, FrameError, InvalidTransition, Packet,
    ProtocolAdapter, ProtocolError, ProtocolVersion, ServerboundKind, ServerboundPacket,
};
use quarry_types::ServerAddress;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Notify};
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(ServerAddress),
    #[error("Nothing received for {0:?}")]
    ReadTimeout(Duration),
    #[error("Connection closed")]
    Closed,
    #[error("Outbound queue is full")]
    QueueFull,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("Key exchange failed: {0}")]
    Crypto(String),
}

impl ConnectionError {
    /// Socket-level failures, as opposed to a desynced or rejected stream.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ConnectionError::Io(_)
                | ConnectionError::ConnectTimeout(_)
                | ConnectionError::ReadTimeout(_)
                | ConnectionError::Closed
        )
    }
}

impl From<FrameError> for ConnectionError {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Io(e) => ConnectionError::Io(e),
            e => ConnectionError::Protocol(ProtocolError::Frame(e)),
        }
    }
}

/// What the handshake asks the server for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectIntent {
    Status,
    Login { username: String },
}

impl ConnectIntent {
    pub fn target_state(&self) -> ConnectionState {
        match self {
            ConnectIntent::Status => ConnectionState::Status,
            ConnectIntent::Login { .. } => ConnectionState::Login,
        }
    }
}

/// Receives every decoded clientbound packet, in wire order, on the
/// connection's receive task. Returning an error fails the connection.
pub trait PacketHandler: Send + Sync + 'static {
    fn handle_packet(
        &self,
        connection: &Connection,
        packet: ClientboundPacket,
    ) -> Result<(), ConnectionError>;
}

/// An encoded serverbound frame body waiting for the send task.
pub(crate) struct Outbound {
    pub kind: ServerboundKind,
    pub body: BytesMut,
    /// Set on the encryption response: the cipher starts after this frame.
    pub secret: Option<[u8; 16]>,
}

struct Shared {
    address: ServerAddress,
    version: ProtocolVersion,
    adapter: Arc<dyn ProtocolAdapter>,
    settings: NetworkSettings,
    state: AtomicState,
    state_changed: Notify,
    compression: AtomicI32,
    encrypted: AtomicBool,
    outbound_tx: mpsc::Sender<Outbound>,
    outbound_rx: Mutex<Option<mpsc::Receiver<Outbound>>>,
    shutdown: watch::Sender<bool>,
    last_error: Mutex<Option<Arc<ConnectionError>>>,
}

/// Handle to one client connection. Cheap to clone; all clones refer to the
/// same socket, state and outbound queue.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("address", &self.shared.address)
            .field("version", &self.shared.version)
            .field("state", &self.state())
            .finish()
    }
}

impl Connection {
    pub fn new(
        address: ServerAddress,
        version: ProtocolVersion,
        adapter: Arc<dyn ProtocolAdapter>,
        settings: NetworkSettings,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(settings.outbound_queue.max(1));
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                address,
                version,
                adapter,
                settings,
                state: AtomicState::new(ConnectionState::Disconnected),
                state_changed: Notify::new(),
                compression: AtomicI32::new(-1),
                encrypted: AtomicBool::new(false),
                outbound_tx,
                outbound_rx: Mutex::new(Some(outbound_rx)),
                shutdown,
                last_error: Mutex::new(None),
            }),
        }
    }

    /// Start connecting in the background. Must be called from within a
    /// tokio runtime. A connection is single use: returns `false` without
    /// doing anything if this one was already started.
    pub fn connect(&self, intent: ConnectIntent, handler: Arc<dyn PacketHandler>) -> bool {
        let outbound_rx = match self.shared.outbound_rx.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(outbound_rx) = outbound_rx else {
            debug!("{}: connect ignored in state {}", self.shared.address, self.state());
            return false;
        };
        if let Err(e) = self.advance(ConnectionState::Connecting) {
            debug!("{}: connect ignored: {}", self.shared.address, e);
            return false;
        }
        tokio::spawn(network::run(self.clone(), intent, handler, outbound_rx));
        true
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.load()
    }

    pub fn address(&self) -> &ServerAddress {
        &self.shared.address
    }

    pub fn version(&self) -> ProtocolVersion {
        self.shared.version
    }

    pub fn adapter(&self) -> &Arc<dyn ProtocolAdapter> {
        &self.shared.adapter
    }

    pub fn settings(&self) -> &NetworkSettings {
        &self.shared.settings
    }

    /// Current compression threshold, `-1` while disabled.
    pub fn compression_threshold(&self) -> i32 {
        self.shared.compression.load(Ordering::Acquire)
    }

    pub fn is_encrypted(&self) -> bool {
        self.shared.encrypted.load(Ordering::Acquire)
    }

    /// The error that ended the connection. A transport error on an
    /// established session is recorded here even though the connection
    /// ends `Disconnected`.
    pub fn last_error(&self) -> Option<Arc<ConnectionError>> {
        match self.shared.last_error.lock() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Queue a packet, waiting for room in the outbound queue.
    pub async fn send(&self, packet: ServerboundPacket) -> Result<(), ConnectionError> {
        let outbound = self.prepare(packet)?;
        self.shared
            .outbound_tx
            .send(outbound)
            .await
            .map_err(|_| ConnectionError::Closed)
    }

    /// Queue a packet without waiting. Used from packet handlers, which run
    /// on the receive task and must not block it.
    pub fn try_send(&self, packet: ServerboundPacket) -> Result<(), ConnectionError> {
        let outbound = self.prepare(packet)?;
        self.shared
            .outbound_tx
            .try_send(outbound)
            .map_err(|e| match e {
                TrySendError::Full(_) => ConnectionError::QueueFull,
                TrySendError::Closed(_) => ConnectionError::Closed,
            })
    }

    /// Encode now so a packet the negotiated version lacks is rejected here
    /// instead of on the send task.
    fn prepare(&self, packet: ServerboundPacket) -> Result<Outbound, ConnectionError> {
        if !self.state().is_connected() {
            return Err(ConnectionError::Closed);
        }
        let kind = packet.kind();
        let secret = packet.activates_encryption();
        let body = self
            .shared
            .adapter
            .encode(&Packet::Serverbound(packet), self.shared.version.protocol())?;
        Ok(Outbound { kind, body, secret })
    }

    /// Ask both I/O tasks to stop, abandoning any frame still being
    /// written. The connection ends `Disconnected` unless a protocol error
    /// was already recorded.
    pub fn disconnect(&self) {
        let state = self.state();
        if state.is_terminal() {
            return;
        }
        if state != ConnectionState::Disconnecting {
            let _ = self.advance(ConnectionState::Disconnecting);
        }
        self.shared.shutdown.send_replace(true);
    }

    /// Wait until the connection reaches `Disconnected` or `Failed`. A
    /// connection that was never started is already `Disconnected`.
    pub async fn closed(&self) -> ConnectionState {
        loop {
            let notified = self.shared.state_changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let state = self.state();
            if state.is_terminal() {
                return state;
            }
            notified.await;
        }
    }

    pub(crate) fn advance(&self, next: ConnectionState) -> Result<ConnectionState, InvalidTransition> {
        let from = self.shared.state.advance(next)?;
        debug!("{}: {} -> {}", self.shared.address, from, next);
        self.shared.state_changed.notify_waiters();
        Ok(from)
    }

    pub(crate) fn set_compression(&self, threshold: i32) {
        let previous = self.shared.compression.swap(threshold, Ordering::AcqRel);
        if previous != threshold {
            debug!(
                "{}: compression threshold {} -> {}",
                self.shared.address, previous, threshold
            );
        }
    }

    pub(crate) fn mark_encrypted(&self) {
        self.shared.encrypted.store(true, Ordering::Release);
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shared.shutdown.subscribe()
    }

    pub(crate) fn stop_tasks(&self) {
        self.shared.shutdown.send_replace(true);
    }

    /// Keep the first error; later ones are usually fallout from it.
    pub(crate) fn record_error(&self, error: ConnectionError) {
        let mut slot = match self.shared.last_error.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if slot.is_none() {
            *slot = Some(Arc::new(error));
        } else {
            debug!("{}: suppressed follow-up error: {}", self.shared.address, error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_protocol_versions::versions::V1_14_4;
    use quarry_protocol_versions::ProtocolTables;

    struct Ignore;

    impl PacketHandler for Ignore {
        fn handle_packet(&self, _: &Connection, _: ClientboundPacket) -> Result<(), ConnectionError> {
            Ok(())
        }
    }

    fn connection() -> Connection {
        let tables = ProtocolTables::shared().unwrap();
        Connection::new(
            ServerAddress::new("127.0.0.1", 1),
            V1_14_4,
            tables,
            NetworkSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_fresh_connection_is_idle() {
        let conn = connection();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert_eq!(conn.compression_threshold(), -1);
        assert!(!conn.is_encrypted());
        assert!(conn.last_error().is_none());
        assert_eq!(conn.closed().await, ConnectionState::Disconnected);
        // Nothing to disconnect from yet
        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_send_before_connect_is_rejected() {
        let conn = connection();
        let result = conn.try_send(ServerboundPacket::KeepAlive { id: 1 });
        assert!(matches!(result, Err(ConnectionError::Closed)));
    }

    #[tokio::test]
    async fn test_second_connect_is_ignored() {
        let conn = connection();
        let handler: Arc<dyn PacketHandler> = Arc::new(Ignore);
        assert!(conn.connect(ConnectIntent::Status, handler.clone()));
        assert!(!conn.connect(ConnectIntent::Status, handler));
        conn.disconnect();
        assert!(conn.closed().await.is_terminal());
        // Still single use after it ended
        assert!(!conn.connect(ConnectIntent::Status, Arc::new(Ignore)));
    }

    #[test]
    fn test_frame_io_errors_are_transport_errors() {
        let reset = std::io::Error::from(std::io::ErrorKind::ConnectionReset);
        let error = ConnectionError::from(FrameError::Io(reset));
        assert!(matches!(error, ConnectionError::Io(_)));
        assert!(error.is_transport());

        let error = ConnectionError::from(FrameError::VarIntTooLong);
        assert!(matches!(
            error,
            ConnectionError::Protocol(ProtocolError::Frame(FrameError::VarIntTooLong))
        ));
        assert!(!error.is_transport());
        assert!(!ConnectionError::QueueFull.is_transport());
    }

    #[test]
    fn test_intent_target_states() {
        assert_eq!(ConnectIntent::Status.target_state(), ConnectionState::Status);
        let login = ConnectIntent::Login {
            username: "quarry".into(),
        };
        assert_eq!(login.target_state(), ConnectionState::Login);
        assert_eq!(login.target_state().handshake_next(), Some(2));
    }
}
