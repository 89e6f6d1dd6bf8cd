//! The two I/O tasks behind a `Connection`: the receive path runs on the task
//! spawned by `connect`, the send path on a second task it spawns once the
//! socket is up. They share the connection's state and hand the receive-side
//! cipher over through a oneshot after the encryption response is flushed.

use crate::connection::{ConnectIntent, Connection, ConnectionError, Outbound, PacketHandler};
use crate::session::now_millis;
use quarry_protocol_core::{
    session_ciphers, ClientboundPacket, ConnectionState, Decryptor, FramedReader, FramedWriter,
    ServerboundPacket,
};
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

pub(crate) async fn run(
    conn: Connection,
    intent: ConnectIntent,
    handler: Arc<dyn PacketHandler>,
    outbound_rx: mpsc::Receiver<Outbound>,
) {
    let result = run_session(&conn, intent, handler, outbound_rx).await;
    // Still Connecting means the socket never came up
    let established = conn.state() != ConnectionState::Connecting;
    if let Err(e) = result {
        warn!("{}: connection failed: {}", conn.address(), e);
        conn.record_error(e);
    }
    conn.stop_tasks();

    let failed = match conn.last_error() {
        Some(e) if e.is_transport() => !established,
        Some(_) => true,
        None => false,
    };
    let final_state = if failed {
        ConnectionState::Failed
    } else {
        ConnectionState::Disconnected
    };
    if let Err(e) = conn.advance(final_state) {
        debug!("{}: {}", conn.address(), e);
    }
}

async fn run_session(
    conn: &Connection,
    intent: ConnectIntent,
    handler: Arc<dyn PacketHandler>,
    outbound_rx: mpsc::Receiver<Outbound>,
) -> Result<(), ConnectionError> {
    let mut shutdown = conn.shutdown_signal();
    let address = conn.address().clone();
    let settings = conn.settings().clone();

    let stream = tokio::select! {
        biased;
        _ = stopped(&mut shutdown) => {
            debug!("{}: disconnect requested while connecting", address);
            return Ok(());
        }
        res = timeout(
            settings.connect_timeout,
            TcpStream::connect((address.host.as_str(), address.port)),
        ) => match res {
            Ok(stream) => stream?,
            Err(_) => return Err(ConnectionError::ConnectTimeout(conn.address().clone())),
        },
    };
    stream.set_nodelay(true)?;
    let (read_half, write_half) = stream.into_split();

    if conn.advance(ConnectionState::Handshaking).is_err() {
        // disconnect() won the race with the socket
        return Ok(());
    }

    let (cipher_tx, cipher_rx) = oneshot::channel();
    let writer = FramedWriter::new(write_half, settings.max_packet_size);
    let writer_conn = conn.clone();
    let writer_task = tokio::spawn(async move {
        let shutdown = writer_conn.shutdown_signal();
        if let Err(e) = write_loop(&writer_conn, writer, outbound_rx, cipher_tx, shutdown).await {
            debug!("{}: send path ended: {}", writer_conn.address(), e);
            writer_conn.record_error(e);
            writer_conn.stop_tasks();
        }
    });

    let mut opening = shutdown.clone();
    let result = async {
        tokio::select! {
            biased;
            _ = stopped(&mut opening) => return Ok(()),
            res = open_session(conn, &intent) => res?,
        }
        let reader = FramedReader::new(read_half, settings.max_packet_size);
        read_loop(conn, reader, handler, cipher_rx, shutdown).await
    }
    .await;

    conn.stop_tasks();
    if let Err(e) = writer_task.await {
        debug!("{}: send task aborted: {}", conn.address(), e);
    }
    result
}

/// Queue the handshake and the first packet of the requested state.
async fn open_session(conn: &Connection, intent: &ConnectIntent) -> Result<(), ConnectionError> {
    let target = intent.target_state();
    let protocol_version = match intent {
        // Status probes do not commit to a version
        ConnectIntent::Status => -1,
        ConnectIntent::Login { .. } => conn.version().protocol() as i32,
    };
    let address = conn.address();
    conn.send(ServerboundPacket::Handshake {
        protocol_version,
        server_address: address.host.clone(),
        server_port: address.port,
        next_state: target.handshake_next().unwrap_or_default(),
    })
    .await?;
    if conn.advance(target).is_err() {
        return Ok(());
    }

    match intent {
        ConnectIntent::Status => {
            conn.send(ServerboundPacket::StatusRequest).await?;
            conn.send(ServerboundPacket::StatusPing {
                payload: now_millis(),
            })
            .await?;
        }
        ConnectIntent::Login { username } => {
            conn.send(ServerboundPacket::LoginStart {
                name: username.clone(),
            })
            .await?;
        }
    }
    Ok(())
}

async fn read_loop(
    conn: &Connection,
    mut reader: FramedReader<OwnedReadHalf>,
    handler: Arc<dyn PacketHandler>,
    cipher_rx: oneshot::Receiver<Decryptor>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ConnectionError> {
    let protocol = conn.version().protocol();
    let read_timeout = conn.settings().read_timeout;
    let mut cipher_rx = Some(cipher_rx);

    loop {
        let frame = tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => return Ok(()),
            res = timeout(read_timeout, reader.read_frame()) => match res {
                Ok(Ok(Some(frame))) => frame,
                Ok(Ok(None)) => {
                    debug!("{}: server closed the connection", conn.address());
                    return Ok(());
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(ConnectionError::ReadTimeout(read_timeout)),
            },
        };

        let state = conn.state();
        if !state.is_connected() {
            return Ok(());
        }
        let packet = match conn.adapter().decode_clientbound(state, protocol, frame) {
            Ok(packet) => packet,
            Err(e) if e.is_fatal(state) => return Err(e.into()),
            Err(e) => {
                warn!("{}: dropping packet in {}: {}", conn.address(), state, e);
                continue;
            }
        };
        trace!("{}: received {:?}", conn.address(), packet.kind());

        let awaits_cipher = matches!(packet, ClientboundPacket::EncryptionRequest { .. });
        match &packet {
            ClientboundPacket::LoginSetCompression { threshold }
            | ClientboundPacket::SetCompression { threshold } => {
                conn.set_compression(*threshold);
                reader.set_compression(*threshold);
            }
            ClientboundPacket::LoginSuccess { .. } => {
                if conn.advance(ConnectionState::Play).is_err() {
                    // disconnecting
                    return Ok(());
                }
            }
            _ => {}
        }

        handler.handle_packet(conn, packet)?;

        if awaits_cipher {
            // Everything after the request is enciphered; wait for the send
            // path to flush our response and hand over the matching cipher.
            let Some(rx) = cipher_rx.take() else {
                continue;
            };
            let decryptor = tokio::select! {
                biased;
                _ = stopped(&mut shutdown) => return Ok(()),
                res = timeout(read_timeout, rx) => match res {
                    Ok(Ok(decryptor)) => decryptor,
                    Ok(Err(_)) => return Err(ConnectionError::Closed),
                    Err(_) => return Err(ConnectionError::ReadTimeout(read_timeout)),
                },
            };
            reader.enable_decryption(decryptor);
            debug!("{}: receive cipher enabled", conn.address());
        }
    }
}

async fn write_loop(
    conn: &Connection,
    mut writer: FramedWriter<OwnedWriteHalf>,
    mut outbound_rx: mpsc::Receiver<Outbound>,
    cipher_tx: oneshot::Sender<Decryptor>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ConnectionError> {
    let mut cipher_tx = Some(cipher_tx);
    loop {
        let outbound = tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => break,
            next = outbound_rx.recv() => match next {
                Some(outbound) => outbound,
                None => break,
            },
        };

        writer.set_compression(conn.compression_threshold());
        tokio::select! {
            biased;
            _ = stopped(&mut shutdown) => {
                // The socket is going away; the partial frame goes with it
                debug!("{}: dropping {:?} mid-write", conn.address(), outbound.kind);
                return Ok(());
            }
            res = writer.write_frame(&outbound.body) => res?,
        }
        trace!("{}: sent {:?}", conn.address(), outbound.kind);

        if let Some(secret) = outbound.secret {
            let (encryptor, decryptor) = session_ciphers(&secret);
            writer.enable_encryption(encryptor);
            conn.mark_encrypted();
            debug!("{}: send cipher enabled", conn.address());
            match cipher_tx.take() {
                Some(tx) => {
                    let _ = tx.send(decryptor);
                }
                None => warn!("{}: second encryption response ignored", conn.address()),
            }
        }
    }
    let _ = writer.shutdown().await;
    Ok(())
}

/// Resolves once shutdown has been requested, including before this call.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
