use bytes::BytesMut;
use quarry_client::{
    ConnectIntent, Connection, ConnectionError, NetworkSettings, Session, SessionEvent,
};
use quarry_protocol_core::{
    session_ciphers, write_varint, ClientboundKind, ClientboundPacket, ConnectionState,
    FramedReader, FramedWriter, Packet, ProtocolAdapter, ProtocolError, ProtocolVersion,
    ServerboundPacket,
};
use quarry_protocol_versions::versions::{V1_14_4, V1_8_9};
use quarry_protocol_versions::ProtocolTables;
use quarry_types::{GameProfile, ServerAddress};
use rsa::pkcs8::EncodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use uuid::Uuid;

const LIMIT: Duration = Duration::from_secs(10);

/// Copies every byte read from the socket, before any deciphering.
struct Recording<R> {
    inner: R,
    log: Arc<Mutex<Vec<u8>>>,
}

impl<R: AsyncRead + Unpin> AsyncRead for Recording<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = poll {
            let fresh = buf.filled()[before..].to_vec();
            self.log.lock().unwrap().extend_from_slice(&fresh);
        }
        poll
    }
}

struct FakeServer {
    reader: FramedReader<Recording<OwnedReadHalf>>,
    writer: FramedWriter<OwnedWriteHalf>,
    tables: Arc<ProtocolTables>,
    protocol: u32,
    received: Arc<Mutex<Vec<u8>>>,
}

impl FakeServer {
    async fn accept(listener: TcpListener, tables: Arc<ProtocolTables>, protocol: u32) -> Self {
        let (stream, _) = listener.accept().await.unwrap();
        Self::over(stream, tables, protocol)
    }

    fn over(stream: TcpStream, tables: Arc<ProtocolTables>, protocol: u32) -> Self {
        let (read_half, write_half) = stream.into_split();
        let received = Arc::new(Mutex::new(Vec::new()));
        let recording = Recording {
            inner: read_half,
            log: received.clone(),
        };
        Self {
            reader: FramedReader::new(recording, 1 << 21),
            writer: FramedWriter::new(write_half, 1 << 21),
            tables,
            protocol,
            received,
        }
    }

    async fn read(&mut self, state: ConnectionState) -> ServerboundPacket {
        let frame = self.reader.read_frame().await.unwrap().expect("client hung up");
        self.tables
            .decode_serverbound(state, self.protocol, frame)
            .unwrap()
    }

    async fn send(&mut self, packet: ClientboundPacket) {
        let body = self
            .tables
            .encode(&Packet::Clientbound(packet), self.protocol)
            .unwrap();
        self.writer.write_frame(&body).await.unwrap();
    }

    async fn send_raw(&mut self, body: &[u8]) {
        self.writer.write_frame(body).await.unwrap();
    }

    fn set_compression(&mut self, threshold: i32) {
        self.reader.set_compression(threshold);
        self.writer.set_compression(threshold);
    }

    /// Handshake plus login start; returns the advertised name.
    async fn expect_login(&mut self) -> String {
        match self.read(ConnectionState::Handshaking).await {
            ServerboundPacket::Handshake {
                protocol_version,
                next_state,
                ..
            } => {
                assert_eq!(protocol_version, self.protocol as i32);
                assert_eq!(next_state, 2);
            }
            other => panic!("expected handshake, got {:?}", other),
        }
        match self.read(ConnectionState::Login).await {
            ServerboundPacket::LoginStart { name } => name,
            other => panic!("expected login start, got {:?}", other),
        }
    }

    /// Wait for the client to close its side.
    async fn drain(&mut self) {
        while let Ok(Some(_)) = self.reader.read_frame().await {}
    }
}

async fn listen() -> (TcpListener, ServerAddress) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, ServerAddress::new("127.0.0.1", port))
}

fn settings() -> NetworkSettings {
    NetworkSettings {
        connect_timeout: Duration::from_secs(2),
        read_timeout: Duration::from_secs(5),
        max_packet_size: 1 << 21,
        outbound_queue: 16,
    }
}

fn client(
    address: ServerAddress,
    version: ProtocolVersion,
    tables: &Arc<ProtocolTables>,
) -> (Connection, mpsc::UnboundedReceiver<SessionEvent>, Arc<Session>) {
    let conn = Connection::new(address, version, tables.clone(), settings());
    let (session, events) = Session::new(tables.clone(), "quarry-test");
    (conn, events, Arc::new(session))
}

fn profile(name: &str) -> GameProfile {
    GameProfile {
        uuid: Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap(),
        name: name.into(),
    }
}

async fn wait_for_state(conn: &Connection, state: ConnectionState) {
    timeout(LIMIT, async {
        while conn.state() != state {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("state never reached");
}

#[tokio::test]
async fn test_status_ping() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    let server_tables = tables.clone();
    let server = tokio::spawn(async move {
        let mut server = FakeServer::accept(listener, server_tables, V1_14_4.protocol()).await;
        match server.read(ConnectionState::Handshaking).await {
            ServerboundPacket::Handshake {
                protocol_version,
                next_state,
                ..
            } => {
                assert_eq!(protocol_version, -1);
                assert_eq!(next_state, 1);
            }
            other => panic!("expected handshake, got {:?}", other),
        }
        assert_eq!(
            server.read(ConnectionState::Status).await,
            ServerboundPacket::StatusRequest
        );
        server
            .send(ClientboundPacket::StatusResponse {
                json: r#"{"version":{"name":"1.14.4","protocol":498},"description":"Fake"}"#
                    .into(),
            })
            .await;
        let payload = match server.read(ConnectionState::Status).await {
            ServerboundPacket::StatusPing { payload } => payload,
            other => panic!("expected ping, got {:?}", other),
        };
        server.send(ClientboundPacket::StatusPong { payload }).await;
        server.drain().await;
    });

    let (conn, mut events, session) = client(address, V1_14_4, &tables);
    assert!(conn.connect(ConnectIntent::Status, session));

    match timeout(LIMIT, events.recv()).await.unwrap() {
        Some(SessionEvent::Status(status)) => {
            assert_eq!(status.protocol(), Some(498));
            assert_eq!(status.motd(), "Fake");
        }
        other => panic!("expected status, got {:?}", other),
    }
    match timeout(LIMIT, events.recv()).await.unwrap() {
        Some(SessionEvent::Pong { latency_ms }) => assert!(latency_ms >= 0),
        other => panic!("expected pong, got {:?}", other),
    }
    assert_eq!(
        timeout(LIMIT, conn.closed()).await.unwrap(),
        ConnectionState::Disconnected
    );
    assert!(conn.last_error().is_none());
    timeout(LIMIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_encryption_starts_after_the_response_frame() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    let server_tables = tables.clone();
    let server = tokio::spawn(async move {
        let mut server = FakeServer::accept(listener, server_tables, V1_14_4.protocol()).await;
        assert_eq!(server.expect_login().await, "tester");

        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let der = private.to_public_key().to_public_key_der().unwrap();
        server
            .send(ClientboundPacket::EncryptionRequest {
                server_id: String::new(),
                public_key: der.as_bytes().to_vec(),
                verify_token: vec![1, 2, 3, 4],
            })
            .await;

        let (shared_secret, verify_token) = match server.read(ConnectionState::Login).await {
            ServerboundPacket::EncryptionResponse {
                shared_secret,
                verify_token,
                secret,
            } => {
                assert!(secret.is_none());
                (shared_secret, verify_token)
            }
            other => panic!("expected encryption response, got {:?}", other),
        };
        // Everything up to here arrived as plaintext frames
        let plaintext_len = server.received.lock().unwrap().len();
        {
            let received = server.received.lock().unwrap();
            assert!(received.windows(6).any(|w| w == b"tester"));
        }

        let secret = private.decrypt(Pkcs1v15Encrypt, &shared_secret).unwrap();
        let token = private.decrypt(Pkcs1v15Encrypt, &verify_token).unwrap();
        assert_eq!(token, vec![1, 2, 3, 4]);
        let secret: [u8; 16] = secret.try_into().unwrap();
        let (encryptor, decryptor) = session_ciphers(&secret);
        server.writer.enable_encryption(encryptor);
        server.reader.enable_decryption(decryptor);

        server
            .send(ClientboundPacket::LoginSuccess {
                profile: profile("tester"),
            })
            .await;
        server
            .send(ClientboundPacket::KeepAlive { id: 0x1234_5678 })
            .await;
        assert_eq!(
            server.read(ConnectionState::Play).await,
            ServerboundPacket::KeepAlive { id: 0x1234_5678 }
        );

        let received = server.received.lock().unwrap().clone();
        let body = server
            .tables
            .encode(
                &Packet::Serverbound(ServerboundPacket::KeepAlive { id: 0x1234_5678 }),
                server.protocol,
            )
            .unwrap();
        let mut plain_frame = BytesMut::new();
        write_varint(&mut plain_frame, body.len() as i32);
        plain_frame.extend_from_slice(&body);
        let after = &received[plaintext_len..];
        assert_eq!(after.len(), plain_frame.len());
        assert_ne!(after, &plain_frame[..]);
        server
    });

    let (conn, mut events, session) = client(address, V1_14_4, &tables);
    conn.connect(
        ConnectIntent::Login {
            username: "tester".into(),
        },
        session,
    );

    let mut server = timeout(LIMIT, server).await.unwrap().unwrap();
    assert!(conn.is_encrypted());
    assert_eq!(conn.state(), ConnectionState::Play);
    match timeout(LIMIT, events.recv()).await.unwrap() {
        Some(SessionEvent::LoggedIn(p)) => assert_eq!(p.name, "tester"),
        other => panic!("expected login, got {:?}", other),
    }

    conn.disconnect();
    assert_eq!(
        timeout(LIMIT, conn.closed()).await.unwrap(),
        ConnectionState::Disconnected
    );
    timeout(LIMIT, server.drain()).await.unwrap();
}

#[tokio::test]
async fn test_malformed_play_packet_is_dropped() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    let server_tables = tables.clone();
    let server = tokio::spawn(async move {
        let mut server = FakeServer::accept(listener, server_tables, V1_14_4.protocol()).await;
        server.expect_login().await;
        server
            .send(ClientboundPacket::LoginSetCompression { threshold: 16 })
            .await;
        server.set_compression(16);
        server
            .send(ClientboundPacket::LoginSuccess {
                profile: profile("tester"),
            })
            .await;

        // A time update needs 16 bytes of payload
        let time_update = server
            .tables
            .packets(server.protocol)
            .id_for(ClientboundKind::TimeUpdate)
            .unwrap();
        let mut body = BytesMut::new();
        write_varint(&mut body, time_update);
        body.extend_from_slice(&[0, 1]);
        server.send_raw(&body).await;

        server.send(ClientboundPacket::KeepAlive { id: 5 }).await;
        assert_eq!(
            server.read(ConnectionState::Play).await,
            ServerboundPacket::KeepAlive { id: 5 }
        );
        server
            .send(ClientboundPacket::Disconnect {
                reason: r#"{"text":"bye"}"#.into(),
            })
            .await;
        server.drain().await;
    });

    let (conn, mut events, session) = client(address, V1_14_4, &tables);
    conn.connect(
        ConnectIntent::Login {
            username: "tester".into(),
        },
        session,
    );

    assert_eq!(
        timeout(LIMIT, conn.closed()).await.unwrap(),
        ConnectionState::Disconnected
    );
    assert!(conn.last_error().is_none());
    assert_eq!(conn.compression_threshold(), 16);
    let mut kicked = None;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Kicked(reason) = event {
            kicked = Some(reason);
        }
    }
    assert_eq!(kicked.as_deref(), Some("bye"));
    timeout(LIMIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_unknown_login_packet_fails_the_connection() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    let server_tables = tables.clone();
    let server = tokio::spawn(async move {
        let mut server = FakeServer::accept(listener, server_tables, V1_8_9.protocol()).await;
        server.expect_login().await;
        server.send_raw(&[0x7F, 0x00, 0x00]).await;
        server.drain().await;
    });

    let (conn, _events, session) = client(address, V1_8_9, &tables);
    conn.connect(
        ConnectIntent::Login {
            username: "tester".into(),
        },
        session,
    );

    assert_eq!(
        timeout(LIMIT, conn.closed()).await.unwrap(),
        ConnectionState::Failed
    );
    let error = conn.last_error().expect("failure recorded");
    assert!(matches!(
        &*error,
        ConnectionError::Protocol(ProtocolError::UnknownPacket { id: 0x7F, .. })
    ));
    timeout(LIMIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_packets_missing_from_the_version_are_rejected_at_send() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    let server_tables = tables.clone();
    let server = tokio::spawn(async move {
        let mut server = FakeServer::accept(listener, server_tables, V1_8_9.protocol()).await;
        server.expect_login().await;
        // Stay silent until the client gives up
        server.drain().await;
    });

    let (conn, _events, session) = client(address, V1_8_9, &tables);
    conn.connect(
        ConnectIntent::Login {
            username: "tester".into(),
        },
        session,
    );
    wait_for_state(&conn, ConnectionState::Login).await;

    // Login plugin messages only exist from 1.13 on
    let result = conn.try_send(ServerboundPacket::LoginPluginResponse {
        message_id: 1,
        data: None,
    });
    assert!(matches!(
        result,
        Err(ConnectionError::Protocol(ProtocolError::Unregistered { .. }))
    ));
    assert_eq!(conn.state(), ConnectionState::Login);

    conn.disconnect();
    assert_eq!(
        timeout(LIMIT, conn.closed()).await.unwrap(),
        ConnectionState::Disconnected
    );
    timeout(LIMIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_disconnect_while_connecting_terminates() {
    let tables = ProtocolTables::shared().unwrap();
    // Non-routable: the connect attempt hangs until its timeout, or fails
    // immediately where no route exists.
    let address = ServerAddress::new("10.255.255.1", 25565);
    let mut network = settings();
    network.connect_timeout = Duration::from_secs(60);
    let conn = Connection::new(address, V1_14_4, tables.clone(), network);
    let (session, _events) = Session::new(tables, "quarry-test");
    assert!(conn.connect(ConnectIntent::Status, Arc::new(session)));

    tokio::time::sleep(Duration::from_millis(50)).await;
    conn.disconnect();
    let state = timeout(Duration::from_secs(2), conn.closed())
        .await
        .expect("disconnect hung");
    assert!(state.is_terminal());
}

#[tokio::test]
async fn test_disconnect_abandons_a_blocked_write() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    let server_tables = tables.clone();
    let server = tokio::spawn(async move {
        let mut server = FakeServer::accept(listener, server_tables, V1_14_4.protocol()).await;
        server.expect_login().await;
        server
            .send(ClientboundPacket::LoginSuccess {
                profile: profile("tester"),
            })
            .await;
        // Handed back unread so the socket stays open
        server
    });

    let (conn, _events, session) = client(address, V1_14_4, &tables);
    conn.connect(
        ConnectIntent::Login {
            username: "tester".into(),
        },
        session,
    );
    let _server = timeout(LIMIT, server).await.unwrap().unwrap();
    wait_for_state(&conn, ConnectionState::Play).await;

    // Far more than the socket buffers hold, so the send task stalls
    let flood = conn.clone();
    let sender = tokio::spawn(async move {
        for _ in 0..64 {
            let packet = ServerboundPacket::PluginMessage {
                channel: "quarry:flood".into(),
                data: vec![0xAB; 1 << 20],
            };
            if flood.send(packet).await.is_err() {
                break;
            }
        }
    });
    tokio::time::sleep(Duration::from_millis(500)).await;

    conn.disconnect();
    assert_eq!(
        timeout(Duration::from_secs(5), conn.closed())
            .await
            .expect("disconnect hung behind a blocked write"),
        ConnectionState::Disconnected
    );
    assert!(conn.last_error().is_none());
    timeout(LIMIT, sender).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_reset_during_play_ends_disconnected() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    let server_tables = tables.clone();
    let (reset_tx, reset_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        // Closing with a zero linger sends RST instead of FIN
        #[allow(deprecated)]
        stream.set_linger(Some(Duration::ZERO)).unwrap();
        let mut server = FakeServer::over(stream, server_tables, V1_14_4.protocol());
        server.expect_login().await;
        server
            .send(ClientboundPacket::LoginSuccess {
                profile: profile("tester"),
            })
            .await;
        let _ = reset_rx.await;
        drop(server);
    });

    let (conn, mut events, session) = client(address, V1_14_4, &tables);
    conn.connect(
        ConnectIntent::Login {
            username: "tester".into(),
        },
        session,
    );
    match timeout(LIMIT, events.recv()).await.unwrap() {
        Some(SessionEvent::LoggedIn(p)) => assert_eq!(p.name, "tester"),
        other => panic!("expected login, got {:?}", other),
    }
    wait_for_state(&conn, ConnectionState::Play).await;
    reset_tx.send(()).unwrap();

    assert_eq!(
        timeout(LIMIT, conn.closed()).await.unwrap(),
        ConnectionState::Disconnected
    );
    let error = conn.last_error().expect("reset recorded");
    assert!(matches!(&*error, ConnectionError::Io(_)), "got {:?}", error);
    assert!(error.is_transport());
    timeout(LIMIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_refused_connect_fails() {
    let tables = ProtocolTables::shared().unwrap();
    let (listener, address) = listen().await;
    drop(listener);

    let (conn, _events, session) = client(address, V1_14_4, &tables);
    assert!(conn.connect(ConnectIntent::Status, session));
    assert_eq!(
        timeout(LIMIT, conn.closed()).await.unwrap(),
        ConnectionState::Failed
    );
    let error = conn.last_error().expect("refusal recorded");
    assert!(matches!(&*error, ConnectionError::Io(_)), "got {:?}", error);
}
