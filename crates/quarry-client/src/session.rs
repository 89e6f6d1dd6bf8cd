//! Default packet handler: completes the Login exchange, keeps the connection
//! alive and reports what happens as `SessionEvent`s.

use crate::connection::{Connection, ConnectionError, PacketHandler};
use crate::crypto;
use crate::status::ServerStatus;
use bytes::BytesMut;
use quarry_protocol_core::{write_string, ClientboundPacket, MetadataValue, ServerboundPacket};
use quarry_protocol_versions::{EntityDataField, ProtocolTables};
use quarry_types::{GameProfile, TextComponent};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Status(ServerStatus),
    Pong { latency_ms: i64 },
    LoggedIn(GameProfile),
    Joined { entity_id: i32 },
    Chat(String),
    Health { health: f32, food: i32, saturation: f32 },
    /// Our own entity's metadata changed.
    PlayerMetadata { health: f32, flags: i8 },
    Kicked(String),
}

pub struct Session {
    tables: Arc<ProtocolTables>,
    brand: String,
    events: mpsc::UnboundedSender<SessionEvent>,
    entity_id: AtomicI32,
}

impl Session {
    pub fn new(
        tables: Arc<ProtocolTables>,
        brand: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = Self {
            tables,
            brand: brand.into(),
            events,
            entity_id: AtomicI32::new(-1),
        };
        (session, rx)
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn answer_encryption(
        &self,
        conn: &Connection,
        server_id: &str,
        public_key: &[u8],
        verify_token: &[u8],
    ) -> Result<(), ConnectionError> {
        let exchange = crypto::key_exchange(server_id, public_key, verify_token)
            .map_err(|e| ConnectionError::Crypto(e.to_string()))?;
        debug!("Server hash {}", exchange.server_hash);
        conn.try_send(ServerboundPacket::EncryptionResponse {
            shared_secret: exchange.encrypted_secret,
            verify_token: exchange.encrypted_token,
            secret: Some(exchange.secret),
        })
    }

    fn send_brand(&self, conn: &Connection) -> Result<(), ConnectionError> {
        let channel = self.tables.brand_channel(conn.version().protocol());
        let mut data = BytesMut::new();
        write_string(&mut data, &self.brand);
        conn.try_send(ServerboundPacket::PluginMessage {
            channel: channel.to_string(),
            data: data.to_vec(),
        })
    }
}

impl PacketHandler for Session {
    fn handle_packet(
        &self,
        conn: &Connection,
        packet: ClientboundPacket,
    ) -> Result<(), ConnectionError> {
        match packet {
            ClientboundPacket::StatusResponse { json } => match ServerStatus::parse(&json) {
                Ok(status) => self.emit(SessionEvent::Status(status)),
                Err(e) => warn!("Unreadable status response: {}", e),
            },
            ClientboundPacket::StatusPong { payload } => {
                self.emit(SessionEvent::Pong {
                    latency_ms: now_millis().saturating_sub(payload),
                });
                conn.disconnect();
            }
            ClientboundPacket::LoginDisconnect { reason } | ClientboundPacket::Disconnect { reason } => {
                let reason = TextComponent::from_json(&reason).to_plain_text();
                info!("Disconnected by server: {}", reason);
                self.emit(SessionEvent::Kicked(reason));
                conn.disconnect();
            }
            ClientboundPacket::EncryptionRequest {
                server_id,
                public_key,
                verify_token,
            } => self.answer_encryption(conn, &server_id, &public_key, &verify_token)?,
            ClientboundPacket::LoginSuccess { profile } => {
                info!("Logged in as {} ({})", profile.name, profile.uuid);
                self.emit(SessionEvent::LoggedIn(profile));
            }
            ClientboundPacket::LoginPluginRequest {
                message_id, channel, ..
            } => {
                debug!("Declining login plugin request on {}", channel);
                conn.try_send(ServerboundPacket::LoginPluginResponse {
                    message_id,
                    data: None,
                })?;
            }
            ClientboundPacket::KeepAlive { id } => {
                conn.try_send(ServerboundPacket::KeepAlive { id })?;
            }
            ClientboundPacket::JoinGame(join) => {
                self.entity_id.store(join.entity_id, Ordering::Release);
                self.send_brand(conn)?;
                self.emit(SessionEvent::Joined {
                    entity_id: join.entity_id,
                });
            }
            ClientboundPacket::ChatMessage { json, .. } => {
                self.emit(SessionEvent::Chat(
                    TextComponent::from_json(&json).to_plain_text(),
                ));
            }
            ClientboundPacket::UpdateHealth {
                health,
                food,
                saturation,
            } => self.emit(SessionEvent::Health {
                health,
                food,
                saturation,
            }),
            ClientboundPacket::EntityMetadata {
                entity_id,
                metadata,
            } if entity_id == self.entity_id.load(Ordering::Acquire) => {
                let protocol = conn.version().protocol();
                let health =
                    match self
                        .tables
                        .entity_field(&metadata, EntityDataField::Health, protocol)
                    {
                        MetadataValue::Float(health) => health,
                        _ => 0.0,
                    };
                let flags =
                    match self
                        .tables
                        .entity_field(&metadata, EntityDataField::EntityFlags, protocol)
                    {
                        MetadataValue::Byte(flags) => flags,
                        _ => 0,
                    };
                self.emit(SessionEvent::PlayerMetadata { health, flags });
            }
            _ => {}
        }
        Ok(())
    }
}

pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
