use super::{ClientboundKind, PacketContext};
use crate::codec::*;
use crate::metadata::EntityMetadata;
use crate::version::{KEEP_ALIVE_LONG, LOGIN_UUID_BINARY, V1_14, V1_15, V1_16, V1_9_1};
use bytes::{BufMut, BytesMut};
use quarry_nbt::NbtValue;
use quarry_types::GameProfile;
use uuid::Uuid;

const MAX_CHAT_LEN: usize = 262_144;

/// Packets sent by the server. Kinds without a dedicated variant travel as
/// `Other` with their raw payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientboundPacket {
    // === Status ===
    StatusResponse {
        json: String,
    },
    StatusPong {
        payload: i64,
    },

    // === Login ===
    LoginDisconnect {
        reason: String,
    },
    EncryptionRequest {
        server_id: String,
        public_key: Vec<u8>,
        verify_token: Vec<u8>,
    },
    LoginSuccess {
        profile: GameProfile,
    },
    LoginSetCompression {
        threshold: i32,
    },
    LoginPluginRequest {
        message_id: i32,
        channel: String,
        data: Vec<u8>,
    },

    // === Play ===
    KeepAlive {
        id: i64,
    },
    ChatMessage {
        json: String,
        position: i8,
        sender: Option<Uuid>,
    },
    JoinGame(Box<JoinGame>),
    Disconnect {
        reason: String,
    },
    SetCompression {
        threshold: i32,
    },
    PluginMessage {
        channel: String,
        data: Vec<u8>,
    },
    EntityMetadata {
        entity_id: i32,
        metadata: EntityMetadata,
    },
    TimeUpdate {
        world_age: i64,
        time_of_day: i64,
    },
    UpdateHealth {
        health: f32,
        food: i32,
        saturation: f32,
    },

    Other {
        kind: ClientboundKind,
        data: Vec<u8>,
    },
}

/// Dimension reference in join game: numeric before 1.16, named afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dimension {
    Id(i32),
    Name(String),
}

/// Join game across its layouts. Fields a version does not carry are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinGame {
    pub entity_id: i32,
    pub hardcore: bool,
    pub game_mode: u8,
    pub previous_game_mode: Option<u8>,
    pub world_names: Vec<String>,
    pub dimension_codec: Option<NbtValue>,
    pub dimension: Dimension,
    pub world_name: Option<String>,
    pub hashed_seed: Option<i64>,
    pub difficulty: Option<u8>,
    pub max_players: u8,
    pub level_type: Option<String>,
    pub view_distance: Option<i32>,
    pub reduced_debug_info: bool,
    pub enable_respawn_screen: Option<bool>,
    pub is_debug: Option<bool>,
    pub is_flat: Option<bool>,
}

impl JoinGame {
    fn read(protocol: u32, buf: &mut BytesMut) -> CodecResult<Self> {
        let entity_id = read_i32(buf)?;
        let mode = read_u8(buf)?;
        let mut join = JoinGame {
            entity_id,
            hardcore: mode & 0x08 != 0,
            game_mode: mode & 0x07,
            previous_game_mode: None,
            world_names: Vec::new(),
            dimension_codec: None,
            dimension: Dimension::Id(0),
            world_name: None,
            hashed_seed: None,
            difficulty: None,
            max_players: 0,
            level_type: None,
            view_distance: None,
            reduced_debug_info: false,
            enable_respawn_screen: None,
            is_debug: None,
            is_flat: None,
        };

        if protocol >= V1_16 {
            join.previous_game_mode = Some(read_u8(buf)?);
            let count = read_varint(buf)?;
            for _ in 0..count.max(0) {
                join.world_names.push(read_string(buf, MAX_STRING_LEN)?);
            }
            join.dimension_codec = read_nbt(buf)?;
            join.dimension = Dimension::Name(read_string(buf, MAX_STRING_LEN)?);
            join.world_name = Some(read_string(buf, MAX_STRING_LEN)?);
        } else if protocol >= V1_9_1 {
            join.dimension = Dimension::Id(read_i32(buf)?);
        } else {
            join.dimension = Dimension::Id(read_i8(buf)? as i32);
        }

        if protocol >= V1_15 {
            join.hashed_seed = Some(read_i64(buf)?);
        }
        if protocol < V1_14 {
            join.difficulty = Some(read_u8(buf)?);
        }
        join.max_players = read_u8(buf)?;
        if protocol < V1_16 {
            join.level_type = Some(read_string(buf, 16)?);
        }
        if protocol >= V1_14 {
            join.view_distance = Some(read_varint(buf)?);
        }
        join.reduced_debug_info = read_bool(buf)?;
        if protocol >= V1_15 {
            join.enable_respawn_screen = Some(read_bool(buf)?);
        }
        if protocol >= V1_16 {
            join.is_debug = Some(read_bool(buf)?);
            join.is_flat = Some(read_bool(buf)?);
        }
        Ok(join)
    }

    fn write(&self, protocol: u32, buf: &mut BytesMut) -> CodecResult<()> {
        buf.put_i32(self.entity_id);
        buf.put_u8((self.game_mode & 0x07) | if self.hardcore { 0x08 } else { 0 });

        if protocol >= V1_16 {
            buf.put_u8(self.previous_game_mode.unwrap_or(0xFF));
            write_varint(buf, self.world_names.len() as i32);
            for name in &self.world_names {
                write_string(buf, name);
            }
            write_nbt(buf, &self.dimension_codec);
            let Dimension::Name(name) = &self.dimension else {
                return Err(CodecError::InvalidValue(
                    "join game needs a named dimension from 1.16".into(),
                ));
            };
            write_string(buf, name);
            write_string(buf, self.world_name.as_deref().unwrap_or(name));
        } else {
            let Dimension::Id(id) = self.dimension else {
                return Err(CodecError::InvalidValue(
                    "join game needs a numeric dimension before 1.16".into(),
                ));
            };
            if protocol >= V1_9_1 {
                buf.put_i32(id);
            } else {
                buf.put_i8(id as i8);
            }
        }

        if protocol >= V1_15 {
            buf.put_i64(self.hashed_seed.unwrap_or(0));
        }
        if protocol < V1_14 {
            buf.put_u8(self.difficulty.unwrap_or(0));
        }
        buf.put_u8(self.max_players);
        if protocol < V1_16 {
            write_string(buf, self.level_type.as_deref().unwrap_or("default"));
        }
        if protocol >= V1_14 {
            write_varint(buf, self.view_distance.unwrap_or(10));
        }
        buf.put_u8(self.reduced_debug_info as u8);
        if protocol >= V1_15 {
            buf.put_u8(self.enable_respawn_screen.unwrap_or(true) as u8);
        }
        if protocol >= V1_16 {
            buf.put_u8(self.is_debug.unwrap_or(false) as u8);
            buf.put_u8(self.is_flat.unwrap_or(false) as u8);
        }
        Ok(())
    }
}

impl ClientboundPacket {
    pub fn kind(&self) -> ClientboundKind {
        match self {
            ClientboundPacket::StatusResponse { .. } => ClientboundKind::StatusResponse,
            ClientboundPacket::StatusPong { .. } => ClientboundKind::StatusPong,
            ClientboundPacket::LoginDisconnect { .. } => ClientboundKind::LoginDisconnect,
            ClientboundPacket::EncryptionRequest { .. } => ClientboundKind::EncryptionRequest,
            ClientboundPacket::LoginSuccess { .. } => ClientboundKind::LoginSuccess,
            ClientboundPacket::LoginSetCompression { .. } => ClientboundKind::LoginSetCompression,
            ClientboundPacket::LoginPluginRequest { .. } => ClientboundKind::LoginPluginRequest,
            ClientboundPacket::KeepAlive { .. } => ClientboundKind::KeepAlive,
            ClientboundPacket::ChatMessage { .. } => ClientboundKind::ChatMessage,
            ClientboundPacket::JoinGame(_) => ClientboundKind::JoinGame,
            ClientboundPacket::Disconnect { .. } => ClientboundKind::Disconnect,
            ClientboundPacket::SetCompression { .. } => ClientboundKind::SetCompression,
            ClientboundPacket::PluginMessage { .. } => ClientboundKind::PluginMessage,
            ClientboundPacket::EntityMetadata { .. } => ClientboundKind::EntityMetadata,
            ClientboundPacket::TimeUpdate { .. } => ClientboundKind::TimeUpdate,
            ClientboundPacket::UpdateHealth { .. } => ClientboundKind::UpdateHealth,
            ClientboundPacket::Other { kind, .. } => *kind,
        }
    }

    /// Parse the payload (everything after the packet id) of a `kind` packet.
    pub fn read(kind: ClientboundKind, ctx: &PacketContext<'_>, buf: &mut BytesMut) -> CodecResult<Self> {
        let protocol = ctx.protocol;
        let packet = match kind {
            ClientboundKind::StatusResponse => ClientboundPacket::StatusResponse {
                json: read_string(buf, MAX_STRING_LEN)?,
            },
            ClientboundKind::StatusPong => ClientboundPacket::StatusPong {
                payload: read_i64(buf)?,
            },
            ClientboundKind::LoginDisconnect => ClientboundPacket::LoginDisconnect {
                reason: read_string(buf, MAX_CHAT_LEN)?,
            },
            ClientboundKind::EncryptionRequest => ClientboundPacket::EncryptionRequest {
                server_id: read_string(buf, 20)?,
                public_key: read_byte_array(buf)?,
                verify_token: read_byte_array(buf)?,
            },
            ClientboundKind::LoginSuccess => {
                let uuid = if protocol >= LOGIN_UUID_BINARY {
                    read_uuid(buf)?
                } else {
                    let raw = read_string(buf, 36)?;
                    Uuid::parse_str(&raw)
                        .map_err(|_| CodecError::InvalidValue(format!("uuid {:?}", raw)))?
                };
                let name = read_string(buf, 16)?;
                ClientboundPacket::LoginSuccess {
                    profile: GameProfile { uuid, name },
                }
            }
            ClientboundKind::LoginSetCompression => ClientboundPacket::LoginSetCompression {
                threshold: read_varint(buf)?,
            },
            ClientboundKind::LoginPluginRequest => ClientboundPacket::LoginPluginRequest {
                message_id: read_varint(buf)?,
                channel: read_string(buf, MAX_STRING_LEN)?,
                data: read_remaining(buf),
            },
            ClientboundKind::KeepAlive => ClientboundPacket::KeepAlive {
                id: if protocol >= KEEP_ALIVE_LONG {
                    read_i64(buf)?
                } else {
                    read_varint(buf)? as i64
                },
            },
            ClientboundKind::ChatMessage => ClientboundPacket::ChatMessage {
                json: read_string(buf, MAX_CHAT_LEN)?,
                position: read_i8(buf)?,
                sender: if protocol >= V1_16 {
                    Some(read_uuid(buf)?)
                } else {
                    None
                },
            },
            ClientboundKind::JoinGame => {
                ClientboundPacket::JoinGame(Box::new(JoinGame::read(protocol, buf)?))
            }
            ClientboundKind::Disconnect => ClientboundPacket::Disconnect {
                reason: read_string(buf, MAX_CHAT_LEN)?,
            },
            ClientboundKind::SetCompression => ClientboundPacket::SetCompression {
                threshold: read_varint(buf)?,
            },
            ClientboundKind::PluginMessage => ClientboundPacket::PluginMessage {
                channel: read_string(buf, MAX_STRING_LEN)?,
                data: read_remaining(buf),
            },
            ClientboundKind::EntityMetadata => ClientboundPacket::EntityMetadata {
                entity_id: read_varint(buf)?,
                metadata: EntityMetadata::read(buf, protocol, ctx.metadata_types)?,
            },
            ClientboundKind::TimeUpdate => ClientboundPacket::TimeUpdate {
                world_age: read_i64(buf)?,
                time_of_day: read_i64(buf)?,
            },
            ClientboundKind::UpdateHealth => ClientboundPacket::UpdateHealth {
                health: read_f32(buf)?,
                food: read_varint(buf)?,
                saturation: read_f32(buf)?,
            },
            other => ClientboundPacket::Other {
                kind: other,
                data: read_remaining(buf),
            },
        };
        Ok(packet)
    }

    /// Serialize the payload (without the packet id).
    pub fn write(&self, ctx: &PacketContext<'_>, buf: &mut BytesMut) -> CodecResult<()> {
        let protocol = ctx.protocol;
        match self {
            ClientboundPacket::StatusResponse { json } => write_string(buf, json),
            ClientboundPacket::StatusPong { payload } => buf.put_i64(*payload),
            ClientboundPacket::LoginDisconnect { reason } => write_string(buf, reason),
            ClientboundPacket::EncryptionRequest {
                server_id,
                public_key,
                verify_token,
            } => {
                write_string(buf, server_id);
                write_byte_array(buf, public_key);
                write_byte_array(buf, verify_token);
            }
            ClientboundPacket::LoginSuccess { profile } => {
                if protocol >= LOGIN_UUID_BINARY {
                    write_uuid(buf, &profile.uuid);
                } else {
                    write_string(buf, &profile.uuid.hyphenated().to_string());
                }
                write_string(buf, &profile.name);
            }
            ClientboundPacket::LoginSetCompression { threshold }
            | ClientboundPacket::SetCompression { threshold } => write_varint(buf, *threshold),
            ClientboundPacket::LoginPluginRequest {
                message_id,
                channel,
                data,
            } => {
                write_varint(buf, *message_id);
                write_string(buf, channel);
                buf.put_slice(data);
            }
            ClientboundPacket::KeepAlive { id } => {
                if protocol >= KEEP_ALIVE_LONG {
                    buf.put_i64(*id);
                } else {
                    write_varint(buf, *id as i32);
                }
            }
            ClientboundPacket::ChatMessage {
                json,
                position,
                sender,
            } => {
                write_string(buf, json);
                buf.put_i8(*position);
                if protocol >= V1_16 {
                    write_uuid(buf, &sender.unwrap_or(Uuid::nil()));
                }
            }
            ClientboundPacket::JoinGame(join) => join.write(protocol, buf)?,
            ClientboundPacket::Disconnect { reason } => write_string(buf, reason),
            ClientboundPacket::PluginMessage { channel, data } => {
                write_string(buf, channel);
                buf.put_slice(data);
            }
            ClientboundPacket::EntityMetadata {
                entity_id,
                metadata,
            } => {
                write_varint(buf, *entity_id);
                metadata.write(buf, protocol, ctx.metadata_types)?;
            }
            ClientboundPacket::TimeUpdate {
                world_age,
                time_of_day,
            } => {
                buf.put_i64(*world_age);
                buf.put_i64(*time_of_day);
            }
            ClientboundPacket::UpdateHealth {
                health,
                food,
                saturation,
            } => {
                buf.put_f32(*health);
                write_varint(buf, *food);
                buf.put_f32(*saturation);
            }
            ClientboundPacket::Other { data, .. } => buf.put_slice(data),
        }
        Ok(())
    }
}
