use super::{PacketContext, ServerboundKind};
use crate::codec::*;
use crate::version::{KEEP_ALIVE_LONG, V1_11};
use bytes::{BufMut, BytesMut};

/// Packets sent by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerboundPacket {
    // === Handshaking ===
    Handshake {
        protocol_version: i32,
        server_address: String,
        server_port: u16,
        next_state: i32,
    },

    // === Status ===
    StatusRequest,
    StatusPing {
        payload: i64,
    },

    // === Login ===
    LoginStart {
        name: String,
    },
    /// `secret` is the plaintext shared secret the two byte arrays were
    /// derived from. It never goes on the wire; the send path uses it to
    /// switch on encryption right after this packet is flushed. Decoded
    /// packets always carry `None`.
    EncryptionResponse {
        shared_secret: Vec<u8>,
        verify_token: Vec<u8>,
        secret: Option<[u8; 16]>,
    },
    LoginPluginResponse {
        message_id: i32,
        data: Option<Vec<u8>>,
    },

    // === Play ===
    KeepAlive {
        id: i64,
    },
    ChatMessage {
        message: String,
    },
    ClientStatus {
        action: i32,
    },
    PluginMessage {
        channel: String,
        data: Vec<u8>,
    },

    Other {
        kind: ServerboundKind,
        data: Vec<u8>,
    },
}

impl ServerboundPacket {
    pub fn kind(&self) -> ServerboundKind {
        match self {
            ServerboundPacket::Handshake { .. } => ServerboundKind::Handshake,
            ServerboundPacket::StatusRequest => ServerboundKind::StatusRequest,
            ServerboundPacket::StatusPing { .. } => ServerboundKind::StatusPing,
            ServerboundPacket::LoginStart { .. } => ServerboundKind::LoginStart,
            ServerboundPacket::EncryptionResponse { .. } => ServerboundKind::EncryptionResponse,
            ServerboundPacket::LoginPluginResponse { .. } => ServerboundKind::LoginPluginResponse,
            ServerboundPacket::KeepAlive { .. } => ServerboundKind::KeepAlive,
            ServerboundPacket::ChatMessage { .. } => ServerboundKind::ChatMessage,
            ServerboundPacket::ClientStatus { .. } => ServerboundKind::ClientStatus,
            ServerboundPacket::PluginMessage { .. } => ServerboundKind::PluginMessage,
            ServerboundPacket::Other { kind, .. } => *kind,
        }
    }

    /// The cipher secret to activate once this packet has been written.
    pub fn activates_encryption(&self) -> Option<[u8; 16]> {
        match self {
            ServerboundPacket::EncryptionResponse { secret, .. } => *secret,
            _ => None,
        }
    }

    /// Parse the payload (everything after the packet id) of a `kind` packet.
    pub fn read(kind: ServerboundKind, ctx: &PacketContext<'_>, buf: &mut BytesMut) -> CodecResult<Self> {
        let protocol = ctx.protocol;
        let packet = match kind {
            ServerboundKind::Handshake => ServerboundPacket::Handshake {
                protocol_version: read_varint(buf)?,
                server_address: read_string(buf, 255)?,
                server_port: read_u16(buf)?,
                next_state: read_varint(buf)?,
            },
            ServerboundKind::StatusRequest => ServerboundPacket::StatusRequest,
            ServerboundKind::StatusPing => ServerboundPacket::StatusPing {
                payload: read_i64(buf)?,
            },
            ServerboundKind::LoginStart => ServerboundPacket::LoginStart {
                name: read_string(buf, 16)?,
            },
            ServerboundKind::EncryptionResponse => ServerboundPacket::EncryptionResponse {
                shared_secret: read_byte_array(buf)?,
                verify_token: read_byte_array(buf)?,
                secret: None,
            },
            ServerboundKind::LoginPluginResponse => {
                let message_id = read_varint(buf)?;
                let data = if read_bool(buf)? {
                    Some(read_remaining(buf))
                } else {
                    None
                };
                ServerboundPacket::LoginPluginResponse { message_id, data }
            }
            ServerboundKind::KeepAlive => ServerboundPacket::KeepAlive {
                id: if protocol >= KEEP_ALIVE_LONG {
                    read_i64(buf)?
                } else {
                    read_varint(buf)? as i64
                },
            },
            ServerboundKind::ChatMessage => ServerboundPacket::ChatMessage {
                message: read_string(buf, max_chat_len(protocol))?,
            },
            ServerboundKind::ClientStatus => ServerboundPacket::ClientStatus {
                action: read_varint(buf)?,
            },
            ServerboundKind::PluginMessage => ServerboundPacket::PluginMessage {
                channel: read_string(buf, MAX_STRING_LEN)?,
                data: read_remaining(buf),
            },
            other => ServerboundPacket::Other {
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
            ServerboundPacket::Handshake {
                protocol_version,
                server_address,
                server_port,
                next_state,
            } => {
                write_varint(buf, *protocol_version);
                write_string(buf, server_address);
                buf.put_u16(*server_port);
                write_varint(buf, *next_state);
            }
            ServerboundPacket::StatusRequest => {}
            ServerboundPacket::StatusPing { payload } => buf.put_i64(*payload),
            ServerboundPacket::LoginStart { name } => {
                if name.is_empty() || name.len() > 16 {
                    return Err(CodecError::InvalidValue(format!("username {:?}", name)));
                }
                write_string(buf, name);
            }
            ServerboundPacket::EncryptionResponse {
                shared_secret,
                verify_token,
                ..
            } => {
                write_byte_array(buf, shared_secret);
                write_byte_array(buf, verify_token);
            }
            ServerboundPacket::LoginPluginResponse { message_id, data } => {
                write_varint(buf, *message_id);
                buf.put_u8(data.is_some() as u8);
                if let Some(data) = data {
                    buf.put_slice(data);
                }
            }
            ServerboundPacket::KeepAlive { id } => {
                if protocol >= KEEP_ALIVE_LONG {
                    buf.put_i64(*id);
                } else {
                    write_varint(buf, *id as i32);
                }
            }
            ServerboundPacket::ChatMessage { message } => {
                let max = max_chat_len(protocol);
                if message.chars().count() > max {
                    return Err(CodecError::StringTooLong(message.chars().count(), max));
                }
                write_string(buf, message);
            }
            ServerboundPacket::ClientStatus { action } => write_varint(buf, *action),
            ServerboundPacket::PluginMessage { channel, data } => {
                write_string(buf, channel);
                buf.put_slice(data);
            }
            ServerboundPacket::Other { data, .. } => buf.put_slice(data),
        }
        Ok(())
    }
}

fn max_chat_len(protocol: u32) -> usize {
    if protocol >= V1_11 {
        256
    } else {
        100
    }
}
