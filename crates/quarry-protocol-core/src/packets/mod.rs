mod clientbound;
mod kind;
mod serverbound;

pub use clientbound::{ClientboundPacket, Dimension, JoinGame};
pub use kind::{ClientboundKind, PacketDirection, PacketKind, ServerboundKind};
pub use serverbound::ServerboundPacket;

use crate::metadata::MetadataTypes;

/// Version information a payload codec needs.
#[derive(Debug, Clone, Copy)]
pub struct PacketContext<'a> {
    pub protocol: u32,
    pub metadata_types: &'a MetadataTypes,
}

impl<'a> PacketContext<'a> {
    pub fn new(protocol: u32, metadata_types: &'a MetadataTypes) -> Self {
        Self {
            protocol,
            metadata_types,
        }
    }
}

/// A decoded packet of either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Clientbound(ClientboundPacket),
    Serverbound(ServerboundPacket),
}

impl Packet {
    pub fn kind(&self) -> PacketKind {
        match self {
            Packet::Clientbound(p) => p.kind().into(),
            Packet::Serverbound(p) => p.kind().into(),
        }
    }
}

impl From<ClientboundPacket> for Packet {
    fn from(packet: ClientboundPacket) -> Self {
        Packet::Clientbound(packet)
    }
}

impl From<ServerboundPacket> for Packet {
    fn from(packet: ServerboundPacket) -> Self {
        Packet::Serverbound(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EntityMetadata, MetadataType, MetadataValue};
    use crate::versioned::VersionedValue;
    use bytes::BytesMut;
    use quarry_nbt::{nbt_compound, NbtValue};
    use quarry_types::GameProfile;
    use uuid::Uuid;

    fn metadata_types() -> MetadataTypes {
        MetadataTypes::new([
            (MetadataType::Byte, VersionedValue::new(Some(0))),
            (MetadataType::Float, VersionedValue::new(Some(3)).since(57, Some(2))),
        ])
    }

    fn clientbound_roundtrip(packet: ClientboundPacket, protocol: u32) -> BytesMut {
        let types = metadata_types();
        let ctx = PacketContext::new(protocol, &types);
        let mut buf = BytesMut::new();
        packet.write(&ctx, &mut buf).unwrap();
        let wire = buf.clone();
        let decoded = ClientboundPacket::read(packet.kind(), &ctx, &mut buf).unwrap();
        assert!(buf.is_empty(), "{:?} left {} bytes", packet.kind(), buf.len());
        assert_eq!(decoded, packet);
        wire
    }

    #[test]
    fn test_keep_alive_width_changes() {
        let wire = clientbound_roundtrip(ClientboundPacket::KeepAlive { id: 300 }, 47);
        assert_eq!(&wire[..], &[0xAC, 0x02]);
        let wire = clientbound_roundtrip(ClientboundPacket::KeepAlive { id: 300 }, 498);
        assert_eq!(wire.len(), 8);
    }

    #[test]
    fn test_login_success_uuid_formats() {
        let profile = GameProfile {
            uuid: Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap(),
            name: "Notch".into(),
        };
        let legacy = clientbound_roundtrip(
            ClientboundPacket::LoginSuccess {
                profile: profile.clone(),
            },
            498,
        );
        // varint(36) + hyphenated uuid + varint(5) + name
        assert_eq!(legacy.len(), 1 + 36 + 1 + 5);
        let binary = clientbound_roundtrip(ClientboundPacket::LoginSuccess { profile }, 736);
        assert_eq!(binary.len(), 16 + 1 + 5);
    }

    #[test]
    fn test_join_game_layouts() {
        let mut join = JoinGame {
            entity_id: 17,
            hardcore: true,
            game_mode: 1,
            previous_game_mode: None,
            world_names: Vec::new(),
            dimension_codec: None,
            dimension: Dimension::Id(-1),
            world_name: None,
            hashed_seed: None,
            difficulty: Some(2),
            max_players: 20,
            level_type: Some("flat".into()),
            view_distance: None,
            reduced_debug_info: false,
            enable_respawn_screen: None,
            is_debug: None,
            is_flat: None,
        };
        clientbound_roundtrip(ClientboundPacket::JoinGame(Box::new(join.clone())), 47);
        clientbound_roundtrip(ClientboundPacket::JoinGame(Box::new(join.clone())), 110);

        join.difficulty = None;
        join.view_distance = Some(8);
        clientbound_roundtrip(ClientboundPacket::JoinGame(Box::new(join.clone())), 498);

        join.previous_game_mode = Some(0xFF);
        join.world_names = vec!["minecraft:overworld".into(), "minecraft:the_nether".into()];
        join.dimension_codec = Some(nbt_compound! {
            "dimension" => NbtValue::List(vec![]),
        });
        join.dimension = Dimension::Name("minecraft:overworld".into());
        join.world_name = Some("minecraft:overworld".into());
        join.hashed_seed = Some(-99);
        join.level_type = None;
        join.enable_respawn_screen = Some(true);
        join.is_debug = Some(false);
        join.is_flat = Some(true);
        clientbound_roundtrip(ClientboundPacket::JoinGame(Box::new(join)), 736);
    }

    #[test]
    fn test_entity_metadata_packet() {
        let mut metadata = EntityMetadata::new();
        metadata.insert(0, MetadataValue::Byte(0));
        metadata.insert(6, MetadataValue::Float(20.0));
        clientbound_roundtrip(
            ClientboundPacket::EntityMetadata {
                entity_id: 42,
                metadata: metadata.clone(),
            },
            47,
        );
        clientbound_roundtrip(
            ClientboundPacket::EntityMetadata {
                entity_id: 42,
                metadata,
            },
            110,
        );
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let types = metadata_types();
        let ctx = PacketContext::new(498, &types);
        let mut buf = BytesMut::from(&[0x00, 0x01][..]);
        assert!(ClientboundPacket::read(ClientboundKind::TimeUpdate, &ctx, &mut buf).is_err());
    }

    #[test]
    fn test_other_keeps_raw_bytes() {
        clientbound_roundtrip(
            ClientboundPacket::Other {
                kind: ClientboundKind::ChunkData,
                data: vec![1, 2, 3, 4],
            },
            498,
        );
    }

    #[test]
    fn test_serverbound_roundtrip() {
        let types = metadata_types();
        let packets = [
            ServerboundPacket::Handshake {
                protocol_version: -1,
                server_address: "localhost".into(),
                server_port: 25565,
                next_state: 1,
            },
            ServerboundPacket::StatusRequest,
            ServerboundPacket::LoginStart {
                name: "quarry".into(),
            },
            ServerboundPacket::LoginPluginResponse {
                message_id: 3,
                data: None,
            },
            ServerboundPacket::KeepAlive { id: 1 << 40 },
            ServerboundPacket::ChatMessage {
                message: "hello".into(),
            },
        ];
        for packet in packets {
            let ctx = PacketContext::new(498, &types);
            let mut buf = BytesMut::new();
            packet.write(&ctx, &mut buf).unwrap();
            let decoded = ServerboundPacket::read(packet.kind(), &ctx, &mut buf).unwrap();
            assert!(buf.is_empty());
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn test_encryption_response_secret_stays_local() {
        let types = metadata_types();
        let ctx = PacketContext::new(47, &types);
        let packet = ServerboundPacket::EncryptionResponse {
            shared_secret: vec![9; 128],
            verify_token: vec![7; 128],
            secret: Some([1; 16]),
        };
        assert_eq!(packet.activates_encryption(), Some([1; 16]));
        let mut buf = BytesMut::new();
        packet.write(&ctx, &mut buf).unwrap();
        // two varint(128) prefixes, two arrays, nothing else
        assert_eq!(buf.len(), 2 + 128 + 2 + 128);
        let decoded =
            ServerboundPacket::read(ServerboundKind::EncryptionResponse, &ctx, &mut buf).unwrap();
        assert_eq!(decoded.activates_encryption(), None);
    }

    #[test]
    fn test_chat_length_limit_depends_on_version() {
        let types = metadata_types();
        let long = ServerboundPacket::ChatMessage {
            message: "x".repeat(200),
        };
        let mut buf = BytesMut::new();
        assert!(long.write(&PacketContext::new(110, &types), &mut buf).is_err());
        assert!(long.write(&PacketContext::new(498, &types), &mut buf).is_ok());
    }
}
