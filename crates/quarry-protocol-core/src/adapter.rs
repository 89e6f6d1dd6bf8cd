use crate::codec::{read_varint, write_varint};
use crate::error::ProtocolError;
use crate::metadata::MetadataTypes;
use crate::packets::{ClientboundPacket, Packet, PacketContext, PacketDirection, ServerboundPacket};
use crate::registry::PacketRegistry;
use crate::state::ConnectionState;
use crate::version::{ProtocolVersion, VersionRegistry};
use bytes::BytesMut;

/// Version data a connection needs: which versions exist, the packet table
/// for each, and the metadata type tags. Encoding and decoding are provided
/// on top of those tables.
pub trait ProtocolAdapter: Send + Sync {
    fn versions(&self) -> &VersionRegistry;

    /// Packet table in effect for `protocol` (nearest known version at or below).
    fn registry(&self, protocol: u32) -> &PacketRegistry;

    fn metadata_types(&self) -> &MetadataTypes;

    fn resolve_version(&self, protocol: u32) -> ProtocolVersion {
        self.versions().floor(protocol)
    }

    /// Decode a clientbound frame body (`varint(id) | payload`).
    fn decode_clientbound(
        &self,
        state: ConnectionState,
        protocol: u32,
        mut frame: BytesMut,
    ) -> Result<ClientboundPacket, ProtocolError> {
        let id = read_varint(&mut frame).map_err(ProtocolError::Header)?;
        let kind = self
            .registry(protocol)
            .resolve_clientbound(state, id)
            .ok_or(ProtocolError::UnknownPacket {
                direction: PacketDirection::Clientbound,
                state,
                id,
                protocol,
            })?;
        let ctx = PacketContext::new(protocol, self.metadata_types());
        let packet = ClientboundPacket::read(kind, &ctx, &mut frame).map_err(|source| {
            ProtocolError::Malformed {
                kind: kind.into(),
                source,
            }
        })?;
        if !frame.is_empty() {
            return Err(ProtocolError::LeftoverBytes {
                kind: kind.into(),
                remaining: frame.len(),
            });
        }
        Ok(packet)
    }

    /// Decode a serverbound frame body (`varint(id) | payload`).
    fn decode_serverbound(
        &self,
        state: ConnectionState,
        protocol: u32,
        mut frame: BytesMut,
    ) -> Result<ServerboundPacket, ProtocolError> {
        let id = read_varint(&mut frame).map_err(ProtocolError::Header)?;
        let kind = self
            .registry(protocol)
            .resolve_serverbound(state, id)
            .ok_or(ProtocolError::UnknownPacket {
                direction: PacketDirection::Serverbound,
                state,
                id,
                protocol,
            })?;
        let ctx = PacketContext::new(protocol, self.metadata_types());
        let packet = ServerboundPacket::read(kind, &ctx, &mut frame).map_err(|source| {
            ProtocolError::Malformed {
                kind: kind.into(),
                source,
            }
        })?;
        if !frame.is_empty() {
            return Err(ProtocolError::LeftoverBytes {
                kind: kind.into(),
                remaining: frame.len(),
            });
        }
        Ok(packet)
    }

    fn decode(
        &self,
        direction: PacketDirection,
        state: ConnectionState,
        protocol: u32,
        frame: BytesMut,
    ) -> Result<Packet, ProtocolError> {
        match direction {
            PacketDirection::Clientbound => self
                .decode_clientbound(state, protocol, frame)
                .map(Packet::Clientbound),
            PacketDirection::Serverbound => self
                .decode_serverbound(state, protocol, frame)
                .map(Packet::Serverbound),
        }
    }

    /// Encode a packet into a frame body using its id for `protocol`.
    fn encode(&self, packet: &Packet, protocol: u32) -> Result<BytesMut, ProtocolError> {
        let kind = packet.kind();
        let id = self
            .registry(protocol)
            .id_for(kind)
            .ok_or(ProtocolError::Unregistered { kind, protocol })?;

        let mut buf = BytesMut::new();
        write_varint(&mut buf, id);
        let ctx = PacketContext::new(protocol, self.metadata_types());
        let written = match packet {
            Packet::Clientbound(p) => p.write(&ctx, &mut buf),
            Packet::Serverbound(p) => p.write(&ctx, &mut buf),
        };
        written.map_err(|source| ProtocolError::Malformed { kind, source })?;
        Ok(buf)
    }
}
