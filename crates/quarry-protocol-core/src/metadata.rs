//! Entity metadata streams and version-independent field lookup.
//!
//! The wire format is a list of `(index, type tag, value)` entries. Both the
//! type tags and the index a given field sits at move between versions, so
//! tags are resolved through [`MetadataTypes`] and fields through a
//! [`FieldResolver`].

use crate::codec::{
    read_block_pos, read_bool, read_f32, read_i16, read_i32, read_i8, read_nbt, read_slot,
    read_string, read_u8, read_uuid, read_varint, write_block_pos, write_nbt, write_slot,
    write_string, write_uuid, write_varint, CodecError, CodecResult, MAX_STRING_LEN,
};
use crate::version::{V1_13, V1_9};
use crate::versioned::VersionedValue;
use bytes::{BufMut, BytesMut};
use quarry_nbt::NbtValue;
use quarry_types::{BlockPos, Direction, ItemStack, Pose, Rotations, VillagerData};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use tracing::trace;
use uuid::Uuid;

/// 1.8 streams end with this key byte.
const LEGACY_TERMINATOR: u8 = 0x7F;
/// 1.9+ streams end with this index byte.
const TERMINATOR: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataType {
    Byte,
    Short,
    Int,
    VarInt,
    Float,
    String,
    Chat,
    OptChat,
    Slot,
    Boolean,
    Vector,
    Rotation,
    Position,
    OptPosition,
    Direction,
    OptUuid,
    BlockId,
    OptBlockId,
    Nbt,
    Particle,
    VillagerData,
    OptVarInt,
    Pose,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    VarInt(i32),
    Float(f32),
    String(String),
    Chat(String),
    OptChat(Option<String>),
    Slot(Option<ItemStack>),
    Boolean(bool),
    /// Three ints; only used by 1.8.
    Vector(BlockPos),
    Rotation(Rotations),
    Position(BlockPos),
    OptPosition(Option<BlockPos>),
    Direction(Direction),
    OptUuid(Option<Uuid>),
    BlockId(i32),
    OptBlockId(Option<i32>),
    Nbt(Option<NbtValue>),
    VillagerData(VillagerData),
    OptVarInt(Option<i32>),
    Pose(Pose),
}

impl MetadataValue {
    pub fn metadata_type(&self) -> MetadataType {
        match self {
            MetadataValue::Byte(_) => MetadataType::Byte,
            MetadataValue::Short(_) => MetadataType::Short,
            MetadataValue::Int(_) => MetadataType::Int,
            MetadataValue::VarInt(_) => MetadataType::VarInt,
            MetadataValue::Float(_) => MetadataType::Float,
            MetadataValue::String(_) => MetadataType::String,
            MetadataValue::Chat(_) => MetadataType::Chat,
            MetadataValue::OptChat(_) => MetadataType::OptChat,
            MetadataValue::Slot(_) => MetadataType::Slot,
            MetadataValue::Boolean(_) => MetadataType::Boolean,
            MetadataValue::Vector(_) => MetadataType::Vector,
            MetadataValue::Rotation(_) => MetadataType::Rotation,
            MetadataValue::Position(_) => MetadataType::Position,
            MetadataValue::OptPosition(_) => MetadataType::OptPosition,
            MetadataValue::Direction(_) => MetadataType::Direction,
            MetadataValue::OptUuid(_) => MetadataType::OptUuid,
            MetadataValue::BlockId(_) => MetadataType::BlockId,
            MetadataValue::OptBlockId(_) => MetadataType::OptBlockId,
            MetadataValue::Nbt(_) => MetadataType::Nbt,
            MetadataValue::VillagerData(_) => MetadataType::VillagerData,
            MetadataValue::OptVarInt(_) => MetadataType::OptVarInt,
            MetadataValue::Pose(_) => MetadataType::Pose,
        }
    }

    /// Coarse value family. The same field changes its exact wire type across
    /// versions (a 1.8 boolean is a byte, air supply went from short to varint),
    /// so lookups compare families rather than exact types.
    fn family(&self) -> u8 {
        match self {
            MetadataValue::Byte(_)
            | MetadataValue::Short(_)
            | MetadataValue::Int(_)
            | MetadataValue::VarInt(_)
            | MetadataValue::Boolean(_)
            | MetadataValue::OptVarInt(_) => 0,
            MetadataValue::Float(_) => 1,
            MetadataValue::String(_) | MetadataValue::Chat(_) | MetadataValue::OptChat(_) => 2,
            MetadataValue::Slot(_) => 3,
            MetadataValue::Vector(_)
            | MetadataValue::Position(_)
            | MetadataValue::OptPosition(_) => 4,
            MetadataValue::Rotation(_) => 5,
            MetadataValue::Direction(_) => 6,
            MetadataValue::OptUuid(_) => 7,
            MetadataValue::BlockId(_) | MetadataValue::OptBlockId(_) => 8,
            MetadataValue::Nbt(_) => 9,
            MetadataValue::VillagerData(_) => 10,
            MetadataValue::Pose(_) => 11,
        }
    }

    pub fn compatible_with(&self, other: &MetadataValue) -> bool {
        self.family() == other.family()
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            MetadataValue::Byte(v) => Some(*v as i32),
            MetadataValue::Short(v) => Some(*v as i32),
            MetadataValue::Int(v) | MetadataValue::VarInt(v) | MetadataValue::BlockId(v) => {
                Some(*v)
            }
            MetadataValue::Boolean(v) => Some(*v as i32),
            MetadataValue::OptVarInt(v) | MetadataValue::OptBlockId(v) => *v,
            _ => None,
        }
    }

    /// Booleans were plain bytes before 1.9; any non-zero byte is true.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Boolean(v) => Some(*v),
            MetadataValue::Byte(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) | MetadataValue::Chat(s) => Some(s),
            MetadataValue::OptChat(s) => s.as_deref(),
            _ => None,
        }
    }

    pub fn as_block_pos(&self) -> Option<BlockPos> {
        match self {
            MetadataValue::Position(p) | MetadataValue::Vector(p) => Some(*p),
            MetadataValue::OptPosition(p) => *p,
            _ => None,
        }
    }

    pub fn as_pose(&self) -> Option<Pose> {
        match self {
            MetadataValue::Pose(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_villager_data(&self) -> Option<VillagerData> {
        match self {
            MetadataValue::VillagerData(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_item(&self) -> Option<&ItemStack> {
        match self {
            MetadataValue::Slot(item) => item.as_ref(),
            _ => None,
        }
    }
}

/// Maps metadata type tags to [`MetadataType`] per protocol version.
/// A `None` value means the type has no tag in that version.
#[derive(Debug, Clone)]
pub struct MetadataTypes {
    codes: Vec<(MetadataType, VersionedValue<Option<i32>>)>,
}

impl MetadataTypes {
    pub fn new(codes: impl IntoIterator<Item = (MetadataType, VersionedValue<Option<i32>>)>) -> Self {
        Self {
            codes: codes.into_iter().collect(),
        }
    }

    pub fn type_for(&self, code: i32, protocol: u32) -> Option<MetadataType> {
        self.codes
            .iter()
            .find(|(_, codes)| *codes.get(protocol) == Some(code))
            .map(|(ty, _)| *ty)
    }

    pub fn code_for(&self, ty: MetadataType, protocol: u32) -> Option<i32> {
        self.codes
            .iter()
            .find(|(t, _)| *t == ty)
            .and_then(|(_, codes)| *codes.get(protocol))
    }
}

/// A decoded metadata stream, keyed by wire index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityMetadata {
    entries: BTreeMap<u8, MetadataValue>,
}

impl EntityMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u8, value: MetadataValue) {
        self.entries.insert(index, value);
    }

    pub fn get_raw(&self, index: u8) -> Option<&MetadataValue> {
        self.entries.get(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn read(buf: &mut BytesMut, protocol: u32, types: &MetadataTypes) -> CodecResult<Self> {
        let mut metadata = Self::new();
        loop {
            let (index, code) = if protocol < V1_9 {
                let key = read_u8(buf)?;
                if key == LEGACY_TERMINATOR {
                    break;
                }
                (key & 0x1F, (key >> 5) as i32)
            } else {
                let index = read_u8(buf)?;
                if index == TERMINATOR {
                    break;
                }
                let code = if protocol < V1_13 {
                    read_u8(buf)? as i32
                } else {
                    read_varint(buf)?
                };
                (index, code)
            };
            let ty = types.type_for(code, protocol).ok_or_else(|| {
                CodecError::InvalidValue(format!(
                    "unknown metadata type {} at index {} (protocol {})",
                    code, index, protocol
                ))
            })?;
            let value = read_value(ty, buf, protocol)?;
            trace!("metadata[{}] = {:?}", index, value);
            metadata.entries.insert(index, value);
        }
        Ok(metadata)
    }

    pub fn write(&self, buf: &mut BytesMut, protocol: u32, types: &MetadataTypes) -> CodecResult<()> {
        for (index, value) in &self.entries {
            let ty = value.metadata_type();
            let code = types.code_for(ty, protocol).ok_or_else(|| {
                CodecError::InvalidValue(format!("{:?} has no type tag in protocol {}", ty, protocol))
            })?;
            if protocol < V1_9 {
                if *index > 0x1F {
                    return Err(CodecError::InvalidValue(format!(
                        "metadata index {} does not fit the 1.8 key byte",
                        index
                    )));
                }
                buf.put_u8(((code as u8) << 5) | index);
            } else {
                if *index == TERMINATOR {
                    return Err(CodecError::InvalidValue("metadata index 255 is reserved".into()));
                }
                buf.put_u8(*index);
                if protocol < V1_13 {
                    buf.put_u8(code as u8);
                } else {
                    write_varint(buf, code);
                }
            }
            write_value(value, buf, protocol);
        }
        buf.put_u8(if protocol < V1_9 {
            LEGACY_TERMINATOR
        } else {
            TERMINATOR
        });
        Ok(())
    }
}

fn read_value(ty: MetadataType, buf: &mut BytesMut, protocol: u32) -> CodecResult<MetadataValue> {
    let value = match ty {
        MetadataType::Byte => MetadataValue::Byte(read_i8(buf)?),
        MetadataType::Short => MetadataValue::Short(read_i16(buf)?),
        MetadataType::Int => MetadataValue::Int(read_i32(buf)?),
        MetadataType::VarInt => MetadataValue::VarInt(read_varint(buf)?),
        MetadataType::Float => MetadataValue::Float(read_f32(buf)?),
        MetadataType::String => MetadataValue::String(read_string(buf, MAX_STRING_LEN)?),
        MetadataType::Chat => MetadataValue::Chat(read_string(buf, MAX_STRING_LEN)?),
        MetadataType::OptChat => MetadataValue::OptChat(if read_bool(buf)? {
            Some(read_string(buf, MAX_STRING_LEN)?)
        } else {
            None
        }),
        MetadataType::Slot => MetadataValue::Slot(read_slot(buf, protocol)?),
        MetadataType::Boolean => MetadataValue::Boolean(read_bool(buf)?),
        MetadataType::Vector => {
            MetadataValue::Vector(BlockPos::new(read_i32(buf)?, read_i32(buf)?, read_i32(buf)?))
        }
        MetadataType::Rotation => MetadataValue::Rotation(Rotations::new(
            read_f32(buf)?,
            read_f32(buf)?,
            read_f32(buf)?,
        )),
        MetadataType::Position => MetadataValue::Position(read_block_pos(buf, protocol)?),
        MetadataType::OptPosition => MetadataValue::OptPosition(if read_bool(buf)? {
            Some(read_block_pos(buf, protocol)?)
        } else {
            None
        }),
        MetadataType::Direction => {
            let id = read_varint(buf)?;
            MetadataValue::Direction(
                Direction::from_id(id)
                    .ok_or_else(|| CodecError::InvalidValue(format!("direction {}", id)))?,
            )
        }
        MetadataType::OptUuid => MetadataValue::OptUuid(if read_bool(buf)? {
            Some(read_uuid(buf)?)
        } else {
            None
        }),
        MetadataType::BlockId => MetadataValue::BlockId(read_varint(buf)?),
        MetadataType::OptBlockId => {
            let id = read_varint(buf)?;
            MetadataValue::OptBlockId(if id == 0 { None } else { Some(id) })
        }
        MetadataType::Nbt => MetadataValue::Nbt(read_nbt(buf)?),
        MetadataType::Particle => {
            return Err(CodecError::InvalidValue(
                "particle metadata values are not supported".into(),
            ))
        }
        MetadataType::VillagerData => MetadataValue::VillagerData(VillagerData {
            villager_type: read_varint(buf)?,
            profession: read_varint(buf)?,
            level: read_varint(buf)?,
        }),
        MetadataType::OptVarInt => {
            let raw = read_varint(buf)?;
            MetadataValue::OptVarInt(if raw == 0 { None } else { Some(raw - 1) })
        }
        MetadataType::Pose => {
            let id = read_varint(buf)?;
            MetadataValue::Pose(
                Pose::from_id(id).ok_or_else(|| CodecError::InvalidValue(format!("pose {}", id)))?,
            )
        }
    };
    Ok(value)
}

fn write_value(value: &MetadataValue, buf: &mut BytesMut, protocol: u32) {
    match value {
        MetadataValue::Byte(v) => buf.put_i8(*v),
        MetadataValue::Short(v) => buf.put_i16(*v),
        MetadataValue::Int(v) => buf.put_i32(*v),
        MetadataValue::VarInt(v) | MetadataValue::BlockId(v) => write_varint(buf, *v),
        MetadataValue::Float(v) => buf.put_f32(*v),
        MetadataValue::String(s) | MetadataValue::Chat(s) => write_string(buf, s),
        MetadataValue::OptChat(s) => {
            buf.put_u8(s.is_some() as u8);
            if let Some(s) = s {
                write_string(buf, s);
            }
        }
        MetadataValue::Slot(item) => write_slot(buf, item, protocol),
        MetadataValue::Boolean(v) => buf.put_u8(*v as u8),
        MetadataValue::Vector(p) => {
            buf.put_i32(p.x);
            buf.put_i32(p.y);
            buf.put_i32(p.z);
        }
        MetadataValue::Rotation(r) => {
            buf.put_f32(r.pitch);
            buf.put_f32(r.yaw);
            buf.put_f32(r.roll);
        }
        MetadataValue::Position(p) => write_block_pos(buf, p, protocol),
        MetadataValue::OptPosition(p) => {
            buf.put_u8(p.is_some() as u8);
            if let Some(p) = p {
                write_block_pos(buf, p, protocol);
            }
        }
        MetadataValue::Direction(d) => write_varint(buf, d.id()),
        MetadataValue::OptUuid(u) => {
            buf.put_u8(u.is_some() as u8);
            if let Some(u) = u {
                write_uuid(buf, u);
            }
        }
        MetadataValue::OptBlockId(id) => write_varint(buf, id.unwrap_or(0)),
        MetadataValue::Nbt(nbt) => write_nbt(buf, nbt),
        MetadataValue::VillagerData(v) => {
            write_varint(buf, v.villager_type);
            write_varint(buf, v.profession);
            write_varint(buf, v.level);
        }
        MetadataValue::OptVarInt(v) => write_varint(buf, v.map_or(0, |v| v + 1)),
        MetadataValue::Pose(p) => write_varint(buf, p.id()),
    }
}

/// A named metadata field with a fallback value.
pub trait MetadataField: Copy + Eq + Hash + Debug {
    /// Returned whenever the field cannot be read from a stream.
    fn default_value(&self) -> MetadataValue;
}

/// Resolves named fields to their wire index for a protocol version.
///
/// Lookups never fail: when the field has no index in the version, the
/// entity did not send it, or the sent value has the wrong type family, the
/// field's default is returned instead.
#[derive(Debug, Clone)]
pub struct FieldResolver<F> {
    indices: HashMap<F, VersionedValue<Option<u8>>>,
}

impl<F: MetadataField> Default for FieldResolver<F> {
    fn default() -> Self {
        Self {
            indices: HashMap::new(),
        }
    }
}

impl<F: MetadataField> FieldResolver<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: F, index: VersionedValue<Option<u8>>) -> Self {
        self.indices.insert(field, index);
        self
    }

    pub fn index_of(&self, field: F, protocol: u32) -> Option<u8> {
        self.indices.get(&field).and_then(|index| *index.get(protocol))
    }

    pub fn contains(&self, field: F) -> bool {
        self.indices.contains_key(&field)
    }

    pub fn get(&self, metadata: &EntityMetadata, field: F, protocol: u32) -> MetadataValue {
        let default = field.default_value();
        let Some(index) = self.index_of(field, protocol) else {
            return default;
        };
        match metadata.get_raw(index) {
            Some(value) if value.compatible_with(&default) => value.clone(),
            Some(value) => {
                trace!(
                    "{:?} at index {} has unexpected value {:?}, using default",
                    field,
                    index,
                    value
                );
                default
            }
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> MetadataTypes {
        MetadataTypes::new([
            (MetadataType::Byte, VersionedValue::new(Some(0))),
            (MetadataType::Short, VersionedValue::new(Some(1)).since(57, None)),
            (MetadataType::Int, VersionedValue::new(Some(2)).since(57, None)),
            (MetadataType::VarInt, VersionedValue::new(None).since(57, Some(1))),
            (MetadataType::Float, VersionedValue::new(Some(3)).since(57, Some(2))),
            (MetadataType::String, VersionedValue::new(Some(4)).since(57, Some(3))),
            (MetadataType::Boolean, VersionedValue::new(None).since(57, Some(6)).since(346, Some(7))),
            (MetadataType::OptChat, VersionedValue::new(None).since(346, Some(5))),
            (MetadataType::Pose, VersionedValue::new(None).since(461, Some(18))),
            (MetadataType::Particle, VersionedValue::new(None).since(346, Some(15))),
        ])
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Field {
        Flags,
        Health,
        Silent,
        Pose,
        Missing,
    }

    impl MetadataField for Field {
        fn default_value(&self) -> MetadataValue {
            match self {
                Field::Flags => MetadataValue::Byte(0),
                Field::Health => MetadataValue::Float(1.0),
                Field::Silent => MetadataValue::Boolean(false),
                Field::Pose => MetadataValue::Pose(Pose::Standing),
                Field::Missing => MetadataValue::VarInt(-5),
            }
        }
    }

    fn resolver() -> FieldResolver<Field> {
        FieldResolver::new()
            .with_field(Field::Flags, VersionedValue::constant(Some(0)))
            .with_field(Field::Health, VersionedValue::new(Some(6)).since(210, Some(7)))
            .with_field(Field::Silent, VersionedValue::new(Some(4)))
            .with_field(Field::Pose, VersionedValue::new(None).since(477, Some(6)))
    }

    #[test]
    fn test_legacy_stream() {
        // key = type << 5 | index
        let mut buf = BytesMut::from(
            &[
                0x00, 0x20, // index 0, byte 0x20
                0x66, 0x41, 0xA0, 0x00, 0x00, // index 6, float 20.0
                0x7F,
            ][..],
        );
        let metadata = EntityMetadata::read(&mut buf, 47, &types()).unwrap();
        assert!(buf.is_empty());
        assert_eq!(metadata.get_raw(0), Some(&MetadataValue::Byte(0x20)));
        assert_eq!(metadata.get_raw(6), Some(&MetadataValue::Float(20.0)));
    }

    #[test]
    fn test_modern_stream_roundtrip() {
        let types = types();
        let mut metadata = EntityMetadata::new();
        metadata.insert(0, MetadataValue::Byte(0x02));
        metadata.insert(2, MetadataValue::OptChat(Some("{\"text\":\"Bob\"}".into())));
        metadata.insert(4, MetadataValue::Boolean(true));
        metadata.insert(6, MetadataValue::Pose(Pose::Sneaking));
        metadata.insert(8, MetadataValue::Float(12.5));

        let mut buf = BytesMut::new();
        metadata.write(&mut buf, 498, &types).unwrap();
        assert_eq!(*buf.last().unwrap(), 0xFF);
        let decoded = EntityMetadata::read(&mut buf, 498, &types).unwrap();
        assert_eq!(decoded, metadata);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_type_without_tag_cannot_be_written() {
        let mut metadata = EntityMetadata::new();
        metadata.insert(1, MetadataValue::Short(300));
        let mut buf = BytesMut::new();
        assert!(metadata.write(&mut buf, 110, &types()).is_err());
    }

    #[test]
    fn test_unknown_and_unsupported_types() {
        let mut buf = BytesMut::from(&[0x00, 0x63, 0x00, 0xFF][..]);
        assert!(matches!(
            EntityMetadata::read(&mut buf, 498, &types()),
            Err(CodecError::InvalidValue(_))
        ));

        let mut buf = BytesMut::from(&[0x00, 15, 0x00, 0xFF][..]);
        assert!(matches!(
            EntityMetadata::read(&mut buf, 498, &types()),
            Err(CodecError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_truncated_stream() {
        let mut buf = BytesMut::from(&[0x00, 0x00][..]);
        assert!(matches!(
            EntityMetadata::read(&mut buf, 498, &types()),
            Err(CodecError::NotEnoughData)
        ));
    }

    #[test]
    fn test_resolver_follows_version() {
        let resolver = resolver();
        let mut legacy = EntityMetadata::new();
        legacy.insert(6, MetadataValue::Float(18.0));
        legacy.insert(4, MetadataValue::Byte(1));
        assert_eq!(resolver.get(&legacy, Field::Health, 47), MetadataValue::Float(18.0));
        // 1.8 booleans are bytes
        assert_eq!(resolver.get(&legacy, Field::Silent, 47).as_bool(), Some(true));

        let mut modern = EntityMetadata::new();
        modern.insert(7, MetadataValue::Float(4.0));
        modern.insert(6, MetadataValue::Pose(Pose::Swimming));
        assert_eq!(resolver.get(&modern, Field::Health, 210), MetadataValue::Float(4.0));
        assert_eq!(resolver.get(&modern, Field::Pose, 498).as_pose(), Some(Pose::Swimming));
    }

    #[test]
    fn test_resolver_falls_back_to_default() {
        let resolver = resolver();
        let mut metadata = EntityMetadata::new();
        metadata.insert(6, MetadataValue::Byte(3));

        // Pose has no index before 1.14
        assert_eq!(resolver.get(&metadata, Field::Pose, 110), MetadataValue::Pose(Pose::Standing));
        // Index exists but the entity did not send it
        assert_eq!(resolver.get(&metadata, Field::Flags, 110), MetadataValue::Byte(0));
        // Wrong type family at the index
        assert_eq!(resolver.get(&metadata, Field::Health, 47), MetadataValue::Float(1.0));
        // Field never registered
        assert!(!resolver.contains(Field::Missing));
        assert_eq!(resolver.get(&metadata, Field::Missing, 736), MetadataValue::VarInt(-5));
    }
}
