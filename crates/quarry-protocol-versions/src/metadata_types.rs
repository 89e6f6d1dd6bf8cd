//! Entity metadata type tags. Keys are raw protocol numbers, including the
//! snapshots where a tag was introduced.

use quarry_protocol_core::{MetadataType, MetadataTypes, VersionedValue};

fn since(protocol: u32, code: i32) -> VersionedValue<Option<i32>> {
    VersionedValue::new(None).since(protocol, Some(code))
}

fn until(code: i32, protocol: u32) -> VersionedValue<Option<i32>> {
    VersionedValue::new(Some(code)).since(protocol, None)
}

pub fn metadata_types() -> MetadataTypes {
    MetadataTypes::new([
        (MetadataType::Byte, VersionedValue::constant(Some(0))),
        (MetadataType::Short, until(1, 57)),
        (MetadataType::Int, until(2, 57)),
        (MetadataType::VarInt, since(57, 1)),
        (MetadataType::Float, VersionedValue::new(Some(3)).since(57, Some(2))),
        (MetadataType::String, VersionedValue::new(Some(4)).since(57, Some(3))),
        (MetadataType::Chat, since(57, 4)),
        (MetadataType::OptChat, since(346, 5)),
        (MetadataType::Slot, VersionedValue::new(Some(5)).since(346, Some(6))),
        (MetadataType::Boolean, since(57, 6).since(346, Some(7))),
        (MetadataType::Vector, until(6, 57)),
        (
            MetadataType::Rotation,
            VersionedValue::new(Some(7)).since(346, Some(8)),
        ),
        (MetadataType::Position, since(57, 8).since(346, Some(9))),
        (MetadataType::OptPosition, since(57, 9).since(346, Some(10))),
        (MetadataType::Direction, since(57, 10).since(346, Some(11))),
        (MetadataType::OptUuid, since(57, 11).since(346, Some(12))),
        (MetadataType::BlockId, since(57, 12).since(210, None)),
        (MetadataType::OptBlockId, since(210, 12).since(346, Some(13))),
        (MetadataType::Nbt, since(318, 13).since(346, Some(14))),
        (MetadataType::Particle, since(346, 15)),
        (MetadataType::VillagerData, since(451, 16)),
        (MetadataType::OptVarInt, since(459, 17)),
        (MetadataType::Pose, since(461, 18)),
    ])
}
