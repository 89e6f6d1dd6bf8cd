//! Named entity data fields and the index each sits at per version.
//!
//! Indices move whenever a field is inserted higher up an entity's class
//! chain, so every lookup goes through [`entity_data_fields`] and falls back
//! to the field default when the index does not exist for a version.

use quarry_protocol_core::version::{V1_10, V1_14, V1_15, V1_8, V1_9};
use quarry_protocol_core::{FieldResolver, MetadataField, MetadataValue, VersionedValue};
use quarry_types::{Pose, VillagerData};

/// First protocol with registry-based villager data.
const VILLAGER_DATA: u32 = 451;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityDataField {
    // Entity
    EntityFlags,
    AirSupply,
    CustomName,
    CustomNameVisible,
    Silent,
    NoGravity,
    Pose,
    // Living
    LivingHandFlags,
    Health,
    EffectColor,
    EffectAmbience,
    ArrowCount,
    BedPosition,
    // Player
    PlayerAbsorption,
    PlayerScore,
    SkinParts,
    MainHand,
    // Villager
    VillagerProfession,
    VillagerData,
}

impl MetadataField for EntityDataField {
    fn default_value(&self) -> MetadataValue {
        match self {
            EntityDataField::EntityFlags => MetadataValue::Byte(0),
            EntityDataField::AirSupply => MetadataValue::VarInt(300),
            EntityDataField::CustomName => MetadataValue::OptChat(None),
            EntityDataField::CustomNameVisible
            | EntityDataField::Silent
            | EntityDataField::NoGravity
            | EntityDataField::EffectAmbience => MetadataValue::Boolean(false),
            EntityDataField::Pose => MetadataValue::Pose(Pose::Standing),
            EntityDataField::LivingHandFlags => MetadataValue::Byte(0),
            EntityDataField::Health => MetadataValue::Float(1.0),
            EntityDataField::EffectColor
            | EntityDataField::ArrowCount
            | EntityDataField::PlayerScore
            | EntityDataField::VillagerProfession => MetadataValue::VarInt(0),
            EntityDataField::BedPosition => MetadataValue::OptPosition(None),
            EntityDataField::PlayerAbsorption => MetadataValue::Float(0.0),
            EntityDataField::SkinParts => MetadataValue::Byte(0),
            EntityDataField::MainHand => MetadataValue::Byte(1),
            EntityDataField::VillagerData => MetadataValue::VillagerData(VillagerData::default()),
        }
    }
}

fn at(index: u8) -> VersionedValue<Option<u8>> {
    VersionedValue::constant(Some(index))
}

fn from(protocol: u32, index: u8) -> VersionedValue<Option<u8>> {
    VersionedValue::new(None).since(protocol, Some(index))
}

fn moves(points: &[(u32, u8)]) -> VersionedValue<Option<u8>> {
    VersionedValue::with_breakpoints(None, points.iter().map(|(p, i)| (*p, Some(*i))))
}

pub fn entity_data_fields() -> FieldResolver<EntityDataField> {
    use EntityDataField as F;

    FieldResolver::new()
        .with_field(F::EntityFlags, at(0))
        .with_field(F::AirSupply, at(1))
        .with_field(F::CustomName, at(2))
        .with_field(F::CustomNameVisible, at(3))
        .with_field(F::Silent, at(4))
        .with_field(F::NoGravity, from(V1_10, 5))
        .with_field(F::Pose, from(V1_14, 6))
        .with_field(F::LivingHandFlags, moves(&[(V1_9, 5), (V1_10, 6), (V1_14, 7)]))
        .with_field(F::Health, moves(&[(V1_8, 6), (V1_10, 7), (V1_14, 8)]))
        .with_field(F::EffectColor, moves(&[(V1_8, 7), (V1_10, 8), (V1_14, 9)]))
        .with_field(F::EffectAmbience, moves(&[(V1_8, 8), (V1_10, 9), (V1_14, 10)]))
        .with_field(F::ArrowCount, moves(&[(V1_8, 9), (V1_10, 10), (V1_14, 11)]))
        .with_field(F::BedPosition, moves(&[(V1_14, 12), (V1_15, 13)]))
        .with_field(
            F::PlayerAbsorption,
            moves(&[(V1_8, 17), (V1_9, 10), (V1_10, 11), (V1_14, 13), (V1_15, 14)]),
        )
        .with_field(
            F::PlayerScore,
            moves(&[(V1_8, 18), (V1_9, 11), (V1_10, 12), (V1_14, 14), (V1_15, 15)]),
        )
        .with_field(
            F::SkinParts,
            moves(&[(V1_8, 10), (V1_9, 12), (V1_10, 13), (V1_14, 15), (V1_15, 16)]),
        )
        .with_field(
            F::MainHand,
            moves(&[(V1_9, 13), (V1_10, 14), (V1_14, 16), (V1_15, 17)]),
        )
        .with_field(
            F::VillagerProfession,
            VersionedValue::with_breakpoints(
                None,
                [
                    (V1_8, Some(16)),
                    (V1_9, Some(12)),
                    (V1_10, Some(13)),
                    (VILLAGER_DATA, None),
                ],
            ),
        )
        .with_field(F::VillagerData, moves(&[(V1_14, 16), (V1_15, 17)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_protocol_core::EntityMetadata;

    #[test]
    fn test_indices_move_between_versions() {
        let fields = entity_data_fields();
        let cases: &[(EntityDataField, u32, Option<u8>)] = &[
            (EntityDataField::Health, 47, Some(6)),
            (EntityDataField::Health, 110, Some(6)),
            (EntityDataField::Health, 210, Some(7)),
            (EntityDataField::Health, 498, Some(8)),
            (EntityDataField::Health, 736, Some(8)),
            (EntityDataField::NoGravity, 110, None),
            (EntityDataField::NoGravity, 210, Some(5)),
            (EntityDataField::Pose, 340, None),
            (EntityDataField::Pose, 498, Some(6)),
            (EntityDataField::MainHand, 47, None),
            (EntityDataField::MainHand, 736, Some(17)),
            (EntityDataField::PlayerAbsorption, 47, Some(17)),
            (EntityDataField::PlayerAbsorption, 498, Some(13)),
            (EntityDataField::VillagerProfession, 210, Some(13)),
            (EntityDataField::VillagerProfession, 498, None),
            (EntityDataField::VillagerData, 498, Some(16)),
            (EntityDataField::VillagerData, 736, Some(17)),
        ];
        for (field, protocol, expected) in cases {
            assert_eq!(
                fields.index_of(*field, *protocol),
                *expected,
                "{:?} at {}",
                field,
                protocol
            );
        }
    }

    #[test]
    fn test_lookup_reads_present_value() {
        let fields = entity_data_fields();
        let mut metadata = EntityMetadata::new();
        metadata.insert(8, MetadataValue::Float(17.5));
        metadata.insert(6, MetadataValue::Pose(Pose::Sneaking));
        assert_eq!(
            fields.get(&metadata, EntityDataField::Health, 498),
            MetadataValue::Float(17.5)
        );
        assert_eq!(
            fields.get(&metadata, EntityDataField::Pose, 498),
            MetadataValue::Pose(Pose::Sneaking)
        );
    }

    #[test]
    fn test_lookup_falls_back_to_default() {
        let fields = entity_data_fields();
        let mut metadata = EntityMetadata::new();
        metadata.insert(6, MetadataValue::Float(4.0));

        // Field absent in this version
        assert_eq!(
            fields.get(&metadata, EntityDataField::Pose, 47),
            MetadataValue::Pose(Pose::Standing)
        );
        // Index exists, entity did not send it
        assert_eq!(
            fields.get(&metadata, EntityDataField::MainHand, 110),
            MetadataValue::Byte(1)
        );
        // Something of the wrong kind sits at the index
        assert_eq!(
            fields.get(&metadata, EntityDataField::Pose, 498),
            MetadataValue::Pose(Pose::Standing)
        );
        assert_eq!(
            fields.get(&metadata, EntityDataField::Health, 47),
            MetadataValue::Float(4.0)
        );
    }

    #[test]
    fn test_legacy_byte_booleans_accepted() {
        let fields = entity_data_fields();
        let mut metadata = EntityMetadata::new();
        metadata.insert(4, MetadataValue::Byte(1));
        assert_eq!(
            fields.get(&metadata, EntityDataField::Silent, 47),
            MetadataValue::Byte(1)
        );
    }
}
