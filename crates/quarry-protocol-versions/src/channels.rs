use quarry_protocol_core::version::V1_13;
use quarry_protocol_core::VersionedValue;

/// Plugin channel carrying the client brand.
pub fn brand_channel() -> VersionedValue<&'static str> {
    VersionedValue::new("MC|Brand").since(V1_13, "minecraft:brand")
}
