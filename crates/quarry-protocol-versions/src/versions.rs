use quarry_protocol_core::{ProtocolVersion, RegistryError, VersionRegistry};

pub const V1_8_9: ProtocolVersion = ProtocolVersion::new(47, "1.8.9");
pub const V1_9_4: ProtocolVersion = ProtocolVersion::new(110, "1.9.4");
pub const V1_10_2: ProtocolVersion = ProtocolVersion::new(210, "1.10.2");
pub const V1_14_4: ProtocolVersion = ProtocolVersion::new(498, "1.14.4");
pub const V1_16: ProtocolVersion = ProtocolVersion::new(735, "1.16");
pub const V1_16_1: ProtocolVersion = ProtocolVersion::new(736, "1.16.1");

/// Every version with a packet table, ascending.
pub const KNOWN_VERSIONS: &[ProtocolVersion] = &[V1_8_9, V1_9_4, V1_10_2, V1_14_4, V1_16, V1_16_1];

pub fn version_registry() -> Result<VersionRegistry, RegistryError> {
    VersionRegistry::new(KNOWN_VERSIONS.iter().copied())
}
