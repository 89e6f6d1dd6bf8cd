use crate::channels::brand_channel;
use crate::entity_data::{entity_data_fields, EntityDataField};
use crate::metadata_types::metadata_types;
use crate::professions::ProfessionCodes;
use crate::scripts::build_registry;
use crate::versions::version_registry;
use quarry_protocol_core::{
    EntityMetadata, FieldResolver, MetadataTypes, MetadataValue, PacketRegistry, ProtocolAdapter,
    RegistryError, VersionRegistry, VersionedValue,
};
use std::sync::Arc;
use tracing::debug;

/// Every version-dependent table, built once at startup and read-only after.
#[derive(Debug)]
pub struct ProtocolTables {
    versions: VersionRegistry,
    packets: VersionedValue<Arc<PacketRegistry>>,
    metadata_types: MetadataTypes,
    entity_data: FieldResolver<EntityDataField>,
    professions: ProfessionCodes,
    brand_channel: VersionedValue<&'static str>,
}

impl ProtocolTables {
    /// Replay every packet script. Any defect in a script fails the whole
    /// build.
    pub fn build() -> Result<Self, RegistryError> {
        let versions = version_registry()?;

        let mut tables = Vec::with_capacity(versions.len());
        for version in versions.iter() {
            let registry = build_registry(version)?;
            debug!("Built packet table for {} with {} packets", version, registry.len());
            tables.push((version.protocol(), Arc::new(registry)));
        }
        let packets = VersionedValue::from_breakpoints(tables).ok_or(RegistryError::NoVersions)?;

        Ok(Self {
            versions,
            packets,
            metadata_types: metadata_types(),
            entity_data: entity_data_fields(),
            professions: ProfessionCodes::new(),
            brand_channel: brand_channel(),
        })
    }

    pub fn shared() -> Result<Arc<Self>, RegistryError> {
        Self::build().map(Arc::new)
    }

    pub fn packets(&self, protocol: u32) -> &Arc<PacketRegistry> {
        self.packets.get(protocol)
    }

    pub fn entity_data(&self) -> &FieldResolver<EntityDataField> {
        &self.entity_data
    }

    /// Value of a named field, or its default when the version or the
    /// stream does not carry it.
    pub fn entity_field(
        &self,
        metadata: &EntityMetadata,
        field: EntityDataField,
        protocol: u32,
    ) -> MetadataValue {
        self.entity_data.get(metadata, field, protocol)
    }

    pub fn professions(&self) -> &ProfessionCodes {
        &self.professions
    }

    pub fn brand_channel(&self, protocol: u32) -> &'static str {
        *self.brand_channel.get(protocol)
    }
}

impl ProtocolAdapter for ProtocolTables {
    fn versions(&self) -> &VersionRegistry {
        &self.versions
    }

    fn registry(&self, protocol: u32) -> &PacketRegistry {
        self.packets.get(protocol)
    }

    fn metadata_types(&self) -> &MetadataTypes {
        &self.metadata_types
    }
}
