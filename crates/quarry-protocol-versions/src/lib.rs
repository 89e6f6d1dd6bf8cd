//! Per-version protocol data: known versions, packet id scripts, metadata
//! type tags, entity data field indices and enum wire codes.

pub mod channels;
pub mod entity_data;
pub mod metadata_types;
pub mod professions;
mod scripts;
pub mod tables;
pub mod versions;

pub use entity_data::EntityDataField;
pub use professions::{ProfessionCodes, VillagerProfession};
pub use tables::ProtocolTables;
pub use versions::KNOWN_VERSIONS;
