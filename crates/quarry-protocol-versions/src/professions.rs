//! Villager profession wire codes. Before 1.14 professions were a small
//! fixed list; afterwards they are registry ids carried in villager data.

use quarry_protocol_core::version::V1_11;
use quarry_protocol_core::VersionedValue;

const REGISTRY_IDS: u32 = 451;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VillagerProfession {
    None,
    Armorer,
    Blacksmith,
    Butcher,
    Cartographer,
    Cleric,
    Farmer,
    Fisherman,
    Fletcher,
    Leatherworker,
    Librarian,
    Mason,
    Nitwit,
    Priest,
    Shepherd,
    Toolsmith,
    Weaponsmith,
}

impl VillagerProfession {
    pub const ALL: &'static [VillagerProfession] = &[
        VillagerProfession::None,
        VillagerProfession::Armorer,
        VillagerProfession::Blacksmith,
        VillagerProfession::Butcher,
        VillagerProfession::Cartographer,
        VillagerProfession::Cleric,
        VillagerProfession::Farmer,
        VillagerProfession::Fisherman,
        VillagerProfession::Fletcher,
        VillagerProfession::Leatherworker,
        VillagerProfession::Librarian,
        VillagerProfession::Mason,
        VillagerProfession::Nitwit,
        VillagerProfession::Priest,
        VillagerProfession::Shepherd,
        VillagerProfession::Toolsmith,
        VillagerProfession::Weaponsmith,
    ];
}

fn legacy(code: i32) -> VersionedValue<Option<i32>> {
    VersionedValue::new(Some(code)).since(REGISTRY_IDS, None)
}

fn registry(id: i32) -> VersionedValue<Option<i32>> {
    VersionedValue::new(None).since(REGISTRY_IDS, Some(id))
}

fn both(code: i32, id: i32) -> VersionedValue<Option<i32>> {
    VersionedValue::new(Some(code)).since(REGISTRY_IDS, Some(id))
}

#[derive(Debug, Clone)]
pub struct ProfessionCodes {
    codes: Vec<(VillagerProfession, VersionedValue<Option<i32>>)>,
}

impl ProfessionCodes {
    pub fn new() -> Self {
        use VillagerProfession as P;

        Self {
            codes: vec![
                (P::None, registry(0)),
                (P::Armorer, registry(1)),
                (P::Blacksmith, legacy(3)),
                (P::Butcher, both(4, 2)),
                (P::Cartographer, registry(3)),
                (P::Cleric, registry(4)),
                (P::Farmer, both(0, 5)),
                (P::Fisherman, registry(6)),
                (P::Fletcher, registry(7)),
                (P::Leatherworker, registry(8)),
                (P::Librarian, both(1, 9)),
                (P::Mason, registry(10)),
                (
                    P::Nitwit,
                    VersionedValue::new(None)
                        .since(V1_11, Some(5))
                        .since(REGISTRY_IDS, Some(11)),
                ),
                (P::Priest, legacy(2)),
                (P::Shepherd, registry(12)),
                (P::Toolsmith, registry(13)),
                (P::Weaponsmith, registry(14)),
            ],
        }
    }

    pub fn code(&self, profession: VillagerProfession, protocol: u32) -> Option<i32> {
        self.codes
            .iter()
            .find(|(p, _)| *p == profession)
            .and_then(|(_, codes)| *codes.get(protocol))
    }

    pub fn profession(&self, code: i32, protocol: u32) -> Option<VillagerProfession> {
        self.codes
            .iter()
            .find(|(_, codes)| *codes.get(protocol) == Some(code))
            .map(|(p, _)| *p)
    }
}

impl Default for ProfessionCodes {
    fn default() -> Self {
        Self::new()
    }
}
