use crate::error::RegistryError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

// Release protocol numbers used as change points by the codecs.
pub const V1_8: u32 = 47;
pub const V1_9: u32 = 107;
pub const V1_9_1: u32 = 108;
pub const V1_9_4: u32 = 110;
pub const V1_10: u32 = 210;
pub const V1_11: u32 = 315;
pub const V1_12_2: u32 = 340;
pub const V1_13: u32 = 393;
pub const V1_13_2: u32 = 404;
pub const V1_14: u32 = 477;
pub const V1_14_4: u32 = 498;
pub const V1_15: u32 = 573;
pub const V1_16: u32 = 735;
pub const V1_16_1: u32 = 736;

/// First protocol that sends keep-alive ids as a long instead of a VarInt.
pub const KEEP_ALIVE_LONG: u32 = 339;
/// First protocol that sends the login-success UUID as 16 raw bytes.
pub const LOGIN_UUID_BINARY: u32 = 707;

/// A protocol revision: the release number used on the wire plus a display label.
/// Ordering, equality and hashing only look at the number.
#[derive(Debug, Clone, Copy)]
pub struct ProtocolVersion {
    protocol: u32,
    name: &'static str,
}

impl ProtocolVersion {
    pub const fn new(protocol: u32, name: &'static str) -> Self {
        Self { protocol, name }
    }

    pub fn protocol(&self) -> u32 {
        self.protocol
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ProtocolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol
    }
}

impl Eq for ProtocolVersion {}

impl Hash for ProtocolVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.protocol.hash(state);
    }
}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.protocol.cmp(&other.protocol)
    }
}

impl From<ProtocolVersion> for u32 {
    fn from(version: ProtocolVersion) -> u32 {
        version.protocol
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.protocol)
    }
}

/// The entry with the greatest key `<= protocol`, if any.
pub(crate) fn floor_entry<T>(map: &BTreeMap<u32, T>, protocol: u32) -> Option<(&u32, &T)> {
    map.range(..=protocol).next_back()
}

/// All protocol versions this build knows about, in ascending order.
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    versions: BTreeMap<u32, ProtocolVersion>,
    lowest: ProtocolVersion,
}

impl VersionRegistry {
    pub fn new(versions: impl IntoIterator<Item = ProtocolVersion>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for version in versions {
            if let Some(existing) = map.insert(version.protocol, version) {
                return Err(RegistryError::DuplicateVersion {
                    protocol: version.protocol,
                    first: existing.name,
                    second: version.name,
                });
            }
        }
        let lowest = match map.values().next() {
            Some(v) => *v,
            None => return Err(RegistryError::NoVersions),
        };
        Ok(Self {
            versions: map,
            lowest,
        })
    }

    /// The closest known version `<= protocol`, or the lowest supported version.
    pub fn floor(&self, protocol: u32) -> ProtocolVersion {
        floor_entry(&self.versions, protocol)
            .map(|(_, v)| *v)
            .unwrap_or(self.lowest)
    }

    pub fn lowest(&self) -> ProtocolVersion {
        self.lowest
    }

    pub fn highest(&self) -> ProtocolVersion {
        self.versions
            .values()
            .next_back()
            .copied()
            .unwrap_or(self.lowest)
    }

    /// Exact lookup by protocol number.
    pub fn by_protocol(&self, protocol: u32) -> Option<ProtocolVersion> {
        self.versions.get(&protocol).copied()
    }

    /// Exact lookup by label, e.g. `"1.14.4"`.
    pub fn by_name(&self, name: &str) -> Option<ProtocolVersion> {
        self.versions.values().find(|v| v.name == name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ProtocolVersion> + '_ {
        self.versions.values().copied()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
