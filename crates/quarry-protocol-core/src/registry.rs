//! Per-version packet id tables, built by replaying a directive script.
//!
//! A script lists packet kinds in wire order. Each `register` takes the next
//! id of its `(direction, state)` counter, `register_at` pins an id and
//! continues counting from there, and `advance` skips an id the protocol
//! uses for a packet this table does not model.

use crate::error::RegistryError;
use crate::packets::{ClientboundKind, PacketDirection, PacketKind, ServerboundKind};
use crate::state::ConnectionState;
use crate::version::ProtocolVersion;
use std::collections::HashMap;

type IdSpace = (PacketDirection, ConnectionState);

/// Bidirectional `(direction, state, id) <-> kind` table for one protocol version.
#[derive(Debug, Clone)]
pub struct PacketRegistry {
    version: ProtocolVersion,
    by_id: HashMap<(PacketDirection, ConnectionState, i32), PacketKind>,
    by_kind: HashMap<PacketKind, i32>,
}

impl PacketRegistry {
    pub fn builder(version: ProtocolVersion) -> RegistryBuilder {
        RegistryBuilder::new(version)
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn resolve(
        &self,
        direction: PacketDirection,
        state: ConnectionState,
        id: i32,
    ) -> Option<PacketKind> {
        self.by_id.get(&(direction, state, id)).copied()
    }

    pub fn resolve_clientbound(&self, state: ConnectionState, id: i32) -> Option<ClientboundKind> {
        match self.resolve(PacketDirection::Clientbound, state, id)? {
            PacketKind::Clientbound(kind) => Some(kind),
            PacketKind::Serverbound(_) => None,
        }
    }

    pub fn resolve_serverbound(&self, state: ConnectionState, id: i32) -> Option<ServerboundKind> {
        match self.resolve(PacketDirection::Serverbound, state, id)? {
            PacketKind::Serverbound(kind) => Some(kind),
            PacketKind::Clientbound(_) => None,
        }
    }

    /// Wire id of `kind`. The kind already determines direction and state.
    pub fn id_for(&self, kind: impl Into<PacketKind>) -> Option<i32> {
        self.by_kind.get(&kind.into()).copied()
    }

    /// Number of packets registered for one id space.
    pub fn count(&self, direction: PacketDirection, state: ConnectionState) -> usize {
        self.by_id
            .keys()
            .filter(|(d, s, _)| *d == direction && *s == state)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PacketKind, i32)> + '_ {
        self.by_kind.iter().map(|(kind, id)| (*kind, *id))
    }

    pub fn len(&self) -> usize {
        self.by_kind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_kind.is_empty()
    }
}

/// Replays registration directives. The first defect is kept and reported
/// by [`RegistryBuilder::build`], so scripts can be written as plain chains.
#[derive(Debug)]
pub struct RegistryBuilder {
    version: ProtocolVersion,
    counters: HashMap<IdSpace, i32>,
    current: HashMap<PacketDirection, ConnectionState>,
    registry: PacketRegistry,
    error: Option<RegistryError>,
}

impl RegistryBuilder {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            counters: HashMap::new(),
            current: HashMap::new(),
            registry: PacketRegistry {
                version,
                by_id: HashMap::new(),
                by_kind: HashMap::new(),
            },
            error: None,
        }
    }

    /// Start from a copy of an existing table: ids and counters continue
    /// where `base` left off.
    pub fn extending(version: ProtocolVersion, base: &PacketRegistry) -> Self {
        let mut builder = Self::new(version);
        for (kind, id) in base.iter() {
            builder.insert(kind, id);
        }
        builder
    }

    /// Assign the next id of the kind's `(direction, state)` counter.
    pub fn register(&mut self, kind: impl Into<PacketKind>) -> &mut Self {
        let kind = kind.into();
        let id = self
            .counters
            .get(&(kind.direction(), kind.state()))
            .copied()
            .unwrap_or(0);
        self.insert(kind, id);
        self
    }

    /// Pin `kind` to `id`; following registrations continue from `id + 1`.
    pub fn register_at(&mut self, kind: impl Into<PacketKind>, id: i32) -> &mut Self {
        self.insert(kind.into(), id);
        self
    }

    /// Skip one id in the counter of the state last registered for `direction`.
    pub fn advance(&mut self, direction: PacketDirection) -> &mut Self {
        match self.current.get(&direction) {
            Some(state) => {
                *self.counters.entry((direction, *state)).or_insert(0) += 1;
            }
            None => self.fail(RegistryError::AdvanceWithoutState {
                protocol: self.version.protocol(),
                direction,
            }),
        }
        self
    }

    pub fn build(self) -> Result<PacketRegistry, RegistryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.registry),
        }
    }

    fn insert(&mut self, kind: PacketKind, id: i32) {
        let (direction, state) = (kind.direction(), kind.state());
        let protocol = self.version.protocol();
        if self.registry.by_kind.contains_key(&kind) {
            self.fail(RegistryError::DuplicateKind { protocol, kind });
            return;
        }
        if let Some(existing) = self.registry.by_id.get(&(direction, state, id)) {
            let existing = *existing;
            self.fail(RegistryError::DuplicateId {
                protocol,
                direction,
                state,
                id,
                existing,
                new: kind,
            });
            return;
        }
        self.registry.by_id.insert((direction, state, id), kind);
        self.registry.by_kind.insert(kind, id);
        let counter = self.counters.entry((direction, state)).or_insert(0);
        *counter = (*counter).max(id + 1);
        self.current.insert(direction, state);
    }

    fn fail(&mut self, error: RegistryError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
