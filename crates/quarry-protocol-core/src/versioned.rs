use crate::version::floor_entry;
use std::collections::BTreeMap;

/// A value that changes at specific protocol versions.
///
/// `get(v)` returns the value of the greatest breakpoint `<= v`, or the floor
/// value when `v` is below every breakpoint. Used for packet tables, enum
/// wire codes and metadata field indices alike.
///
/// Equality is per entry: two maps are equal only if their floors and every
/// breakpoint match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue<T> {
    floor: T,
    breakpoints: BTreeMap<u32, T>,
}

impl<T> VersionedValue<T> {
    /// A value that applies from the lowest supported version onward.
    pub fn new(floor: T) -> Self {
        Self {
            floor,
            breakpoints: BTreeMap::new(),
        }
    }

    /// Same as [`VersionedValue::new`]; reads better for values that never change.
    pub fn constant(value: T) -> Self {
        Self::new(value)
    }

    pub fn with_breakpoints(floor: T, breakpoints: impl IntoIterator<Item = (u32, T)>) -> Self {
        Self {
            floor,
            breakpoints: breakpoints.into_iter().collect(),
        }
    }

    /// Builder form: `value` applies from `protocol` until the next breakpoint.
    pub fn since(mut self, protocol: u32, value: T) -> Self {
        self.breakpoints.insert(protocol, value);
        self
    }

    pub fn get(&self, protocol: impl Into<u32>) -> &T {
        floor_entry(&self.breakpoints, protocol.into())
            .map(|(_, v)| v)
            .unwrap_or(&self.floor)
    }

    pub fn floor(&self) -> &T {
        &self.floor
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = (u32, &T)> {
        self.breakpoints.iter().map(|(k, v)| (*k, v))
    }

    /// Every distinct value together with the first protocol it applies from
    /// (`None` for the floor).
    pub fn entries(&self) -> impl Iterator<Item = (Option<u32>, &T)> {
        std::iter::once((None, &self.floor))
            .chain(self.breakpoints.iter().map(|(k, v)| (Some(*k), v)))
    }
}

impl<T: Clone> VersionedValue<T> {
    /// Builds from breakpoints alone; the lowest breakpoint also serves as the floor.
    /// Returns `None` when no breakpoints are given.
    pub fn from_breakpoints(breakpoints: impl IntoIterator<Item = (u32, T)>) -> Option<Self> {
        let breakpoints: BTreeMap<u32, T> = breakpoints.into_iter().collect();
        let floor = breakpoints.values().next()?.clone();
        Some(Self { floor, breakpoints })
    }
}

impl<T: Default> Default for VersionedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
