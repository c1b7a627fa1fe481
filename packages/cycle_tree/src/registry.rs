//! Fixed-capacity table of registered regions.

use crate::error::Result;
use crate::{Error, Region, RegionId};

/// What to do with region names longer than the configured maximum length.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum OverlongNames {
    /// Keep the leading characters that fit and silently drop the rest.
    #[default]
    Truncate,

    /// Refuse to register the region, returning [`Error::NameTooLong`].
    Reject,
}

/// Owns every region of one profiler, indexed by [`RegionId`].
///
/// Storage for all regions is reserved up front. Registering more regions than the
/// configured capacity is an error, never a reallocation.
#[derive(Debug)]
pub(crate) struct Registry {
    regions: Vec<Region>,
    capacity: usize,
    max_name_length: usize,
    overlong_names: OverlongNames,
}

impl Registry {
    pub(crate) fn new(capacity: usize, max_name_length: usize, overlong_names: OverlongNames) -> Self {
        Self {
            regions: Vec::with_capacity(capacity),
            capacity,
            max_name_length,
            overlong_names,
        }
    }

    /// Registers a new region, even if another region already has the same name.
    pub(crate) fn register(&mut self, name: &str) -> Result<RegionId> {
        let name = self.bounded_name(name)?;
        self.insert(name)
    }

    /// Returns the first region registered under `name`, registering it if there is none.
    ///
    /// The comparison is against the stored (possibly truncated) name.
    pub(crate) fn find_or_register(&mut self, name: &str) -> Result<RegionId> {
        let name = self.bounded_name(name)?;

        match self.regions.iter().position(|region| region.name == name) {
            Some(index) => Ok(RegionId::new(index)),
            None => self.insert(name),
        }
    }

    pub(crate) fn get(&self, id: RegionId) -> Result<&Region> {
        self.regions
            .get(id.index())
            .ok_or(Error::UnknownRegion { id })
    }

    pub(crate) fn get_mut(&mut self, id: RegionId) -> Result<&mut Region> {
        self.regions
            .get_mut(id.index())
            .ok_or(Error::UnknownRegion { id })
    }

    /// Adds cycles to the region total, saturating at `u64::MAX`.
    pub(crate) fn accumulate(&mut self, id: RegionId, cycles: u64) -> Result<()> {
        let region = self.get_mut(id)?;
        region.total_cycles = region.total_cycles.saturating_add(cycles);
        Ok(())
    }

    /// Clears the data of every region. Identities and names stay registered.
    pub(crate) fn reset(&mut self) {
        for region in &mut self.regions {
            region.clear();
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (RegionId, &Region)> {
        self.regions
            .iter()
            .enumerate()
            .map(|(index, region)| (RegionId::new(index), region))
    }

    pub(crate) fn len(&self) -> usize {
        self.regions.len()
    }

    fn insert(&mut self, name: String) -> Result<RegionId> {
        if self.regions.len() >= self.capacity {
            return Err(Error::CapacityExceeded {
                name,
                capacity: self.capacity,
            });
        }

        let id = RegionId::new(self.regions.len());
        tracing::debug!(%id, %name, "registered region");

        self.regions.push(Region::new(name));
        Ok(id)
    }

    fn bounded_name(&self, name: &str) -> Result<String> {
        let length = name.chars().count();

        if length <= self.max_name_length {
            return Ok(name.to_owned());
        }

        match self.overlong_names {
            OverlongNames::Truncate => Ok(name.chars().take(self.max_name_length).collect()),
            OverlongNames::Reject => Err(Error::NameTooLong {
                name: name.to_owned(),
                length,
                max_length: self.max_name_length,
            }),
        }
    }
}
