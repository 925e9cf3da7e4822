//! Bike systems and their indexes.

use crate::config::{ConfigError, Source, SystemConfig, SystemId};

use super::index::StationIndex;

/// One bike system: where its data comes from and what is known so far.
#[derive(Debug)]
pub struct BikeSystem {
    id: SystemId,
    sources: Vec<Source>,
    index: StationIndex,
}

impl BikeSystem {
    /// Create a system with an empty index.
    pub fn new(id: SystemId, sources: Vec<Source>) -> Self {
        Self {
            id,
            sources,
            index: StationIndex::new(),
        }
    }

    pub fn id(&self) -> SystemId {
        self.id
    }

    /// Fetch sources, in configured order.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn index(&self) -> &StationIndex {
        &self.index
    }
}

/// Every configured bike system, one per [`SystemId`].
#[derive(Debug)]
pub struct BikeSystems {
    systems: [BikeSystem; 2],
}

impl BikeSystems {
    /// Build the systems from configuration.
    ///
    /// Each [`SystemId`] must appear exactly once.
    pub fn from_config(configs: &[SystemConfig]) -> Result<Self, ConfigError> {
        let mut slots: [Option<BikeSystem>; 2] = [None, None];

        for config in configs {
            let slot = &mut slots[config.id.slot()];
            if slot.is_some() {
                return Err(ConfigError::DuplicateSystem(config.id));
            }
            *slot = Some(BikeSystem::new(config.id, config.sources.clone()));
        }

        let [youbike, youbike2] = slots;
        let youbike = youbike.ok_or(ConfigError::MissingSystem(SystemId::YouBike))?;
        let youbike2 = youbike2.ok_or(ConfigError::MissingSystem(SystemId::YouBike2))?;

        Ok(Self {
            systems: [youbike, youbike2],
        })
    }

    pub fn get(&self, id: SystemId) -> &BikeSystem {
        &self.systems[id.slot()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &BikeSystem> {
        self.systems.iter()
    }
}
