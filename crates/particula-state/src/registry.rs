//! Registry of particle types.
//!
//! [`ParticlesState`] maps each particle type name to the
//! [`BlockContainer`] holding its particles. A type's schema is fixed when
//! it is first created; asking for it again with another schema is an
//! error rather than a silent re-layout.

use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexMap;

use particula_arena::{BlockConfig, BlockContainer, ConfigError};
use particula_core::AttributeSchema;

use crate::error::StateError;

/// All particle types of a simulation, by name.
pub struct ParticlesState {
    config: BlockConfig,
    containers: IndexMap<String, BlockContainer>,
}

// Compile-time assertion: the registry is read from worker threads during
// extraction.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ParticlesState>();
};

impl ParticlesState {
    /// Create an empty registry whose containers use `config`.
    ///
    /// # Errors
    ///
    /// Returns the [`ConfigError`] if `config` is invalid.
    pub fn new(config: BlockConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            containers: IndexMap::new(),
        })
    }

    /// Block layout shared by every container.
    pub fn block_config(&self) -> &BlockConfig {
        &self.config
    }

    /// The container of type `name`, if it exists.
    pub fn lookup(&self, name: &str) -> Option<&BlockContainer> {
        self.containers.get(name)
    }

    /// The container of type `name`, mutably, if it exists.
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut BlockContainer> {
        self.containers.get_mut(name)
    }

    /// The container of type `name`, created with `schema` if missing.
    ///
    /// # Errors
    ///
    /// [`StateError::SchemaConflict`] if the type exists with a different
    /// schema.
    pub fn lookup_or_create(
        &mut self,
        name: &str,
        schema: &Arc<AttributeSchema>,
    ) -> Result<&mut BlockContainer, StateError> {
        match self.containers.entry(name.to_owned()) {
            Entry::Occupied(entry) => {
                let container = entry.into_mut();
                let existing = container.schema();
                if Arc::ptr_eq(existing, schema) || **existing == **schema {
                    Ok(container)
                } else {
                    Err(StateError::SchemaConflict {
                        name: name.to_owned(),
                    })
                }
            }
            Entry::Vacant(entry) => {
                let container = BlockContainer::new(schema.clone(), &self.config)?;
                tracing::debug!(
                    particle_type = name,
                    attributes = schema.len(),
                    "registered particle type"
                );
                Ok(entry.insert(container))
            }
        }
    }

    /// Remove type `name`, returning its container.
    pub fn remove(&mut self, name: &str) -> Option<BlockContainer> {
        self.containers.shift_remove(name)
    }

    /// `(name, container)` pairs. The order is not part of the contract.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlockContainer)> {
        self.containers.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Mutable `(name, container)` pairs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut BlockContainer)> {
        self.containers.iter_mut().map(|(n, c)| (n.as_str(), c))
    }

    /// Registered type names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Live particles across all types.
    pub fn total_active(&self) -> usize {
        self.containers.values().map(BlockContainer::count_active).sum()
    }

    /// Bytes of block storage held by all containers.
    pub fn memory_bytes(&self) -> usize {
        self.containers.values().map(BlockContainer::memory_bytes).sum()
    }
}

impl Default for ParticlesState {
    fn default() -> Self {
        Self {
            config: BlockConfig::default(),
            containers: IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particula_core::names::SIZE;

    fn registry() -> ParticlesState {
        ParticlesState::new(BlockConfig::new(16)).unwrap()
    }

    #[test]
    fn missing_type_is_none() {
        let state = registry();
        assert!(state.lookup("Dust").is_none());
        assert!(state.is_empty());
        assert_eq!(state.total_active(), 0);
    }

    #[test]
    fn lookup_or_create_creates_once() {
        let mut state = registry();
        let schema = Arc::new(AttributeSchema::renderable());
        state.lookup_or_create("Dust", &schema).unwrap().new_particles(5);
        let dust = state.lookup_or_create("Dust", &schema).unwrap();
        assert_eq!(dust.count_active(), 5);
        assert_eq!(dust.block_capacity(), 16);
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn equal_schema_from_another_arc_is_accepted() {
        let mut state = registry();
        state
            .lookup_or_create("Dust", &Arc::new(AttributeSchema::renderable()))
            .unwrap();
        assert!(state
            .lookup_or_create("Dust", &Arc::new(AttributeSchema::renderable()))
            .is_ok());
    }

    #[test]
    fn different_schema_conflicts() {
        let mut state = registry();
        state
            .lookup_or_create("Dust", &Arc::new(AttributeSchema::renderable()))
            .unwrap();
        let other = Arc::new(
            AttributeSchema::builder()
                .attribute::<f32>(SIZE)
                .build()
                .unwrap(),
        );
        assert_eq!(
            state.lookup_or_create("Dust", &other).err(),
            Some(StateError::SchemaConflict {
                name: "Dust".into()
            })
        );
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(ParticlesState::new(BlockConfig::new(12)).is_err());
    }

    #[test]
    fn totals_and_removal() {
        let mut state = registry();
        let schema = Arc::new(AttributeSchema::renderable());
        state.lookup_or_create("Dust", &schema).unwrap().new_particles(20);
        state.lookup_or_create("Sparks", &schema).unwrap().new_particles(3);
        assert_eq!(state.total_active(), 23);
        let mut names: Vec<_> = state.names().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Dust", "Sparks"]);

        let dust = state.remove("Dust").unwrap();
        assert_eq!(dust.count_active(), 20);
        assert_eq!(state.total_active(), 3);
        assert!(state.remove("Dust").is_none());
    }

    #[test]
    fn iter_mut_reaches_every_container() {
        let mut state = registry();
        let schema = Arc::new(AttributeSchema::renderable());
        state.lookup_or_create("A", &schema).unwrap();
        state.lookup_or_create("B", &schema).unwrap();
        for (_, container) in state.iter_mut() {
            container.new_particles(2);
        }
        assert!(state.iter().all(|(_, c)| c.count_active() == 2));
    }
}
