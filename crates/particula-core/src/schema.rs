//! Attribute schemas: the fixed `name → AttributeType` table of a particle type.
//!
//! A schema is built once with [`SchemaBuilder`] and then shared (via `Arc`)
//! by a container and every block it owns. It uses `IndexMap` so attribute
//! order, and therefore column order inside blocks, is deterministic.

use indexmap::IndexMap;

use crate::attribute::{AttributeType, AttributeValue};
use crate::error::SchemaError;
use crate::id::AttributeId;
use crate::math::{Float3, Rgba};

/// Names of the attributes the renderer and frame cache rely on.
pub mod names {
    /// Particle position, a `Float3`.
    pub const POSITION: &str = "Position";
    /// Particle size, an `f32`.
    pub const SIZE: &str = "Size";
    /// Particle color, an `Rgba`.
    pub const COLOR: &str = "Color";
    /// Particle velocity, a `Float3`.
    pub const VELOCITY: &str = "Velocity";
}

/// Immutable, ordered attribute table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeSchema {
    attributes: IndexMap<String, AttributeType>,
}

impl AttributeSchema {
    /// Start building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            attributes: Vec::new(),
        }
    }

    /// Schema with the renderable attributes: Position, Size and Color.
    pub fn renderable() -> Self {
        Self::builder()
            .attribute::<Float3>(names::POSITION)
            .attribute::<f32>(names::SIZE)
            .attribute::<Rgba>(names::COLOR)
            .build()
            .expect("builtin attribute names are unique and non-empty")
    }

    /// Look up an attribute's index by name.
    pub fn index_of(&self, name: &str) -> Option<AttributeId> {
        self.attributes
            .get_index_of(name)
            .map(|i| AttributeId(i as u32))
    }

    /// Look up an attribute's type by name.
    pub fn type_of(&self, name: &str) -> Option<&AttributeType> {
        self.attributes.get(name)
    }

    /// Name and type of the attribute at `id`.
    pub fn get(&self, id: AttributeId) -> Option<(&str, &AttributeType)> {
        self.attributes
            .get_index(id.0 as usize)
            .map(|(name, ty)| (name.as_str(), ty))
    }

    /// Whether an attribute with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Resolve a name to its index, panicking if it is unknown.
    ///
    /// Unknown attribute names at access time are a caller bug.
    #[track_caller]
    pub fn expect_index(&self, name: &str) -> AttributeId {
        match self.index_of(name) {
            Some(id) => id,
            None => panic!(
                "unknown attribute '{name}' (schema has: {})",
                self.names().collect::<Vec<_>>().join(", ")
            ),
        }
    }

    /// Attribute names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// `(name, type)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeType)> {
        self.attributes.iter().map(|(n, t)| (n.as_str(), t))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the schema has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Sum of all attribute element sizes: bytes used per particle.
    pub fn bytes_per_particle(&self) -> usize {
        self.attributes.values().map(AttributeType::size).sum()
    }
}

/// Builder for [`AttributeSchema`].
///
/// Validation happens in [`build`](SchemaBuilder::build) so attributes can be
/// chained without intermediate `Result`s.
#[derive(Clone, Debug)]
pub struct SchemaBuilder {
    attributes: Vec<(String, AttributeType)>,
}

impl SchemaBuilder {
    /// Add an attribute of value type `T`.
    pub fn attribute<T: AttributeValue>(self, name: impl Into<String>) -> Self {
        self.attribute_of(name, AttributeType::of::<T>())
    }

    /// Add an attribute with an explicit descriptor.
    pub fn attribute_of(mut self, name: impl Into<String>, ty: AttributeType) -> Self {
        self.attributes.push((name.into(), ty));
        self
    }

    /// Validate and build the schema.
    ///
    /// # Errors
    ///
    /// [`SchemaError::EmptyName`] for a blank attribute name and
    /// [`SchemaError::DuplicateAttribute`] when a name is declared twice.
    pub fn build(self) -> Result<AttributeSchema, SchemaError> {
        let mut attributes = IndexMap::with_capacity(self.attributes.len());
        for (name, ty) in self.attributes {
            if name.trim().is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if attributes.contains_key(&name) {
                return Err(SchemaError::DuplicateAttribute { name });
            }
            attributes.insert(name, ty);
        }
        Ok(AttributeSchema { attributes })
    }
}
