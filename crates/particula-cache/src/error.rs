//! Frame cache error types.

use std::error::Error;
use std::fmt;

use particula_arena::FlattenError;

/// Errors from [`FrameCache::cache_frame`](crate::FrameCache::cache_frame).
///
/// All attribute checks run before anything is copied, so on error the
/// cache is unchanged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheError {
    /// A particle type lacks an attribute the cache records.
    MissingAttribute {
        /// The particle type.
        particle_type: String,
        /// The missing attribute.
        attribute: &'static str,
    },
    /// A recorded attribute has an unexpected value type.
    WrongAttributeType {
        /// The particle type.
        particle_type: String,
        /// The attribute.
        attribute: &'static str,
        /// Value type the cache records.
        expected: &'static str,
        /// Value type found in the schema.
        actual: &'static str,
    },
    /// Copying attribute data out of the blocks failed.
    Flatten(FlattenError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAttribute {
                particle_type,
                attribute,
            } => write!(f, "particle type '{particle_type}' has no '{attribute}' attribute"),
            Self::WrongAttributeType {
                particle_type,
                attribute,
                expected,
                actual,
            } => write!(
                f,
                "attribute '{attribute}' of particle type '{particle_type}' is {actual}, expected {expected}"
            ),
            Self::Flatten(e) => write!(f, "flatten failed: {e}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Flatten(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FlattenError> for CacheError {
    fn from(e: FlattenError) -> Self {
        Self::Flatten(e)
    }
}
