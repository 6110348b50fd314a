//! Error types shared across the Particula workspace.

use std::error::Error;
use std::fmt;

/// Errors from building an [`AttributeSchema`](crate::AttributeSchema).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// An attribute name was empty or whitespace only.
    EmptyName,
    /// The same attribute name was declared twice.
    DuplicateAttribute {
        /// The repeated name.
        name: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "attribute name must not be empty"),
            Self::DuplicateAttribute { name } => {
                write!(f, "attribute '{name}' declared more than once")
            }
        }
    }
}

impl Error for SchemaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_attribute() {
        let err = SchemaError::DuplicateAttribute {
            name: "Position".into(),
        };
        assert!(err.to_string().contains("'Position'"));
    }
}
