//! Core types for the Particula particle storage engine.
//!
//! This is the leaf crate of the workspace. It defines the plain-old-data
//! value types stored per particle, the runtime [`AttributeType`]
//! descriptor that lets blocks hold heterogeneous columns without
//! compile-time knowledge, the [`AttributeSchema`] naming those columns,
//! and shared identifiers and errors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod attribute;
pub mod error;
pub mod id;
pub mod math;
pub mod schema;

pub use attribute::{AttributeType, AttributeValue, ColumnData, TypedColumn};
pub use error::SchemaError;
pub use id::{AttributeId, BlockId, FrameIndex};
pub use math::{Float3, Rgba, Rgba8};
pub use schema::{names, AttributeSchema, SchemaBuilder};
