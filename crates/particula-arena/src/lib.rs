//! Block-based attribute storage for Particula particle types.
//!
//! Particles of one type live in fixed-capacity blocks, one contiguous
//! column per attribute. Blocks are owned by a per-type container that
//! packs new particles first-fit and hands out flat, canonically ordered
//! copies of any attribute.
//!
//! # Architecture
//!
//! ```text
//! BlockContainer (one per particle type)
//! ├── Arc<AttributeSchema> (fixed at construction, shared by every block)
//! ├── AttributeBlock[] (creation order = canonical order)
//! │   └── Box<dyn ColumnData> × attributes (capacity elements each)
//! └── recycle pool (released empty blocks, reused before allocating)
//! ```
//!
//! # Slot lifetime
//!
//! A block's live slots are always the prefix `[0, active_count)`. Freeing a
//! slot swap-removes the last live particle into it, so slot indices are
//! only meaningful until the next removal in that block. There is no stable
//! particle identity.
//!
//! # Flattening
//!
//! [`flatten`] copies one attribute of every live particle into a flat
//! buffer (and back). The parallel variants split the output into disjoint
//! per-block slices and copy them with `rayon`; results are byte-identical
//! to the sequential path.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod config;
pub mod container;
pub mod error;
pub mod flatten;

// Public re-exports for the primary API surface.
pub use block::{AttributeBlock, AttributeSpan, AttributeSpanMut};
pub use config::BlockConfig;
pub use container::{BlockContainer, SlotRange, SlotRanges};
pub use error::{ConfigError, FlattenError};
