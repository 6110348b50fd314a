//! Per-frame snapshots of renderable particle attributes.
//!
//! [`FrameCache::cache_frame`] copies Position, Size and Color of every
//! particle type into owned flat buffers and appends one [`CachedFrame`].
//! Cached frames can later be turned back into geometry without the
//! simulation state. [`FrameCache::free_all`] drops every buffer at once.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod error;
pub mod frame;

pub use cache::FrameCache;
pub use error::CacheError;
pub use frame::{CachedAttribute, CachedFrame, CachedType};
