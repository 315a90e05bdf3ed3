#![cfg(target_endian = "little")]
#![deny(missing_docs)]

//! The element-type registry for tilegrid.
//!
//! This crate defines the fixed set of element types an array schema may
//! carry, the mapping between registry entries and native Rust types, and
//! the type-tagged coordinate buffers (domain, tile extents, tile domain)
//! that the schema owns.
//!
//! The registry tags are part of the on-disk schema format and must never
//! be renumbered.

pub use coords::*;
pub use datatype::*;

mod coords;
mod datatype;
