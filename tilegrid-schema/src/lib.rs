//! Array schemas and their tiling geometry.
//!
//! An [`ArraySchema`] describes the logical structure of a dense or sparse
//! multidimensional array: its attributes, dimensions, domain, tiling, and
//! traversal orders. Schemas are built with [`ArraySchemaBuilder`], are
//! immutable once built, and round-trip through a compact binary image via
//! [`ArraySchema::serialize`] and [`ArraySchema::deserialize`].
//!
//! The geometry engine — cell and tile positions, tile iteration, overlap
//! classification, Hilbert ids — lives on the schema as functions generic
//! over the coordinate element type, so readers and writers work with
//! typed slices and dispatch once at the boundary.

pub use builder::*;
pub use compression::*;
pub use geometry::*;
pub use hilbert::*;
pub use order::*;
pub use schema::*;
pub use type_spec::*;

mod builder;
mod compression;
mod geometry;
mod hilbert;
mod order;
mod schema;
mod serde;
mod type_spec;

/// The name under which the synthetic coordinates attribute resolves.
///
/// `attribute_id(COORDS_NAME)` yields `attribute_num`, the index of the
/// coordinates entry in the per-attribute tables.
pub const COORDS_NAME: &str = "__coords";

/// Byte width of the offset slot a variable-length cell occupies in tile
/// storage.
pub const VAR_OFFSET_SIZE: usize = 8;

/// Capacity assumed when a sparse schema does not specify one.
pub const DEFAULT_CAPACITY: i64 = 10_000;

/// Consolidation step assumed when a schema does not specify one.
pub const DEFAULT_CONSOLIDATION_STEP: i32 = 1;
