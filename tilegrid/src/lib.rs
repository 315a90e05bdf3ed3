//! Multidimensional array schemas with tiling geometry and a binary schema
//! codec.

pub use tilegrid_schema::*;
pub use {
    tilegrid_dtype as dtype, tilegrid_error as error, tilegrid_schema as schema,
};
