//! Coordinate, tile, and overlap geometry.
//!
//! All operations are generic over the coordinate element type `T` and
//! dispatch once at the call boundary: a caller resolves the schema's
//! coordinate type, then drives the monomorphized functions with typed
//! slices. Shapes are interleaved per dimension, `[lo_0, hi_0, lo_1,
//! hi_1, ...]`.

use num_traits::ToPrimitive;
use tilegrid_dtype::{CoordBuffer, CoordDatatype};
use tilegrid_error::{tilegrid_bail, tilegrid_err, TileGridExpect, TileGridResult};

use crate::{ArraySchema, Order};

/// How a query range overlaps an MBR or a tile rectangle.
///
/// Kind 3 ("contiguous/full") covers both an overlap equal to the whole
/// rectangle and one that is scan-order contiguous inside it; Hilbert cell
/// order reaches it only through whole-rectangle equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Overlap {
    /// The shapes are disjoint.
    None,
    /// The shapes overlap, but not contiguously in scan order.
    Partial,
    /// The overlap is the whole rectangle, or is contiguous in scan order.
    Contig,
}

impl ArraySchema {
    /// The number of cells along the fastest-varying dimension inside a
    /// slab-aligned range.
    ///
    /// Fails with `IncompatibleOrder` under Hilbert cell order, which has
    /// no slab dimension.
    pub fn cell_num_in_range_slab<T: CoordDatatype>(&self, range: &[T]) -> TileGridResult<T> {
        self.check_coord_type::<T>()?;
        let dim_num = self.dim_num();
        if range.len() != 2 * dim_num {
            tilegrid_bail!(
                "range holds {} values, expected {}",
                range.len(),
                2 * dim_num
            );
        }
        let d = match self.cell_order() {
            Order::RowMajor => dim_num - 1,
            Order::ColumnMajor => 0,
            Order::Hilbert => {
                tilegrid_bail!(IncompatibleOrder: "hilbert order has no slab dimension")
            }
        };
        Ok(range[2 * d + 1] - range[2 * d] + T::one())
    }

    /// The extent of a tile along the fastest-varying dimension.
    ///
    /// Fails with `IncompatibleOrder` under Hilbert cell order and with
    /// `BadValue` for irregular tiling.
    pub fn cell_num_in_tile_slab<T: CoordDatatype>(&self) -> TileGridResult<T> {
        self.check_coord_type::<T>()?;
        let d = match self.cell_order() {
            Order::RowMajor => self.dim_num() - 1,
            Order::ColumnMajor => 0,
            Order::Hilbert => {
                tilegrid_bail!(IncompatibleOrder: "hilbert order has no slab dimension")
            }
        };
        Ok(self.typed_tile_extents::<T>()?[d])
    }

    /// The linear position of a coordinate tuple within its tile.
    ///
    /// Coordinates are tile-relative: each must lie in `[0, extent_i)`;
    /// out-of-range coordinates yield an unspecified position.
    pub fn cell_pos<T: CoordDatatype>(&self, coords: &[T]) -> TileGridResult<i64> {
        self.check_coord_type::<T>()?;
        let extents = self.typed_tile_extents::<T>()?;
        let dim_num = self.dim_num();
        if coords.len() != dim_num {
            tilegrid_bail!(
                "coordinates hold {} values, expected {}",
                coords.len(),
                dim_num
            );
        }

        let mut offsets = vec![1i64; dim_num];
        match self.cell_order() {
            Order::RowMajor => {
                for i in (0..dim_num - 1).rev() {
                    offsets[i] = offsets[i + 1] * to_count(extents[i + 1]);
                }
            }
            Order::ColumnMajor => {
                for i in 1..dim_num {
                    offsets[i] = offsets[i - 1] * to_count(extents[i - 1]);
                }
            }
            Order::Hilbert => {
                tilegrid_bail!(IncompatibleOrder: "hilbert order has no linear cell position")
            }
        }

        Ok(coords
            .iter()
            .zip(&offsets)
            .map(|(&c, &offset)| to_count(c) * offset)
            .sum())
    }

    /// Advance `tile_coords` to the next tile of the zero-based tile
    /// rectangle `domain`, in tile order.
    ///
    /// The walk ends when the slowest-varying slot has been carried past
    /// its upper bound; callers detect the end by comparing against the
    /// tile domain.
    pub fn next_tile_coords<T: CoordDatatype>(
        &self,
        domain: &[T],
        tile_coords: &mut [T],
    ) -> TileGridResult<()> {
        self.check_coord_type::<T>()?;
        let dim_num = self.dim_num();
        if domain.len() != 2 * dim_num || tile_coords.len() != dim_num {
            tilegrid_bail!(
                "tile walk shapes hold {} and {} values, expected {} and {}",
                domain.len(),
                tile_coords.len(),
                2 * dim_num,
                dim_num
            );
        }
        match self.tile_order() {
            Order::RowMajor => {
                let mut i = dim_num - 1;
                tile_coords[i] = tile_coords[i] + T::one();
                while i > 0 && tile_coords[i] > domain[2 * i + 1] {
                    tile_coords[i] = domain[2 * i];
                    i -= 1;
                    tile_coords[i] = tile_coords[i] + T::one();
                }
            }
            Order::ColumnMajor => {
                let mut i = 0;
                tile_coords[i] = tile_coords[i] + T::one();
                while i < dim_num - 1 && tile_coords[i] > domain[2 * i + 1] {
                    tile_coords[i] = domain[2 * i];
                    i += 1;
                    tile_coords[i] = tile_coords[i] + T::one();
                }
            }
            Order::Hilbert => {
                tilegrid_bail!(IncompatibleOrder: "hilbert order has no tile walk")
            }
        }
        Ok(())
    }

    /// The linear position of a tile within the tile domain, in tile
    /// order.
    pub fn tile_pos<T: CoordDatatype>(&self, tile_coords: &[T]) -> TileGridResult<i64> {
        self.check_coord_type::<T>()?;
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>();
        let dim_num = self.dim_num();
        if tile_coords.len() != dim_num {
            tilegrid_bail!(
                "tile coordinates hold {} values, expected {}",
                tile_coords.len(),
                dim_num
            );
        }

        let tiles_along = |i: usize| {
            to_count(domain[2 * i + 1] - domain[2 * i] + T::one()) / to_count(extents[i])
        };
        let mut offsets = vec![1i64; dim_num];
        match self.tile_order() {
            Order::RowMajor => {
                for i in (0..dim_num - 1).rev() {
                    offsets[i] = offsets[i + 1] * tiles_along(i + 1);
                }
            }
            Order::ColumnMajor => {
                for i in 1..dim_num {
                    offsets[i] = offsets[i - 1] * tiles_along(i - 1);
                }
            }
            Order::Hilbert => {
                tilegrid_bail!(IncompatibleOrder: "hilbert order has no linear tile position")
            }
        }

        Ok(tile_coords
            .iter()
            .zip(&offsets)
            .map(|(&c, &offset)| to_count(c) * offset)
            .sum())
    }

    /// The Hilbert id of an absolute coordinate tuple.
    ///
    /// Coordinates are shifted by the domain lower bound and truncated to
    /// integers before indexing; for floating coordinate types the
    /// truncation is lossy. `scratch` is caller-provided working storage
    /// of `dim_num` slots, so concurrent readers each bring their own.
    pub fn hilbert_id<T: CoordDatatype>(
        &self,
        coords: &[T],
        scratch: &mut [u64],
    ) -> TileGridResult<u64> {
        self.check_coord_type::<T>()?;
        let curve = self
            .hilbert_curve()
            .ok_or_else(|| tilegrid_err!(IncompatibleOrder: "cell order is not hilbert"))?;
        let dim_num = self.dim_num();
        if coords.len() != dim_num || scratch.len() != dim_num {
            tilegrid_bail!(
                "coordinates and scratch hold {} and {} values, expected {}",
                coords.len(),
                scratch.len(),
                dim_num
            );
        }
        let domain = self.typed_domain::<T>();
        for i in 0..dim_num {
            scratch[i] = (coords[i] - domain[2 * i]).to_u64().ok_or_else(|| {
                tilegrid_err!("coordinate {} is below the domain lower bound", coords[i])
            })?;
        }
        Ok(curve.coords_to_index(scratch))
    }

    /// Intersect `range` with an MBR, writing the intersection into
    /// `overlap_range` and classifying it.
    pub fn mbr_range_overlap<T: CoordDatatype>(
        &self,
        range: &[T],
        mbr: &[T],
        overlap_range: &mut [T],
    ) -> TileGridResult<Overlap> {
        self.check_coord_type::<T>()?;
        let dim_num = self.dim_num();
        if range.len() != 2 * dim_num || mbr.len() != 2 * dim_num || overlap_range.len() != 2 * dim_num
        {
            tilegrid_bail!(
                "overlap shapes hold {}, {}, and {} values, expected {}",
                range.len(),
                mbr.len(),
                overlap_range.len(),
                2 * dim_num
            );
        }

        for i in 0..dim_num {
            overlap_range[2 * i] = max(mbr[2 * i], range[2 * i]);
            overlap_range[2 * i + 1] = min(mbr[2 * i + 1], range[2 * i + 1]);
        }

        for i in 0..dim_num {
            if overlap_range[2 * i] > overlap_range[2 * i + 1] {
                return Ok(Overlap::None);
            }
        }

        let covers =
            |i: usize| overlap_range[2 * i] == mbr[2 * i] && overlap_range[2 * i + 1] == mbr[2 * i + 1];
        if (0..dim_num).all(covers) {
            return Ok(Overlap::Contig);
        }

        let contig = match self.cell_order() {
            Order::RowMajor => (1..dim_num).all(covers),
            Order::ColumnMajor => (0..dim_num.saturating_sub(1)).all(covers),
            Order::Hilbert => false,
        };
        Ok(if contig { Overlap::Contig } else { Overlap::Partial })
    }

    /// Intersect `range` with the tile at `tile_coords`, writing the
    /// intersection rebased to the tile's origin into `overlap_range` and
    /// classifying it.
    pub fn tile_range_overlap<T: CoordDatatype>(
        &self,
        range: &[T],
        tile_coords: &[T],
        overlap_range: &mut [T],
    ) -> TileGridResult<Overlap> {
        self.check_coord_type::<T>()?;
        let extents = self.typed_tile_extents::<T>()?;
        let domain = self.typed_domain::<T>();
        let dim_num = self.dim_num();
        if range.len() != 2 * dim_num
            || tile_coords.len() != dim_num
            || overlap_range.len() != 2 * dim_num
        {
            tilegrid_bail!(
                "overlap shapes hold {}, {}, and {} values, expected {} and {}",
                range.len(),
                tile_coords.len(),
                overlap_range.len(),
                2 * dim_num,
                dim_num
            );
        }

        for i in 0..dim_num {
            let tile_lo = domain[2 * i] + tile_coords[i] * extents[i];
            let tile_hi = tile_lo + extents[i] - T::one();
            overlap_range[2 * i] = max(tile_lo, range[2 * i]) - tile_lo;
            overlap_range[2 * i + 1] = min(tile_hi, range[2 * i + 1]) - tile_lo;
        }

        for i in 0..dim_num {
            if overlap_range[2 * i] >= extents[i] || overlap_range[2 * i + 1] < T::zero() {
                return Ok(Overlap::None);
            }
        }

        let covers = |i: usize| {
            overlap_range[2 * i] == T::zero()
                && overlap_range[2 * i + 1] == extents[i] - T::one()
        };
        if (0..dim_num).all(covers) {
            return Ok(Overlap::Contig);
        }

        let contig = match self.cell_order() {
            Order::RowMajor => (1..dim_num).all(covers),
            Order::ColumnMajor => (0..dim_num.saturating_sub(1)).all(covers),
            Order::Hilbert => {
                tilegrid_bail!(IncompatibleOrder: "hilbert order has no tile rectangles")
            }
        };
        Ok(if contig { Overlap::Contig } else { Overlap::Partial })
    }

    fn check_coord_type<T: CoordDatatype>(&self) -> TileGridResult<()> {
        if T::DTYPE != self.coords_datatype() {
            tilegrid_bail!(
                "geometry over '{}' coordinates on a schema with '{}' coordinates",
                T::DTYPE,
                self.coords_datatype()
            );
        }
        Ok(())
    }

    fn typed_domain<T: CoordDatatype>(&self) -> &[T] {
        self.domain()
            .typed::<T>()
            .tilegrid_expect("domain matches the checked coordinate type")
    }

    fn typed_tile_extents<T: CoordDatatype>(&self) -> TileGridResult<&[T]> {
        let extents: &CoordBuffer = self
            .tile_extents()
            .ok_or_else(|| tilegrid_err!("the array is irregularly tiled"))?;
        Ok(extents
            .typed::<T>()
            .tilegrid_expect("tile extents match the checked coordinate type"))
    }
}

fn to_count<T: ToPrimitive + Copy + std::fmt::Display>(value: T) -> i64 {
    value
        .to_i64()
        .tilegrid_expect("coordinate quantity fits an i64")
}

fn min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

fn max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}
