//! The finalized array schema value and its derived tables.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use num_traits::{NumCast, ToPrimitive};
use tilegrid_dtype::{match_each_coord_datatype, CoordBuffer, CoordDatatype, Datatype};
use tilegrid_error::{
    tilegrid_bail, tilegrid_err, TileGridExpect, TileGridResult,
};

use crate::{
    CellValNum, Compression, HilbertCurve, Order, COORDS_NAME, VAR_OFFSET_SIZE,
};

/// The immutable descriptor of an array's logical structure.
///
/// An `ArraySchema` is produced by [`crate::ArraySchemaBuilder::build`] or
/// by [`ArraySchema::deserialize`]; both paths run the same validation, so
/// every schema in existence satisfies the schema invariants and its
/// accessors never fail. The schema exclusively owns its buffers; sharing
/// one with a collaborator grants read-only access.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    // Primary fields.
    pub(crate) array_name: String,
    /// All attribute names, with the synthetic coordinates name last.
    pub(crate) attributes: Vec<String>,
    pub(crate) attribute_num: usize,
    pub(crate) dimensions: Vec<String>,
    pub(crate) dense: bool,
    pub(crate) key_value: bool,
    /// Element types, one per attribute plus the coordinates entry.
    pub(crate) types: Vec<Datatype>,
    /// Values per cell, one per attribute.
    pub(crate) val_num: Vec<CellValNum>,
    /// Compression modes, one per attribute plus the coordinates entry.
    pub(crate) compression: Vec<Compression>,
    pub(crate) capacity: i64,
    pub(crate) consolidation_step: i32,
    pub(crate) cell_order: Order,
    pub(crate) tile_order: Order,
    pub(crate) domain: CoordBuffer,
    pub(crate) tile_extents: Option<CoordBuffer>,
    // Derived tables, recomputed on every construction path.
    pub(crate) cell_sizes: Vec<Option<usize>>,
    pub(crate) tile_sizes: Vec<u64>,
    pub(crate) var_attribute_num: usize,
    pub(crate) cell_num_per_tile: i64,
    pub(crate) tile_domain: Option<CoordBuffer>,
    pub(crate) hilbert: Option<HilbertCurve>,
}

impl ArraySchema {
    /// The array name.
    pub fn array_name(&self) -> &str {
        &self.array_name
    }

    /// The number of attributes, excluding the synthetic coordinates entry.
    pub fn attribute_num(&self) -> usize {
        self.attribute_num
    }

    /// The number of dimensions.
    pub fn dim_num(&self) -> usize {
        self.dimensions.len()
    }

    /// Whether the array is dense.
    pub fn dense(&self) -> bool {
        self.dense
    }

    /// Whether the array is in key-value mode (four synthetic hash
    /// dimensions derived from a `char:var` coordinates spec).
    pub fn key_value(&self) -> bool {
        self.key_value
    }

    /// The target cell count per tile when tiling is irregular.
    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// The consolidation step, opaque to the schema core.
    pub fn consolidation_step(&self) -> i32 {
        self.consolidation_step
    }

    /// All attribute names; the last entry is the synthetic coordinates
    /// name.
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// The dimension names.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// The name of attribute `i`. Index `attribute_num` is the synthetic
    /// coordinates entry.
    pub fn attribute(&self, i: usize) -> &str {
        &self.attributes[i]
    }

    /// Resolve an attribute name to its index.
    ///
    /// [`COORDS_NAME`] resolves to `attribute_num`; an unknown name yields
    /// `None`.
    pub fn attribute_id(&self, name: &str) -> Option<usize> {
        if name == COORDS_NAME {
            return Some(self.attribute_num);
        }
        self.attributes[..self.attribute_num]
            .iter()
            .position(|a| a == name)
    }

    /// Resolve a batch of attribute names, failing on the first unknown
    /// one.
    pub fn attribute_ids<S: AsRef<str>>(&self, names: &[S]) -> TileGridResult<Vec<usize>> {
        names
            .iter()
            .map(|name| {
                self.attribute_id(name.as_ref()).ok_or_else(
                    || tilegrid_err!(NotFound: "attribute '{}' does not exist", name.as_ref()),
                )
            })
            .collect()
    }

    /// The element type of attribute `i` (index `attribute_num` for the
    /// coordinates).
    pub fn datatype(&self, i: usize) -> Datatype {
        self.types[i]
    }

    /// The shared element type of the coordinates.
    pub fn coords_datatype(&self) -> Datatype {
        self.types[self.attribute_num]
    }

    /// Values per cell for attribute `i`.
    pub fn cell_val_num(&self, i: usize) -> CellValNum {
        self.val_num[i]
    }

    /// The element width of attribute `i` in bytes.
    pub fn type_size(&self, i: usize) -> usize {
        self.types[i].byte_width()
    }

    /// The fixed cell size of attribute `i` in bytes, or `None` when cells
    /// are variable-length.
    pub fn cell_size(&self, i: usize) -> Option<usize> {
        self.cell_sizes[i]
    }

    /// The size of one coordinates tuple in bytes.
    pub fn coords_size(&self) -> usize {
        self.cell_sizes[self.attribute_num]
            .tilegrid_expect("coordinates always have a fixed cell size")
    }

    /// Whether attribute `i` is variable-length.
    pub fn var_size(&self, i: usize) -> bool {
        self.cell_sizes[i].is_none()
    }

    /// The number of variable-length attributes.
    pub fn var_attribute_num(&self) -> usize {
        self.var_attribute_num
    }

    /// The compression mode of attribute `i` (index `attribute_num` for
    /// the coordinates).
    pub fn compression(&self, i: usize) -> Compression {
        self.compression[i]
    }

    /// The in-tile cell traversal order.
    pub fn cell_order(&self) -> Order {
        self.cell_order
    }

    /// The across-tiles traversal order.
    pub fn tile_order(&self) -> Order {
        self.tile_order
    }

    /// The inclusive `[lo, hi]` bounds of every dimension, interleaved.
    pub fn domain(&self) -> &CoordBuffer {
        &self.domain
    }

    /// The per-dimension tile extents, or `None` for irregular tiling.
    pub fn tile_extents(&self) -> Option<&CoordBuffer> {
        self.tile_extents.as_ref()
    }

    /// The zero-based per-dimension tile index bounds, interleaved, or
    /// `None` for irregular tiling.
    pub fn tile_domain(&self) -> Option<&CoordBuffer> {
        self.tile_domain.as_ref()
    }

    /// The total number of tiles, defined for regular tiling over integer
    /// coordinates.
    pub fn tile_num(&self) -> Option<i64> {
        let extents = self.tile_extents.as_ref()?;
        if !self.coords_datatype().is_integral() {
            return None;
        }
        match_each_coord_datatype!(self.coords_datatype(), |$T| {
            let domain = self
                .domain
                .typed::<$T>()
                .tilegrid_expect("domain matches the coordinate type");
            let extents = extents
                .typed::<$T>()
                .tilegrid_expect("tile extents match the coordinate type");
            let mut num = 1i64;
            for i in 0..self.dim_num() {
                let span = (domain[2 * i + 1] - domain[2 * i] + <$T as num_traits::One>::one())
                    .to_i64()
                    .tilegrid_expect("span fits an i64");
                let extent = extents[i].to_i64().tilegrid_expect("extent fits an i64");
                num *= span / extent;
            }
            Some(num)
        })
    }

    /// The number of cells a full tile holds.
    pub fn cell_num_per_tile(&self) -> i64 {
        self.cell_num_per_tile
    }

    /// The tile size of attribute `i` in bytes. Variable-length attributes
    /// count one offset slot per cell.
    pub fn tile_size(&self, i: usize) -> u64 {
        self.tile_sizes[i]
    }

    /// Bits of Hilbert precision per dimension, when the cell order is
    /// Hilbert.
    pub fn hilbert_bits(&self) -> Option<u32> {
        self.hilbert.as_ref().map(HilbertCurve::bits)
    }

    pub(crate) fn hilbert_curve(&self) -> Option<&HilbertCurve> {
        self.hilbert.as_ref()
    }
}

impl Display for ArraySchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Array name: {}", self.array_name)?;
        writeln!(f, "Dimensions: {}", self.dimensions.iter().join(", "))?;
        writeln!(
            f,
            "Attributes: {}",
            self.attributes[..self.attribute_num].iter().join(", ")
        )?;
        writeln!(f, "Domain: {}", self.domain)?;
        for (i, name) in self.attributes[..self.attribute_num].iter().enumerate() {
            writeln!(f, "Type of {}: {}:{}", name, self.types[i], self.val_num[i])?;
        }
        if self.key_value {
            writeln!(f, "Coordinates: char:var")?;
        } else {
            writeln!(f, "Coordinates: {}", self.coords_datatype())?;
        }
        writeln!(f, "Dense: {}", self.dense)?;
        writeln!(f, "Key-value: {}", self.key_value)?;
        match &self.tile_extents {
            Some(extents) => {
                writeln!(f, "Tile types: regular")?;
                writeln!(f, "Tile extents: {extents}")?;
                writeln!(f, "Tile order: {}", self.tile_order)?;
            }
            None => {
                writeln!(f, "Tile types: irregular")?;
                writeln!(f, "Capacity: {}", self.capacity)?;
            }
        }
        writeln!(f, "Cell order: {}", self.cell_order)?;
        writeln!(f, "Consolidation step: {}", self.consolidation_step)?;
        for (i, name) in self.attributes.iter().enumerate() {
            writeln!(f, "Compression of {}: {}", name, self.compression[i])?;
        }
        Ok(())
    }
}

/// The validated primary fields of a schema, before derived tables.
///
/// Both construction paths (builder and codec) assemble a `SchemaParts`
/// and call [`SchemaParts::finish`], which enforces every schema invariant
/// and computes the derived tables, so no partially valid schema can be
/// observed.
#[derive(Debug)]
pub(crate) struct SchemaParts {
    pub array_name: String,
    /// Attribute names, without the synthetic coordinates entry.
    pub attributes: Vec<String>,
    pub dimensions: Vec<String>,
    pub dense: bool,
    pub key_value: bool,
    pub types: Vec<Datatype>,
    pub val_num: Vec<CellValNum>,
    pub compression: Vec<Compression>,
    pub capacity: i64,
    pub consolidation_step: i32,
    pub cell_order: Order,
    pub tile_order: Order,
    pub domain: CoordBuffer,
    pub tile_extents: Option<CoordBuffer>,
}

impl SchemaParts {
    pub fn finish(self) -> TileGridResult<ArraySchema> {
        let Self {
            array_name,
            mut attributes,
            dimensions,
            dense,
            key_value,
            types,
            val_num,
            compression,
            capacity,
            consolidation_step,
            cell_order,
            tile_order,
            domain,
            tile_extents,
        } = self;

        // Attribute and dimension names.
        if attributes.is_empty() {
            tilegrid_bail!("the number of attributes must be positive");
        }
        let attribute_num = attributes.len();
        attributes.push(COORDS_NAME.to_string());
        if let Some(name) = attributes.iter().duplicates().next() {
            tilegrid_bail!(DuplicateName: "attribute name '{}' is reused", name);
        }
        if dimensions.is_empty() {
            tilegrid_bail!("the number of dimensions must be positive");
        }
        if let Some(name) = dimensions.iter().duplicates().next() {
            tilegrid_bail!(DuplicateName: "dimension name '{}' is reused", name);
        }
        if let Some(name) = dimensions.iter().find(|d| attributes.contains(d)) {
            tilegrid_bail!(DuplicateName:
                "'{}' names both an attribute and a dimension", name);
        }
        let dim_num = dimensions.len();

        // Per-attribute tables.
        if types.len() != attribute_num + 1 {
            tilegrid_bail!(
                "expected {} element types, got {}",
                attribute_num + 1,
                types.len()
            );
        }
        if val_num.len() != attribute_num {
            tilegrid_bail!(
                "expected {} cell arities, got {}",
                attribute_num,
                val_num.len()
            );
        }
        if compression.len() != attribute_num + 1 {
            tilegrid_bail!(
                "expected {} compression modes, got {}",
                attribute_num + 1,
                compression.len()
            );
        }
        if val_num.contains(&CellValNum::Fixed(0)) {
            tilegrid_bail!("the number of values per cell must be positive");
        }

        // Coordinate type.
        let coords_type = types[attribute_num];
        if !coords_type.is_coord_type() {
            tilegrid_bail!("'{}' is not a valid coordinates type", coords_type);
        }
        if dense && coords_type.is_floating() {
            tilegrid_bail!(DenseCoordType:
                "dense arrays may only have coordinates of type 'int32' or 'int64', got '{}'",
                coords_type);
        }

        // Domain.
        if domain.datatype() != coords_type {
            tilegrid_bail!(
                "domain of type '{}' does not match the coordinates type '{}'",
                domain.datatype(),
                coords_type
            );
        }
        if domain.len() != 2 * dim_num {
            tilegrid_bail!(
                "domain holds {} values, expected {} for {} dimensions",
                domain.len(),
                2 * dim_num,
                dim_num
            );
        }
        match_each_coord_datatype!(coords_type, |$T| {
            check_domain(
                domain
                    .typed::<$T>()
                    .tilegrid_expect("domain type was just checked"),
            )?
        });

        // Tile extents.
        if dense && tile_extents.is_none() {
            tilegrid_bail!(DenseRequiresExtents:
                "array '{}' is dense but has no tile extents", array_name);
        }
        if let Some(extents) = &tile_extents {
            if extents.datatype() != coords_type {
                tilegrid_bail!(
                    "tile extents of type '{}' do not match the coordinates type '{}'",
                    extents.datatype(),
                    coords_type
                );
            }
            if extents.len() != dim_num {
                tilegrid_bail!(
                    "tile extents hold {} values, expected {} for {} dimensions",
                    extents.len(),
                    dim_num,
                    dim_num
                );
            }
            match_each_coord_datatype!(coords_type, |$T| {
                check_tile_extents(
                    domain
                        .typed::<$T>()
                        .tilegrid_expect("domain type was just checked"),
                    extents
                        .typed::<$T>()
                        .tilegrid_expect("extents type was just checked"),
                    coords_type.is_integral(),
                )?
            });
        }

        // Orders.
        if tile_extents.is_some() {
            if cell_order == Order::Hilbert {
                tilegrid_bail!(IncompatibleOrder:
                    "arrays with tile extents do not support hilbert cell order");
            }
            if tile_order == Order::Hilbert {
                tilegrid_bail!(IncompatibleOrder:
                    "arrays with tile extents do not support hilbert tile order");
            }
        }

        // Scalars.
        if capacity <= 0 {
            tilegrid_bail!("capacity must be positive, got {}", capacity);
        }
        if consolidation_step <= 0 {
            tilegrid_bail!(
                "consolidation step must be positive, got {}",
                consolidation_step
            );
        }

        // Derived tables.
        let var_attribute_num = val_num.iter().filter(|v| v.is_var()).count();
        let cell_sizes: Vec<Option<usize>> = (0..=attribute_num)
            .map(|i| {
                if i < attribute_num {
                    match val_num[i] {
                        CellValNum::Var => None,
                        CellValNum::Fixed(n) => Some(n as usize * types[i].byte_width()),
                    }
                } else {
                    Some(dim_num * coords_type.byte_width())
                }
            })
            .collect();

        let cell_num_per_tile = match &tile_extents {
            Some(extents) => match_each_coord_datatype!(coords_type, |$T| {
                cell_num_per_tile(
                    extents
                        .typed::<$T>()
                        .tilegrid_expect("extents type was just checked"),
                    coords_type.is_integral(),
                )?
            }),
            None => capacity,
        };

        let tile_sizes: Vec<u64> = cell_sizes
            .iter()
            .map(|size| {
                let per_cell = size.unwrap_or(VAR_OFFSET_SIZE) as u64;
                cell_num_per_tile as u64 * per_cell
            })
            .collect();

        let tile_domain = match &tile_extents {
            Some(extents) => Some(match_each_coord_datatype!(coords_type, |$T| {
                CoordBuffer::from(compute_tile_domain(
                    domain
                        .typed::<$T>()
                        .tilegrid_expect("domain type was just checked"),
                    extents
                        .typed::<$T>()
                        .tilegrid_expect("extents type was just checked"),
                )?)
            })),
            None => None,
        };

        let hilbert = if cell_order == Order::Hilbert {
            let bits = match_each_coord_datatype!(coords_type, |$T| {
                hilbert_bits(
                    domain
                        .typed::<$T>()
                        .tilegrid_expect("domain type was just checked"),
                )
            });
            Some(HilbertCurve::new(bits, dim_num)?)
        } else {
            None
        };

        Ok(ArraySchema {
            array_name,
            attributes,
            attribute_num,
            dimensions,
            dense,
            key_value,
            types,
            val_num,
            compression,
            capacity,
            consolidation_step,
            cell_order,
            tile_order,
            domain,
            tile_extents,
            cell_sizes,
            tile_sizes,
            var_attribute_num,
            cell_num_per_tile,
            tile_domain,
            hilbert,
        })
    }
}

fn check_domain<T: CoordDatatype>(domain: &[T]) -> TileGridResult<()> {
    for pair in domain.chunks_exact(2) {
        if !(pair[0] <= pair[1]) {
            tilegrid_bail!(
                "lower domain bound {} is larger than its upper bound {}",
                pair[0],
                pair[1]
            );
        }
    }
    Ok(())
}

fn check_tile_extents<T: CoordDatatype>(
    domain: &[T],
    extents: &[T],
    integral: bool,
) -> TileGridResult<()> {
    for (i, &extent) in extents.iter().enumerate() {
        if !(extent > T::zero()) {
            tilegrid_bail!("tile extent {} must be strictly positive", extent);
        }
        if integral {
            let span = (domain[2 * i + 1] - domain[2 * i] + T::one())
                .to_i64()
                .tilegrid_expect("integer span fits an i64");
            let extent = extent.to_i64().tilegrid_expect("integer extent fits an i64");
            if span % extent != 0 {
                tilegrid_bail!(
                    "domain span {} does not divide evenly by tile extent {}",
                    span,
                    extent
                );
            }
        }
    }
    Ok(())
}

fn cell_num_per_tile<T: CoordDatatype>(extents: &[T], integral: bool) -> TileGridResult<i64> {
    if integral {
        let mut num = 1i64;
        for &extent in extents {
            let extent = extent.to_i64().tilegrid_expect("integer extent fits an i64");
            num = num
                .checked_mul(extent)
                .ok_or_else(|| tilegrid_err!("cell count per tile overflows an i64"))?;
        }
        Ok(num)
    } else {
        let num: f64 = extents
            .iter()
            .map(|e| e.to_f64().tilegrid_expect("extent converts to f64"))
            .product();
        if num > i64::MAX as f64 {
            tilegrid_bail!("cell count per tile overflows an i64");
        }
        Ok(num as i64)
    }
}

fn compute_tile_domain<T: CoordDatatype>(domain: &[T], extents: &[T]) -> TileGridResult<Vec<T>> {
    let mut tile_domain = Vec::with_capacity(domain.len());
    for (i, &extent) in extents.iter().enumerate() {
        let span = (domain[2 * i + 1] - domain[2 * i] + T::one())
            .to_f64()
            .tilegrid_expect("span converts to f64");
        let extent = extent.to_f64().tilegrid_expect("extent converts to f64");
        let tiles = (span / extent).ceil();
        tile_domain.push(T::zero());
        tile_domain.push(
            <T as NumCast>::from(tiles - 1.0)
                .ok_or_else(|| tilegrid_err!("tile count {} overflows the coordinate type", tiles))?,
        );
    }
    Ok(tile_domain)
}

fn hilbert_bits<T: CoordDatatype>(domain: &[T]) -> u32 {
    let mut max_span = 0f64;
    for pair in domain.chunks_exact(2) {
        let span = (pair[1] - pair[0] + T::one())
            .to_f64()
            .tilegrid_expect("span converts to f64");
        if span > max_span {
            max_span = span;
        }
    }
    let bits = ((max_span + 0.5).trunc()).log2().ceil() as u32;
    bits.max(1)
}
