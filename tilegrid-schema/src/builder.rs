//! Staged construction of array schemas.

use tilegrid_dtype::{CoordBuffer, Datatype};
use tilegrid_error::{tilegrid_bail, TileGridResult};

use crate::{
    ArraySchema, CellValNum, Compression, CoordsSpec, Order, SchemaParts, TypeSpec,
    DEFAULT_CAPACITY, DEFAULT_CONSOLIDATION_STEP,
};

/// Builds an [`ArraySchema`] from raw user inputs.
///
/// Setters may be called in any order; all cross-field validation happens
/// in [`build`](Self::build), which either returns a finalized schema or a
/// typed error. There is no partially constructed schema state.
///
/// Types are accepted either as structured [`TypeSpec`]/[`CoordsSpec`]
/// values or as the legacy textual form (one spec per attribute plus a
/// final coordinates spec); the structured form wins when both are given.
///
/// ```
/// use tilegrid_dtype::CoordBuffer;
/// use tilegrid_schema::ArraySchemaBuilder;
///
/// let schema = ArraySchemaBuilder::new("weather")
///     .with_attributes(["temperature"])
///     .with_dimensions(["x", "y"])
///     .with_types(["float64", "int64"])
///     .with_domain(CoordBuffer::from(vec![0i64, 99, 0, 99]))
///     .build()
///     .unwrap();
/// assert_eq!(schema.dim_num(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ArraySchemaBuilder {
    array_name: Option<String>,
    attributes: Option<Vec<String>>,
    dimensions: Option<Vec<String>>,
    type_strings: Option<Vec<String>>,
    attribute_types: Option<Vec<TypeSpec>>,
    coords_type: Option<CoordsSpec>,
    domain: Option<CoordBuffer>,
    tile_extents: Option<CoordBuffer>,
    dense: bool,
    capacity: Option<i64>,
    consolidation_step: Option<i32>,
    cell_order: Option<Order>,
    tile_order: Option<Order>,
    compression: Option<Vec<Compression>>,
}

impl ArraySchemaBuilder {
    /// Start building a schema for the named array.
    pub fn new(array_name: impl Into<String>) -> Self {
        Self {
            array_name: Some(array_name.into()),
            ..Default::default()
        }
    }

    /// Set the attribute names.
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }

    /// Set the dimension names.
    pub fn with_dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions = Some(dimensions.into_iter().map(Into::into).collect());
        self
    }

    /// Set the types from legacy textual specs: one
    /// `"<scalar>[:<arity>|:var]"` per attribute, then the coordinates
    /// spec. Parsed during [`build`](Self::build).
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_strings = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the attribute types structurally, one [`TypeSpec`] per
    /// attribute.
    pub fn with_attribute_types(mut self, types: Vec<TypeSpec>) -> Self {
        self.attribute_types = Some(types);
        self
    }

    /// Set the coordinates type structurally.
    pub fn with_coords_type(mut self, coords: CoordsSpec) -> Self {
        self.coords_type = Some(coords);
        self
    }

    /// Set the inclusive `[lo, hi]` domain bounds, interleaved per
    /// dimension. The buffer's element type must match the coordinates
    /// type.
    pub fn with_domain(mut self, domain: CoordBuffer) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Set the per-dimension tile extents. Omitting them leaves the array
    /// irregularly tiled (sparse only).
    pub fn with_tile_extents(mut self, tile_extents: CoordBuffer) -> Self {
        self.tile_extents = Some(tile_extents);
        self
    }

    /// Mark the array dense or sparse. Defaults to sparse.
    pub fn with_dense(mut self, dense: bool) -> Self {
        self.dense = dense;
        self
    }

    /// Set the target cell count per irregular tile. Defaults to
    /// [`DEFAULT_CAPACITY`].
    pub fn with_capacity(mut self, capacity: i64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the consolidation step. Defaults to
    /// [`DEFAULT_CONSOLIDATION_STEP`].
    pub fn with_consolidation_step(mut self, consolidation_step: i32) -> Self {
        self.consolidation_step = Some(consolidation_step);
        self
    }

    /// Set the in-tile cell order. Defaults to row-major.
    pub fn with_cell_order(mut self, cell_order: Order) -> Self {
        self.cell_order = Some(cell_order);
        self
    }

    /// Set the across-tiles order. Defaults to row-major.
    pub fn with_tile_order(mut self, tile_order: Order) -> Self {
        self.tile_order = Some(tile_order);
        self
    }

    /// Set the compression modes: one per attribute, then one for the
    /// coordinates. Defaults to no compression everywhere.
    pub fn with_compression(mut self, compression: Vec<Compression>) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Validate every input and emit the finalized schema.
    pub fn build(self) -> TileGridResult<ArraySchema> {
        let Some(ref array_name) = self.array_name else {
            tilegrid_bail!(MissingField: "array name");
        };
        let array_name = array_name.clone();
        let Some(ref attributes) = self.attributes else {
            tilegrid_bail!(MissingField: "attributes");
        };
        let attributes = attributes.clone();
        let Some(ref dimensions) = self.dimensions else {
            tilegrid_bail!(MissingField: "dimensions");
        };
        let mut dimensions = dimensions.clone();
        let (attribute_types, coords_type) = self.parse_types(attributes.len())?;
        let Some(domain) = self.domain else {
            tilegrid_bail!(MissingField: "domain");
        };

        // Key-value coordinates expand into four int32 hash dimensions
        // derived from the first dimension name.
        let key_value = coords_type == CoordsSpec::KeyValue;
        let coords_datatype = match coords_type {
            CoordsSpec::Typed(dt) => dt,
            CoordsSpec::KeyValue => {
                let Some(base) = dimensions.first().cloned() else {
                    tilegrid_bail!("the number of dimensions must be positive");
                };
                dimensions = (1..=4).map(|i| format!("{base}_{i}")).collect();
                Datatype::Int32
            }
        };

        let mut types: Vec<Datatype> = attribute_types.iter().map(|t| t.datatype).collect();
        types.push(coords_datatype);
        let val_num: Vec<CellValNum> = attribute_types.iter().map(|t| t.cell_val_num).collect();
        let compression = match self.compression {
            Some(compression) => compression,
            None => vec![Compression::None; attributes.len() + 1],
        };

        let parts = SchemaParts {
            array_name,
            attributes,
            dimensions,
            dense: self.dense,
            key_value,
            types,
            val_num,
            compression,
            capacity: self.capacity.unwrap_or(DEFAULT_CAPACITY),
            consolidation_step: self
                .consolidation_step
                .unwrap_or(DEFAULT_CONSOLIDATION_STEP),
            cell_order: self.cell_order.unwrap_or_default(),
            tile_order: self.tile_order.unwrap_or_default(),
            domain,
            tile_extents: self.tile_extents,
        };
        let schema = parts.finish()?;
        log::debug!(
            "finalized schema for array '{}': {} attributes, {} dimensions, {}",
            schema.array_name(),
            schema.attribute_num(),
            schema.dim_num(),
            if schema.dense() { "dense" } else { "sparse" },
        );
        Ok(schema)
    }

    fn parse_types(&self, attribute_num: usize) -> TileGridResult<(Vec<TypeSpec>, CoordsSpec)> {
        if let (Some(attribute_types), Some(coords_type)) =
            (&self.attribute_types, self.coords_type)
        {
            return Ok((attribute_types.clone(), coords_type));
        }
        let Some(specs) = &self.type_strings else {
            tilegrid_bail!(MissingField: "types");
        };
        if specs.len() != attribute_num + 1 {
            tilegrid_bail!(
                "expected {} type specs ({} attributes plus coordinates), got {}",
                attribute_num + 1,
                attribute_num,
                specs.len()
            );
        }
        let attribute_types = specs[..attribute_num]
            .iter()
            .map(|s| s.parse::<TypeSpec>())
            .collect::<TileGridResult<Vec<_>>>()?;
        let coords_type = specs[attribute_num].parse::<CoordsSpec>()?;
        Ok((attribute_types, coords_type))
    }
}
