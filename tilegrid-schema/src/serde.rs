//! Binary serialization of array schemas.
//!
//! The byte image is a compatibility contract for stored arrays: fields
//! are written little-endian in a fixed order, and the type, order, and
//! compression tag values are stable. Derived tables are never serialized;
//! deserialization recomputes them through the same finalization path the
//! builder uses.

use bytes::{Buf, BufMut};
use tilegrid_dtype::{CoordBuffer, Datatype};
use tilegrid_error::{tilegrid_bail, tilegrid_err, TileGridResult};

use crate::{ArraySchema, CellValNum, Compression, Order, SchemaParts};

/// Wire sentinel for a variable-length cell arity.
const VAR_NUM_WIRE: i32 = -1;

impl ArraySchema {
    /// The exact byte length of [`serialize`](Self::serialize)'s output.
    pub fn serialized_size(&self) -> usize {
        let mut size = 0usize;
        // name_size + name
        size += 4 + self.array_name.len();
        // dense + key_value flags
        size += 2;
        // tile_order + cell_order tags
        size += 2;
        // capacity + consolidation_step
        size += 8 + 4;
        // attribute_num + length-prefixed attribute names
        size += 4;
        for attr in &self.attributes[..self.attribute_num] {
            size += 4 + attr.len();
        }
        // dim_num + length-prefixed dimension names
        size += 4;
        for dim in &self.dimensions {
            size += 4 + dim.len();
        }
        // domain_size + domain
        size += 4 + 2 * self.coords_size();
        // tile_extents_size + tile extents
        size += 4 + self.tile_extents.as_ref().map_or(0, |_| self.coords_size());
        // type tags
        size += self.attribute_num + 1;
        // val_num
        size += 4 * self.attribute_num;
        // compression tags
        size += self.attribute_num + 1;
        size
    }

    /// Serialize the schema into its binary image.
    pub fn serialize(&self) -> Vec<u8> {
        let size = self.serialized_size();
        let mut buf = Vec::with_capacity(size);

        buf.put_i32_le(self.array_name.len() as i32);
        buf.put_slice(self.array_name.as_bytes());
        buf.put_u8(self.dense as u8);
        buf.put_u8(self.key_value as u8);
        buf.put_u8(self.tile_order.tag());
        buf.put_u8(self.cell_order.tag());
        buf.put_i64_le(self.capacity);
        buf.put_i32_le(self.consolidation_step);

        buf.put_i32_le(self.attribute_num as i32);
        for attr in &self.attributes[..self.attribute_num] {
            buf.put_i32_le(attr.len() as i32);
            buf.put_slice(attr.as_bytes());
        }
        buf.put_i32_le(self.dimensions.len() as i32);
        for dim in &self.dimensions {
            buf.put_i32_le(dim.len() as i32);
            buf.put_slice(dim.as_bytes());
        }

        let domain = self.domain.to_le_bytes();
        buf.put_i32_le(domain.len() as i32);
        buf.put_slice(&domain);
        match &self.tile_extents {
            Some(extents) => {
                let extents = extents.to_le_bytes();
                buf.put_i32_le(extents.len() as i32);
                buf.put_slice(&extents);
            }
            None => buf.put_i32_le(0),
        }

        for datatype in &self.types {
            buf.put_u8(datatype.tag());
        }
        for val_num in &self.val_num {
            buf.put_i32_le(match val_num {
                CellValNum::Fixed(n) => *n as i32,
                CellValNum::Var => VAR_NUM_WIRE,
            });
        }
        for compression in &self.compression {
            buf.put_u8(compression.tag());
        }

        debug_assert_eq!(buf.len(), size);
        buf
    }

    /// Reconstruct a schema from its binary image.
    ///
    /// Fails with `BadSchemaImage` on any short read, unknown tag,
    /// inconsistent size, or image that violates a schema invariant; no
    /// partially constructed schema is ever observable.
    pub fn deserialize(bytes: &[u8]) -> TileGridResult<ArraySchema> {
        let buf = &mut &*bytes;

        let array_name = get_string(buf)?;
        let dense = get_bool(buf)?;
        let key_value = get_bool(buf)?;
        let tile_order = Order::from_tag(get_u8(buf)?)
            .ok_or_else(|| tilegrid_err!(BadSchemaImage: "unknown tile order tag"))?;
        let cell_order = Order::from_tag(get_u8(buf)?)
            .ok_or_else(|| tilegrid_err!(BadSchemaImage: "unknown cell order tag"))?;
        let capacity = get_i64(buf)?;
        let consolidation_step = get_i32(buf)?;

        let attribute_num = get_count(buf, "attribute count")?;
        let attributes = (0..attribute_num)
            .map(|_| get_string(buf))
            .collect::<TileGridResult<Vec<_>>>()?;
        let dim_num = get_count(buf, "dimension count")?;
        let dimensions = (0..dim_num)
            .map(|_| get_string(buf))
            .collect::<TileGridResult<Vec<_>>>()?;

        let domain_bytes = get_sized_bytes(buf)?;
        let extents_bytes = get_sized_bytes(buf)?;

        let types = (0..=attribute_num)
            .map(|_| {
                Datatype::from_tag(get_u8(buf)?)
                    .ok_or_else(|| tilegrid_err!(BadSchemaImage: "unknown element type tag"))
            })
            .collect::<TileGridResult<Vec<_>>>()?;
        let val_num = (0..attribute_num)
            .map(|_| match get_i32(buf)? {
                VAR_NUM_WIRE => Ok(CellValNum::Var),
                n if n > 0 => Ok(CellValNum::Fixed(n as u32)),
                n => Err(tilegrid_err!(BadSchemaImage: "invalid cell arity {}", n)),
            })
            .collect::<TileGridResult<Vec<_>>>()?;
        let compression = (0..=attribute_num)
            .map(|_| {
                Compression::from_tag(get_u8(buf)?)
                    .ok_or_else(|| tilegrid_err!(BadSchemaImage: "unknown compression tag"))
            })
            .collect::<TileGridResult<Vec<_>>>()?;

        if !buf.is_empty() {
            tilegrid_bail!(BadSchemaImage: "{} trailing bytes after the schema image", buf.len());
        }

        let coords_type = types[attribute_num];
        if !coords_type.is_coord_type() {
            tilegrid_bail!(BadSchemaImage: "'{}' is not a valid coordinates type", coords_type);
        }
        let coords_size = dim_num * coords_type.byte_width();
        if domain_bytes.len() != 2 * coords_size {
            tilegrid_bail!(BadSchemaImage:
                "domain of {} bytes is inconsistent with a coordinates size of {}",
                domain_bytes.len(), coords_size);
        }
        if !extents_bytes.is_empty() && extents_bytes.len() != coords_size {
            tilegrid_bail!(BadSchemaImage:
                "tile extents of {} bytes are inconsistent with a coordinates size of {}",
                extents_bytes.len(), coords_size);
        }
        let domain = CoordBuffer::from_le_bytes(coords_type, &domain_bytes)
            .map_err(|e| tilegrid_err!(BadSchemaImage: "{}", e))?;
        let tile_extents = if extents_bytes.is_empty() {
            None
        } else {
            Some(
                CoordBuffer::from_le_bytes(coords_type, &extents_bytes)
                    .map_err(|e| tilegrid_err!(BadSchemaImage: "{}", e))?,
            )
        };

        let parts = SchemaParts {
            array_name,
            attributes,
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
        };
        let schema = parts
            .finish()
            .map_err(|e| tilegrid_err!(BadSchemaImage: "{}", e))?;
        log::debug!(
            "decoded schema image for array '{}' ({} bytes)",
            schema.array_name(),
            bytes.len(),
        );
        Ok(schema)
    }
}

fn get_u8(buf: &mut &[u8]) -> TileGridResult<u8> {
    if buf.is_empty() {
        tilegrid_bail!(BadSchemaImage: "truncated schema image");
    }
    Ok(buf.get_u8())
}

fn get_bool(buf: &mut &[u8]) -> TileGridResult<bool> {
    match get_u8(buf)? {
        0 => Ok(false),
        1 => Ok(true),
        b => Err(tilegrid_err!(BadSchemaImage: "invalid boolean byte {:#04x}", b)),
    }
}

fn get_i32(buf: &mut &[u8]) -> TileGridResult<i32> {
    if buf.len() < 4 {
        tilegrid_bail!(BadSchemaImage: "truncated schema image");
    }
    Ok(buf.get_i32_le())
}

fn get_i64(buf: &mut &[u8]) -> TileGridResult<i64> {
    if buf.len() < 8 {
        tilegrid_bail!(BadSchemaImage: "truncated schema image");
    }
    Ok(buf.get_i64_le())
}

fn get_count(buf: &mut &[u8], what: &str) -> TileGridResult<usize> {
    let count = get_i32(buf)?;
    if count < 1 {
        tilegrid_bail!(BadSchemaImage: "{} {} is not positive", what, count);
    }
    Ok(count as usize)
}

fn get_sized_bytes(buf: &mut &[u8]) -> TileGridResult<Vec<u8>> {
    let size = get_i32(buf)?;
    if size < 0 {
        tilegrid_bail!(BadSchemaImage: "negative field size {}", size);
    }
    let size = size as usize;
    if buf.len() < size {
        tilegrid_bail!(BadSchemaImage: "truncated schema image");
    }
    let bytes = buf[..size].to_vec();
    buf.advance(size);
    Ok(bytes)
}

fn get_string(buf: &mut &[u8]) -> TileGridResult<String> {
    let bytes = get_sized_bytes(buf)?;
    String::from_utf8(bytes)
        .map_err(|_| tilegrid_err!(BadSchemaImage: "string field is not valid utf-8"))
}
