//! Randomized round-trip and accounting properties over generated schemas.

use rand::prelude::*;
use tilegrid_dtype::{CoordBuffer, Datatype};
use tilegrid_schema::{
    ArraySchema, ArraySchemaBuilder, CellValNum, Compression, CoordsSpec, Order, TypeSpec,
};

/// Generate a valid schema: regular tiling only over integer coordinates
/// (with spans that divide evenly), Hilbert order only over irregular
/// tiling.
fn random_schema(rng: &mut StdRng) -> ArraySchema {
    let dim_num = rng.gen_range(1..=4usize);
    let attribute_num = rng.gen_range(1..=3usize);

    let attributes: Vec<String> = (0..attribute_num).map(|i| format!("a{i}")).collect();
    let dimensions: Vec<String> = (0..dim_num).map(|i| format!("d{i}")).collect();

    let attribute_types: Vec<TypeSpec> = (0..attribute_num)
        .map(|_| {
            let datatype = *[
                Datatype::Char,
                Datatype::Int32,
                Datatype::Int64,
                Datatype::Float32,
                Datatype::Float64,
            ]
            .choose(rng)
            .unwrap();
            if rng.gen_bool(0.25) {
                TypeSpec::var(datatype)
            } else {
                TypeSpec::fixed(datatype, rng.gen_range(1..=4))
            }
        })
        .collect();

    let regular = rng.gen_bool(0.5);
    let coords_datatype = if regular {
        *[Datatype::Int32, Datatype::Int64].choose(rng).unwrap()
    } else {
        *[
            Datatype::Int32,
            Datatype::Int64,
            Datatype::Float32,
            Datatype::Float64,
        ]
        .choose(rng)
        .unwrap()
    };

    // Per dimension: extent in 1..=4 and tile count in 1..=4, so every
    // span divides evenly by its extent.
    let extents_i64: Vec<i64> = (0..dim_num).map(|_| rng.gen_range(1..=4)).collect();
    let spans: Vec<i64> = extents_i64
        .iter()
        .map(|e| e * rng.gen_range(1..=4i64))
        .collect();
    let lows: Vec<i64> = (0..dim_num).map(|_| rng.gen_range(-8..=8)).collect();

    fn interleave<T: Copy>(lows: &[T], his: &[T]) -> Vec<(T, T)> {
        lows.iter().copied().zip(his.iter().copied()).collect()
    }
    let his: Vec<i64> = lows
        .iter()
        .zip(&spans)
        .map(|(lo, span)| lo + span - 1)
        .collect();

    let (domain, tile_extents) = match coords_datatype {
        Datatype::Int32 => (
            CoordBuffer::from(
                interleave(&lows, &his)
                    .into_iter()
                    .flat_map(|(lo, hi)| [lo as i32, hi as i32])
                    .collect::<Vec<_>>(),
            ),
            CoordBuffer::from(extents_i64.iter().map(|e| *e as i32).collect::<Vec<_>>()),
        ),
        Datatype::Int64 => (
            CoordBuffer::from(
                interleave(&lows, &his)
                    .into_iter()
                    .flat_map(|(lo, hi)| [lo, hi])
                    .collect::<Vec<_>>(),
            ),
            CoordBuffer::from(extents_i64.clone()),
        ),
        Datatype::Float32 => (
            CoordBuffer::from(
                interleave(&lows, &his)
                    .into_iter()
                    .flat_map(|(lo, hi)| [lo as f32, hi as f32 + 0.5])
                    .collect::<Vec<_>>(),
            ),
            CoordBuffer::from(extents_i64.iter().map(|e| *e as f32).collect::<Vec<_>>()),
        ),
        Datatype::Float64 => (
            CoordBuffer::from(
                interleave(&lows, &his)
                    .into_iter()
                    .flat_map(|(lo, hi)| [lo as f64, hi as f64 + 0.5])
                    .collect::<Vec<_>>(),
            ),
            CoordBuffer::from(extents_i64.iter().map(|e| *e as f64).collect::<Vec<_>>()),
        ),
        Datatype::Char => unreachable!("char coordinates are never generated"),
    };

    let cell_order = if regular {
        *[Order::RowMajor, Order::ColumnMajor].choose(rng).unwrap()
    } else {
        *[Order::RowMajor, Order::ColumnMajor, Order::Hilbert]
            .choose(rng)
            .unwrap()
    };
    let tile_order = if regular {
        *[Order::RowMajor, Order::ColumnMajor].choose(rng).unwrap()
    } else {
        Order::RowMajor
    };

    let compression: Vec<Compression> = (0..=attribute_num)
        .map(|_| {
            *[Compression::None, Compression::Gzip].choose(rng).unwrap()
        })
        .collect();

    let dense = regular && coords_datatype.is_integral() && rng.gen_bool(0.5);

    let mut builder = ArraySchemaBuilder::new(format!("array_{}", rng.gen_range(0..1000)))
        .with_attributes(attributes)
        .with_dimensions(dimensions)
        .with_attribute_types(attribute_types)
        .with_coords_type(CoordsSpec::Typed(coords_datatype))
        .with_domain(domain)
        .with_dense(dense)
        .with_capacity(rng.gen_range(1..=100_000))
        .with_consolidation_step(rng.gen_range(1..=10))
        .with_cell_order(cell_order)
        .with_tile_order(tile_order)
        .with_compression(compression);
    if regular {
        builder = builder.with_tile_extents(tile_extents);
    }
    builder.build().unwrap()
}

#[test]
fn serialization_round_trip() {
    let mut rng = StdRng::seed_from_u64(0x7116);
    for _ in 0..200 {
        let schema = random_schema(&mut rng);
        let bytes = schema.serialize();
        assert_eq!(
            bytes.len(),
            schema.serialized_size(),
            "size accounting diverged for {schema}"
        );
        let decoded = ArraySchema::deserialize(&bytes).unwrap();
        assert_eq!(decoded, schema, "round trip diverged for {schema}");
    }
}

#[test]
fn tile_accounting_for_regular_integer_schemas() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let schema = random_schema(&mut rng);
        let Some(extents) = schema.tile_extents() else {
            assert_eq!(schema.cell_num_per_tile(), schema.capacity());
            continue;
        };
        if !schema.coords_datatype().is_integral() {
            continue;
        }

        let (spans, extents): (Vec<i64>, Vec<i64>) = match schema.coords_datatype() {
            Datatype::Int32 => {
                let d = schema.domain().typed::<i32>().unwrap();
                let e = extents.typed::<i32>().unwrap();
                (
                    d.chunks_exact(2)
                        .map(|p| (p[1] - p[0] + 1) as i64)
                        .collect(),
                    e.iter().map(|&x| x as i64).collect(),
                )
            }
            _ => {
                let d = schema.domain().typed::<i64>().unwrap();
                let e = extents.typed::<i64>().unwrap();
                (
                    d.chunks_exact(2).map(|p| p[1] - p[0] + 1).collect(),
                    e.to_vec(),
                )
            }
        };

        let expected_tiles: i64 = spans.iter().zip(&extents).map(|(s, e)| s / e).product();
        let expected_cells: i64 = extents.iter().product();
        assert_eq!(schema.tile_num(), Some(expected_tiles));
        assert_eq!(schema.cell_num_per_tile(), expected_cells);

        // The tile domain spans exactly the per-dimension tile counts.
        let tile_domain = schema.tile_domain().unwrap();
        let bounds: Vec<i64> = match tile_domain {
            CoordBuffer::Int32(v) => v.iter().map(|&x| x as i64).collect(),
            CoordBuffer::Int64(v) => v.clone(),
            _ => unreachable!("integer schemas have integer tile domains"),
        };
        for (i, (s, e)) in spans.iter().zip(&extents).enumerate() {
            assert_eq!(bounds[2 * i], 0);
            assert_eq!(bounds[2 * i + 1], s / e - 1);
        }
    }
}

#[test]
fn var_attributes_use_offset_slots() {
    let mut rng = StdRng::seed_from_u64(0xbeef);
    for _ in 0..100 {
        let schema = random_schema(&mut rng);
        for i in 0..schema.attribute_num() {
            let expected = match schema.cell_val_num(i) {
                CellValNum::Var => {
                    assert!(schema.var_size(i));
                    schema.cell_num_per_tile() as u64 * 8
                }
                CellValNum::Fixed(n) => {
                    let cell = n as usize * schema.datatype(i).byte_width();
                    assert_eq!(schema.cell_size(i), Some(cell));
                    schema.cell_num_per_tile() as u64 * cell as u64
                }
            };
            assert_eq!(schema.tile_size(i), expected);
        }
    }
}
