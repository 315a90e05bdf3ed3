//! Type-tagged owned coordinate sequences.

use std::fmt::{Display, Formatter};

use tilegrid_error::{tilegrid_bail, TileGridResult};

use crate::{Datatype, NativeDatatype};

/// An owned sequence of coordinate-typed values.
///
/// The schema's domain, tile extents, and tile domain are all stored as
/// `CoordBuffer`s: the element type travels with the data, so a buffer can
/// be validated against the schema's coordinate type instead of being
/// reinterpreted blindly.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordBuffer {
    /// 32-bit signed integer coordinates.
    Int32(Vec<i32>),
    /// 64-bit signed integer coordinates.
    Int64(Vec<i64>),
    /// 32-bit floating point coordinates.
    Float32(Vec<f32>),
    /// 64-bit floating point coordinates.
    Float64(Vec<f64>),
}

impl CoordBuffer {
    /// The element type of this buffer.
    pub fn datatype(&self) -> Datatype {
        match self {
            Self::Int32(_) => Datatype::Int32,
            Self::Int64(_) => Datatype::Int64,
            Self::Float32(_) => Datatype::Float32,
            Self::Float64(_) => Datatype::Float64,
        }
    }

    /// The number of elements in this buffer.
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    /// Returns `true` iff the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the elements as a typed slice.
    ///
    /// Returns `None` when `T` is not the buffer's element type.
    pub fn typed<T: CoordDatatype>(&self) -> Option<&[T]> {
        T::coord_slice(self)
    }

    /// The buffer's elements in little-endian byte order.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Self::Int32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::Int64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::Float32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            Self::Float64(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }

    /// Reconstruct a buffer of the given element type from little-endian
    /// bytes.
    ///
    /// The byte length must be a whole multiple of the element width, and
    /// the type must be coordinate-admissible.
    pub fn from_le_bytes(datatype: Datatype, bytes: &[u8]) -> TileGridResult<Self> {
        let width = datatype.byte_width();
        if bytes.len() % width != 0 {
            tilegrid_bail!(
                "coordinate buffer of {} bytes is not a multiple of the {} element width {}",
                bytes.len(),
                datatype,
                width
            );
        }
        macro_rules! decode {
            ($T:ty) => {
                bytes
                    .chunks_exact(width)
                    .map(|c| {
                        let mut raw = [0u8; std::mem::size_of::<$T>()];
                        raw.copy_from_slice(c);
                        <$T>::from_le_bytes(raw)
                    })
                    .collect()
            };
        }
        Ok(match datatype {
            Datatype::Int32 => Self::Int32(decode!(i32)),
            Datatype::Int64 => Self::Int64(decode!(i64)),
            Datatype::Float32 => Self::Float32(decode!(f32)),
            Datatype::Float64 => Self::Float64(decode!(f64)),
            Datatype::Char => tilegrid_bail!("char is not a coordinate type"),
        })
    }
}

impl Display for CoordBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn join<T: Display>(f: &mut Formatter<'_>, values: &[T]) -> std::fmt::Result {
            write!(f, "[")?;
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{v}")?;
            }
            write!(f, "]")
        }
        match self {
            Self::Int32(v) => join(f, v),
            Self::Int64(v) => join(f, v),
            Self::Float32(v) => join(f, v),
            Self::Float64(v) => join(f, v),
        }
    }
}

impl From<Vec<i32>> for CoordBuffer {
    fn from(v: Vec<i32>) -> Self {
        Self::Int32(v)
    }
}

impl From<Vec<i64>> for CoordBuffer {
    fn from(v: Vec<i64>) -> Self {
        Self::Int64(v)
    }
}

impl From<Vec<f32>> for CoordBuffer {
    fn from(v: Vec<f32>) -> Self {
        Self::Float32(v)
    }
}

impl From<Vec<f64>> for CoordBuffer {
    fn from(v: Vec<f64>) -> Self {
        Self::Float64(v)
    }
}

/// A native type admissible as a coordinate element.
///
/// Implemented for `i32`, `i64`, `f32`, and `f64`; char data cannot carry
/// coordinates.
pub trait CoordDatatype: NativeDatatype {
    /// Borrow a [`CoordBuffer`]'s elements when it holds this type.
    fn coord_slice(buffer: &CoordBuffer) -> Option<&[Self]>;
}

macro_rules! coord_datatype {
    ($T:ty, $variant:tt) => {
        impl CoordDatatype for $T {
            fn coord_slice(buffer: &CoordBuffer) -> Option<&[Self]> {
                match buffer {
                    CoordBuffer::$variant(v) => Some(v.as_slice()),
                    _ => None,
                }
            }
        }
    };
}

coord_datatype!(i32, Int32);
coord_datatype!(i64, Int64);
coord_datatype!(f32, Float32);
coord_datatype!(f64, Float64);

#[cfg(test)]
mod tests {
    use tilegrid_error::TileGridError;

    use super::*;

    #[test]
    fn typed_access() {
        let buf = CoordBuffer::from(vec![1i64, 2, 3]);
        assert_eq!(buf.datatype(), Datatype::Int64);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.typed::<i64>(), Some([1i64, 2, 3].as_slice()));
        assert_eq!(buf.typed::<i32>(), None);
        assert_eq!(buf.typed::<f64>(), None);
    }

    #[test]
    fn le_bytes_round_trip() {
        let buf = CoordBuffer::from(vec![0i32, -1, 5]);
        let bytes = buf.to_le_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &[0xff, 0xff, 0xff, 0xff]);
        assert_eq!(
            CoordBuffer::from_le_bytes(Datatype::Int32, &bytes).unwrap(),
            buf
        );

        let buf = CoordBuffer::from(vec![0.5f64, -2.25]);
        let bytes = buf.to_le_bytes();
        assert_eq!(
            CoordBuffer::from_le_bytes(Datatype::Float64, &bytes).unwrap(),
            buf
        );
    }

    #[test]
    fn from_le_bytes_rejects_ragged_input() {
        let err = CoordBuffer::from_le_bytes(Datatype::Int64, &[0u8; 7]);
        assert!(matches!(err, Err(TileGridError::BadValue(_))));

        let err = CoordBuffer::from_le_bytes(Datatype::Char, &[0u8; 4]);
        assert!(matches!(err, Err(TileGridError::BadValue(_))));
    }

    #[test]
    fn display_lists_elements() {
        let buf = CoordBuffer::from(vec![0i32, 9, 0, 9]);
        assert_eq!(buf.to_string(), "[0, 9, 0, 9]");
    }
}
