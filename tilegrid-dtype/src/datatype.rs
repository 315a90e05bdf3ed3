//! Element type definitions and native-type dispatch.

use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use num_traits::{FromPrimitive, Num, NumCast, ToPrimitive};
use tilegrid_error::{tilegrid_err, TileGridError};

/// An element type for attribute values and coordinates.
///
/// The discriminants are the stable tag bytes used by the binary schema
/// format; renumbering them breaks every stored array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Datatype {
    /// A single byte, used for character data.
    Char = 0,
    /// A 32-bit signed integer.
    Int32 = 1,
    /// A 64-bit signed integer.
    Int64 = 2,
    /// A 32-bit floating point number.
    Float32 = 3,
    /// A 64-bit floating point number.
    Float64 = 4,
}

impl Datatype {
    /// All registry entries, in tag order.
    pub const ALL: [Datatype; 5] = [
        Datatype::Char,
        Datatype::Int32,
        Datatype::Int64,
        Datatype::Float32,
        Datatype::Float64,
    ];

    /// The stable serialization tag for this type.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a registry entry by its serialization tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Datatype::Char),
            1 => Some(Datatype::Int32),
            2 => Some(Datatype::Int64),
            3 => Some(Datatype::Float32),
            4 => Some(Datatype::Float64),
            _ => None,
        }
    }

    /// The number of bytes one element of this type occupies.
    pub const fn byte_width(self) -> usize {
        match self {
            Datatype::Char => 1,
            Datatype::Int32 => 4,
            Datatype::Int64 => 8,
            Datatype::Float32 => 4,
            Datatype::Float64 => 8,
        }
    }

    /// Returns `true` iff this is an integer type.
    pub const fn is_integral(self) -> bool {
        matches!(self, Datatype::Char | Datatype::Int32 | Datatype::Int64)
    }

    /// Returns `true` iff this is a floating point type.
    pub const fn is_floating(self) -> bool {
        matches!(self, Datatype::Float32 | Datatype::Float64)
    }

    /// Returns `true` iff this type may carry coordinates.
    ///
    /// All types except [`Datatype::Char`] are admissible; dense arrays
    /// additionally restrict coordinates to the integer types.
    pub const fn is_coord_type(self) -> bool {
        !matches!(self, Datatype::Char)
    }
}

impl Display for Datatype {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Char => write!(f, "char"),
            Self::Int32 => write!(f, "int32"),
            Self::Int64 => write!(f, "int64"),
            Self::Float32 => write!(f, "float32"),
            Self::Float64 => write!(f, "float64"),
        }
    }
}

impl FromStr for Datatype {
    type Err = TileGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "char" => Ok(Self::Char),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            _ => Err(tilegrid_err!(BadTypeSpec: "unknown element type '{}'", s)),
        }
    }
}

/// A native Rust type that corresponds 1:1 to a registry entry.
pub trait NativeDatatype:
    Send
    + Sync
    + Clone
    + Copy
    + Debug
    + Display
    + Default
    + PartialEq
    + PartialOrd
    + Num
    + NumCast
    + FromPrimitive
    + ToPrimitive
{
    /// The registry entry that corresponds to this native type.
    const DTYPE: Datatype;
}

macro_rules! native_datatype {
    ($T:ty, $dtype:tt) => {
        impl NativeDatatype for $T {
            const DTYPE: Datatype = Datatype::$dtype;
        }
    };
}

native_datatype!(i8, Char);
native_datatype!(i32, Int32);
native_datatype!(i64, Int64);
native_datatype!(f32, Float32);
native_datatype!(f64, Float64);

/// Macro to match over each registry entry, binding the corresponding
/// native type (from [`NativeDatatype`]).
#[macro_export]
macro_rules! match_each_datatype {
    ($self:expr, | $_:tt $T:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $T:ident ) => ( $($body)* )}
        use $crate::Datatype;
        match $self {
            Datatype::Char => __with__! { i8 },
            Datatype::Int32 => __with__! { i32 },
            Datatype::Int64 => __with__! { i64 },
            Datatype::Float32 => __with__! { f32 },
            Datatype::Float64 => __with__! { f64 },
        }
    })
}

/// Macro to match over each coordinate-admissible registry entry, binding
/// the corresponding native type (from [`NativeDatatype`]).
#[macro_export]
macro_rules! match_each_coord_datatype {
    ($self:expr, | $_:tt $T:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $T:ident ) => ( $($body)* )}
        use $crate::Datatype;
        match $self {
            Datatype::Int32 => __with__! { i32 },
            Datatype::Int64 => __with__! { i64 },
            Datatype::Float32 => __with__! { f32 },
            Datatype::Float64 => __with__! { f64 },
            Datatype::Char => panic!("char is not a coordinate type"),
        }
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(Datatype::Char.tag(), 0);
        assert_eq!(Datatype::Int32.tag(), 1);
        assert_eq!(Datatype::Int64.tag(), 2);
        assert_eq!(Datatype::Float32.tag(), 3);
        assert_eq!(Datatype::Float64.tag(), 4);

        for dt in Datatype::ALL {
            assert_eq!(Datatype::from_tag(dt.tag()), Some(dt));
        }
        assert_eq!(Datatype::from_tag(5), None);
        assert_eq!(Datatype::from_tag(255), None);
    }

    #[test]
    fn widths() {
        assert_eq!(Datatype::Char.byte_width(), 1);
        assert_eq!(Datatype::Int32.byte_width(), 4);
        assert_eq!(Datatype::Int64.byte_width(), 8);
        assert_eq!(Datatype::Float32.byte_width(), 4);
        assert_eq!(Datatype::Float64.byte_width(), 8);
    }

    #[test]
    fn predicates() {
        assert!(Datatype::Char.is_integral());
        assert!(Datatype::Int32.is_integral());
        assert!(Datatype::Int64.is_integral());
        assert!(!Datatype::Float32.is_integral());
        assert!(Datatype::Float64.is_floating());
        assert!(!Datatype::Int64.is_floating());

        assert!(!Datatype::Char.is_coord_type());
        assert!(Datatype::Float32.is_coord_type());
    }

    #[rstest]
    #[case("char", Datatype::Char)]
    #[case("int32", Datatype::Int32)]
    #[case("int64", Datatype::Int64)]
    #[case("float32", Datatype::Float32)]
    #[case("float64", Datatype::Float64)]
    fn parse_display_round_trip(#[case] s: &str, #[case] dt: Datatype) {
        assert_eq!(s.parse::<Datatype>().unwrap(), dt);
        assert_eq!(dt.to_string(), s);
    }

    #[rstest]
    #[case("uint8")]
    #[case("int")]
    #[case("Int32")]
    #[case("")]
    fn parse_rejects_unknown(#[case] s: &str) {
        assert!(matches!(
            s.parse::<Datatype>(),
            Err(TileGridError::BadTypeSpec(_))
        ));
    }

    #[test]
    fn native_bindings() {
        assert_eq!(<i8 as NativeDatatype>::DTYPE, Datatype::Char);
        assert_eq!(<i32 as NativeDatatype>::DTYPE, Datatype::Int32);
        assert_eq!(<i64 as NativeDatatype>::DTYPE, Datatype::Int64);
        assert_eq!(<f32 as NativeDatatype>::DTYPE, Datatype::Float32);
        assert_eq!(<f64 as NativeDatatype>::DTYPE, Datatype::Float64);

        let width = match_each_datatype!(Datatype::Int64, |$T| std::mem::size_of::<$T>());
        assert_eq!(width, 8);
    }
}
