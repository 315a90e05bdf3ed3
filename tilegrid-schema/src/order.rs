//! Cell and tile traversal orders.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tilegrid_error::{tilegrid_err, TileGridError};

/// The order in which cells are laid out within a tile, or tiles across the
/// array.
///
/// The discriminants are the stable tag bytes of the binary schema format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Order {
    /// The last dimension varies fastest.
    #[default]
    RowMajor = 0,
    /// The first dimension varies fastest.
    ColumnMajor = 1,
    /// Hilbert space-filling-curve order. Only valid for irregular tiling.
    Hilbert = 2,
}

impl Order {
    /// The stable serialization tag for this order.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Look up an order by its serialization tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Order::RowMajor),
            1 => Some(Order::ColumnMajor),
            2 => Some(Order::Hilbert),
            _ => None,
        }
    }
}

impl Display for Order {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowMajor => write!(f, "row-major"),
            Self::ColumnMajor => write!(f, "column-major"),
            Self::Hilbert => write!(f, "hilbert"),
        }
    }
}

impl FromStr for Order {
    type Err = TileGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "row-major" => Ok(Self::RowMajor),
            "column-major" => Ok(Self::ColumnMajor),
            "hilbert" => Ok(Self::Hilbert),
            _ => Err(tilegrid_err!("invalid order '{}'", s)),
        }
    }
}
