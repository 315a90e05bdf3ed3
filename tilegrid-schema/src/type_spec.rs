//! Attribute and coordinate type specs.
//!
//! Callers with typed inputs construct [`TypeSpec`] and [`CoordsSpec`]
//! directly; the CLI collaborator's legacy textual form
//! `"<scalar>[:<arity>|:var]"` parses into the same structures.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tilegrid_dtype::Datatype;
use tilegrid_error::{tilegrid_bail, tilegrid_err, TileGridError};

/// The number of values a cell holds for one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellValNum {
    /// A fixed, positive number of values per cell.
    Fixed(u32),
    /// A variable number of values per cell; the tile stores a fixed-width
    /// offset slot instead.
    Var,
}

impl CellValNum {
    /// Returns `true` iff cells are variable-length.
    pub const fn is_var(self) -> bool {
        matches!(self, CellValNum::Var)
    }
}

impl Default for CellValNum {
    fn default() -> Self {
        Self::Fixed(1)
    }
}

impl Display for CellValNum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Var => write!(f, "var"),
        }
    }
}

/// The element type and arity of one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSpec {
    /// The element type of the attribute's values.
    pub datatype: Datatype,
    /// How many values each cell holds.
    pub cell_val_num: CellValNum,
}

impl TypeSpec {
    /// A fixed-arity spec.
    pub const fn fixed(datatype: Datatype, num: u32) -> Self {
        Self {
            datatype,
            cell_val_num: CellValNum::Fixed(num),
        }
    }

    /// A variable-length spec.
    pub const fn var(datatype: Datatype) -> Self {
        Self {
            datatype,
            cell_val_num: CellValNum::Var,
        }
    }
}

impl Display for TypeSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.datatype, self.cell_val_num)
    }
}

impl FromStr for TypeSpec {
    type Err = TileGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split(':');
        let scalar = tokens.next().unwrap_or_default();
        let datatype = scalar.parse::<Datatype>()?;
        let cell_val_num = match tokens.next() {
            None => CellValNum::Fixed(1),
            Some("var") => CellValNum::Var,
            Some(arity) => {
                let num = arity.parse::<u32>().map_err(|_| {
                    tilegrid_err!(BadTypeSpec:
                        "the number of values per cell in '{}' must be a positive integer", s)
                })?;
                if num == 0 {
                    tilegrid_bail!(BadTypeSpec:
                        "the number of values per cell in '{}' must be a positive integer", s);
                }
                CellValNum::Fixed(num)
            }
        };
        if tokens.next().is_some() {
            tilegrid_bail!(BadTypeSpec: "redundant tokens in type spec '{}'", s);
        }
        Ok(Self {
            datatype,
            cell_val_num,
        })
    }
}

/// The coordinate type of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordsSpec {
    /// All dimensions share this element type.
    Typed(Datatype),
    /// Key-value mode: the single user dimension expands into four `int32`
    /// hash dimensions.
    KeyValue,
}

impl Display for CoordsSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Typed(dt) => write!(f, "{dt}"),
            Self::KeyValue => write!(f, "char:var"),
        }
    }
}

impl FromStr for CoordsSpec {
    type Err = TileGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "char:var" {
            return Ok(Self::KeyValue);
        }
        let datatype = s
            .parse::<Datatype>()
            .map_err(|_| tilegrid_err!(BadTypeSpec: "invalid coordinates type '{}'", s))?;
        if !datatype.is_coord_type() {
            tilegrid_bail!(BadTypeSpec: "invalid coordinates type '{}'", s);
        }
        Ok(Self::Typed(datatype))
    }
}
