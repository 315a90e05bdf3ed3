//! Per-attribute compression modes.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use tilegrid_error::{tilegrid_err, TileGridError};

/// The compression applied to an attribute's tiles (including the
/// synthetic coordinates attribute).
///
/// The discriminants are the stable tag bytes of the binary schema format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Compression {
    /// Tiles are stored uncompressed.
    #[default]
    None = 0,
    /// Tiles are gzip-compressed.
    Gzip = 1,
}

impl Compression {
    /// The stable serialization tag for this mode.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Look up a compression mode by its serialization tag.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Compression::None),
            1 => Some(Compression::Gzip),
            _ => None,
        }
    }
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::Gzip => write!(f, "GZIP"),
        }
    }
}

impl FromStr for Compression {
    type Err = TileGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(Self::None),
            "GZIP" => Ok(Self::Gzip),
            _ => Err(tilegrid_err!("invalid compression type '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_stable() {
        assert_eq!(Compression::None.tag(), 0);
        assert_eq!(Compression::Gzip.tag(), 1);
        assert_eq!(Compression::from_tag(0), Some(Compression::None));
        assert_eq!(Compression::from_tag(1), Some(Compression::Gzip));
        assert_eq!(Compression::from_tag(2), None);
    }

    #[test]
    fn parse_matches_collaborator_strings() {
        assert_eq!("NONE".parse::<Compression>().unwrap(), Compression::None);
        assert_eq!("GZIP".parse::<Compression>().unwrap(), Compression::Gzip);
        assert!("gzip".parse::<Compression>().is_err());
    }
}
