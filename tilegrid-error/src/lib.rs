#![deny(missing_docs)]

//! Error types and helper macros shared across the tilegrid crates.
//!
//! Every fallible tilegrid operation returns a [`TileGridResult`]. The
//! [`tilegrid_err!`] and [`tilegrid_bail!`] macros construct and return
//! errors of a named kind; [`tilegrid_panic!`] and the [`TileGridExpect`]
//! trait are for invariant violations that indicate a bug rather than bad
//! input.

use std::borrow::Cow;
use std::fmt::Display;

use thiserror::Error;

/// An error message, either static or computed at the error site.
pub type ErrString = Cow<'static, str>;

/// The error type shared by all tilegrid crates.
///
/// One variant per error kind; the payload is a human-readable message.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TileGridError {
    /// A required builder input was never supplied.
    #[error("missing field: {0}")]
    MissingField(ErrString),
    /// A textual type spec could not be parsed.
    #[error("bad type spec: {0}")]
    BadTypeSpec(ErrString),
    /// A value is out of range, empty, or otherwise malformed.
    #[error("bad value: {0}")]
    BadValue(ErrString),
    /// An attribute or dimension name is reused, or the two sets collide.
    #[error("duplicate name: {0}")]
    DuplicateName(ErrString),
    /// Hilbert order was combined with regular tiles, or a scan-order
    /// operation was invoked under Hilbert order.
    #[error("incompatible order: {0}")]
    IncompatibleOrder(ErrString),
    /// A dense array was finalized without tile extents.
    #[error("dense array requires tile extents: {0}")]
    DenseRequiresExtents(ErrString),
    /// A dense array was given a floating coordinate type.
    #[error("invalid dense coordinate type: {0}")]
    DenseCoordType(ErrString),
    /// A serialized schema image is malformed.
    #[error("bad schema image: {0}")]
    BadSchemaImage(ErrString),
    /// A name lookup failed where the contract requires an error.
    #[error("not found: {0}")]
    NotFound(ErrString),
}

/// Result alias used throughout tilegrid.
pub type TileGridResult<T> = Result<T, TileGridError>;

/// Construct a [`TileGridError`] of the given kind from a format string.
///
/// `tilegrid_err!(DuplicateName: "attribute '{}'", name)` builds that
/// variant; with no kind prefix the error defaults to
/// [`TileGridError::BadValue`].
#[macro_export]
macro_rules! tilegrid_err {
    ($variant:ident: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::TileGridError::$variant(format!($fmt $(, $arg)*).into())
    };
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::TileGridError::BadValue(format!($fmt $(, $arg)*).into())
    };
}

/// Return early with a [`TileGridError`], `tilegrid_err!`-style.
#[macro_export]
macro_rules! tilegrid_bail {
    ($($tt:tt)+) => {
        return Err($crate::tilegrid_err!($($tt)+))
    };
}

/// Panic with a formatted [`TileGridError`] message.
///
/// Reserved for invariant violations that cannot be reached through the
/// public API.
#[macro_export]
macro_rules! tilegrid_panic {
    ($($tt:tt)+) => {
        panic!("{}", $crate::tilegrid_err!($($tt)+))
    };
}

/// Unwrap with a contextual message, panicking on failure.
///
/// The tilegrid analogue of `Option::expect`, used where surrounding
/// validation guarantees the value is present.
pub trait TileGridExpect {
    /// The wrapped value type.
    type Output;

    /// Return the wrapped value or panic with `msg`.
    fn tilegrid_expect(self, msg: &str) -> Self::Output;
}

impl<T> TileGridExpect for Option<T> {
    type Output = T;

    fn tilegrid_expect(self, msg: &str) -> T {
        match self {
            Some(v) => v,
            None => tilegrid_panic!("{}", msg),
        }
    }
}

impl<T, E: Display> TileGridExpect for Result<T, E> {
    type Output = T;

    fn tilegrid_expect(self, msg: &str) -> T {
        match self {
            Ok(v) => v,
            Err(e) => tilegrid_panic!("{}: {}", msg, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn err_macro_kinds() {
        let e = tilegrid_err!(DuplicateName: "attribute '{}'", "a");
        assert!(matches!(e, TileGridError::DuplicateName(_)));
        assert_eq!(e.to_string(), "duplicate name: attribute 'a'");

        let e = tilegrid_err!("span {} is negative", -1);
        assert!(matches!(e, TileGridError::BadValue(_)));
    }

    #[test]
    fn bail_macro_returns() {
        fn fails() -> TileGridResult<()> {
            tilegrid_bail!(MissingField: "domain");
        }
        assert!(matches!(fails(), Err(TileGridError::MissingField(_))));
    }

    #[test]
    fn expect_ok_paths() {
        assert_eq!(Some(3).tilegrid_expect("present"), 3);
        let ok: Result<i32, TileGridError> = Ok(4);
        assert_eq!(ok.tilegrid_expect("ok"), 4);
    }

    #[test]
    #[should_panic(expected = "no value")]
    fn expect_panics_with_message() {
        let none: Option<i32> = None;
        none.tilegrid_expect("no value");
    }
}
