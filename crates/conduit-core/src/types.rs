//! Common types used throughout the Conduit framework.

use std::fmt::Debug;
use std::hash::Hash;

/// Parameter value.
///
/// Used both for normalized values (0.0 to 1.0) and native values in the
/// parameter's real-world unit (Hz, dB, ms, ...).
pub type ParameterValue = f64;

/// Prefix of every store key produced by [`parameter_key`].
pub const PARAMETER_KEY_PREFIX: &str = "param_";

/// Identifier of a parameter within one [`ParameterSet`](crate::ParameterSet).
///
/// IDs are opaque, totally ordered and enumerable. Each ID maps to a stable
/// integer ordinal, and the ordinal maps to the string key used by the
/// parameter store (`"param_<ordinal>"`). That key is part of the persisted
/// state format: changing an ordinal breaks every preset saved before.
///
/// Implement this with `#[derive(ParameterId)]` on a fieldless enum:
///
/// ```ignore
/// use conduit::prelude::*;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ParameterId)]
/// pub enum Id {
///     Threshold,
///     Ratio,
///     Output = 10,
/// }
///
/// assert_eq!(Id::Output.key(), "param_10");
/// ```
pub trait ParameterId: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Stable integer ordinal of this ID.
    fn ordinal(self) -> u32;

    /// Inverse of [`ordinal`](Self::ordinal). Returns `None` for ordinals
    /// that do not name an ID.
    fn from_ordinal(ordinal: u32) -> Option<Self>;

    /// String key used by the parameter store.
    fn key(self) -> String {
        parameter_key(self.ordinal())
    }
}

impl ParameterId for u32 {
    #[inline]
    fn ordinal(self) -> u32 {
        self
    }

    #[inline]
    fn from_ordinal(ordinal: u32) -> Option<Self> {
        Some(ordinal)
    }
}

/// Format a store key from an ordinal: `7` becomes `"param_7"`.
pub fn parameter_key(ordinal: u32) -> String {
    format!("{}{}", PARAMETER_KEY_PREFIX, ordinal)
}

/// Parse a store key back into its ordinal.
///
/// Returns `None` if the key does not follow the `"param_<ordinal>"` format.
pub fn parse_key(key: &str) -> Option<u32> {
    let digits = key.strip_prefix(PARAMETER_KEY_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
