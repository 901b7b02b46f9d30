//! Live parameters held by the parameter store.
//!
//! A [`StoreParameter`] is the store-side counterpart of a
//! [`ParameterDefinition`]: it owns the current value as an atomic
//! normalized cell plus everything needed to convert that value for the
//! host (range mapping, snapping, display text).
//!
//! # Value Storage
//!
//! Values are stored as normalized `f64` bit patterns in an `AtomicU64`,
//! so reads and writes are lock-free from any thread. Every write goes
//! through the mapper first, so the stored value always corresponds to a
//! legal native value (on the interval grid, inside the range).
//!
//! # Mapping by Kind
//!
//! | Kind   | Native range        | Curve             | Interval        |
//! |--------|---------------------|-------------------|-----------------|
//! | Float  | `min..=max`         | power (`skew`)    | definition's    |
//! | Int    | `min..=max`         | linear            | 1               |
//! | Bool   | `0..=1`             | linear            | 1               |
//! | Choice | `0..=len-1`         | linear            | 1               |

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ParameterResult;
use crate::parameter_definition::{ParameterDefinition, ParameterKind};
use crate::parameter_format::ParameterFormat;
use crate::parameter_range::{LinearMapper, PowerMapper, RangeMapper, SteppedMapper};
use crate::types::{ParameterId, ParameterValue};

/// One parameter inside a [`ParameterStore`](crate::ParameterStore).
#[derive(Debug)]
pub struct StoreParameter {
    /// Store key (`"param_<ordinal>"`)
    key: String,
    /// Display name
    name: String,
    kind: ParameterKind,
    /// Atomic storage for the normalized value (0.0-1.0)
    value: AtomicU64,
    /// Normalized default, already snapped
    default_normalized: ParameterValue,
    /// Native <-> normalized mapping with snapping
    mapper: SteppedMapper,
    /// Host display text
    format: ParameterFormat,
}

impl StoreParameter {
    /// Build the live parameter for a definition.
    ///
    /// The definition is validated first, so a bad range or skew is an
    /// error rather than a mapper panic.
    pub fn from_definition<Id: ParameterId>(
        definition: &ParameterDefinition<Id>,
    ) -> ParameterResult<Self> {
        definition.validate()?;

        let mapper = match definition {
            ParameterDefinition::Float(d) => {
                SteppedMapper::new(PowerMapper::new(d.min..=d.max, d.skew), d.interval)
            }
            ParameterDefinition::Int(d) => {
                SteppedMapper::new(LinearMapper::new(d.min as f64..=d.max as f64), 1.0)
            }
            ParameterDefinition::Bool(_) => SteppedMapper::new(LinearMapper::new(0.0..=1.0), 1.0),
            ParameterDefinition::Choice(d) => SteppedMapper::new(
                LinearMapper::new(0.0..=(d.choices.len().saturating_sub(1)) as f64),
                1.0,
            ),
        };

        let default_normalized = mapper.normalize(definition.default_native());

        Ok(Self {
            key: definition.id().key(),
            name: definition.name().to_string(),
            kind: definition.kind(),
            value: AtomicU64::new(default_normalized.to_bits()),
            default_normalized,
            mapper,
            format: ParameterFormat::from_definition(definition),
        })
    }

    /// Store key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Current normalized value.
    #[inline]
    pub fn get_normalized(&self) -> ParameterValue {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }

    /// Snap and store a normalized value. Returns the value actually stored.
    #[inline]
    pub fn set_normalized(&self, normalized: ParameterValue) -> ParameterValue {
        let snapped = self.snap_normalized(normalized);
        self.value.store(snapped.to_bits(), Ordering::Release);
        snapped
    }

    /// Store a normalized value as is, without snapping. For restoring a
    /// value this parameter produced itself.
    pub(crate) fn restore_normalized(&self, normalized: ParameterValue) {
        self.value.store(normalized.to_bits(), Ordering::Release);
    }

    /// Current native value.
    pub fn get_native(&self) -> ParameterValue {
        self.normalized_to_native(self.get_normalized())
    }

    /// Normalized default.
    pub fn default_normalized(&self) -> ParameterValue {
        self.default_normalized
    }

    /// Native default.
    pub fn default_native(&self) -> ParameterValue {
        self.normalized_to_native(self.default_normalized)
    }

    /// Convert normalized to a legal native value.
    #[inline]
    pub fn normalized_to_native(&self, normalized: ParameterValue) -> ParameterValue {
        self.mapper.denormalize(normalized)
    }

    /// Convert a native value to normalized, snapping it first.
    #[inline]
    pub fn native_to_normalized(&self, native: ParameterValue) -> ParameterValue {
        self.mapper.normalize(native)
    }

    /// Round a normalized value to the nearest legal one.
    pub fn snap_normalized(&self, normalized: ParameterValue) -> ParameterValue {
        if normalized.is_nan() {
            return self.default_normalized;
        }
        self.mapper.normalize(self.mapper.denormalize(normalized))
    }

    /// Native range as (min, max).
    pub fn range(&self) -> (ParameterValue, ParameterValue) {
        self.mapper.range()
    }

    /// Display text for a normalized value.
    pub fn value_to_text(&self, normalized: ParameterValue) -> String {
        self.format.format(self.normalized_to_native(normalized))
    }

    /// Parse display text into a normalized value.
    pub fn text_to_value(&self, text: &str) -> Option<ParameterValue> {
        self.format.parse(text).map(|native| self.native_to_normalized(native))
    }
}
