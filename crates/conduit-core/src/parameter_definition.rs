//! Parameter definitions: the immutable schema of one parameter.
//!
//! A definition describes *what* a parameter is (kind, name, range, default,
//! unit, response curve). It carries no live value; live values are owned by
//! the [`ParameterStore`](crate::ParameterStore) built from the definitions.
//!
//! # Parameter Kinds
//!
//! - [`FloatDefinition`] - Continuous value with range, unit and skew
//! - [`IntDefinition`] - Discrete integer value
//! - [`BoolDefinition`] - Toggle with on/off labels
//! - [`ChoiceDefinition`] - One of an ordered list of labels
//!
//! [`ParameterDefinition`] is the closed sum of the four kinds.
//!
//! # Example
//!
//! ```ignore
//! use conduit_core::{FloatDefinition, ChoiceDefinition, ParameterSet};
//!
//! let mut set = ParameterSet::new();
//! set.add(FloatDefinition::new(Id::Cutoff, "Cutoff", 20.0, 20000.0, 1000.0)
//!     .with_unit("Hz")
//!     .with_skew(0.3))?;
//! set.add(ChoiceDefinition::new(Id::Mode, "Mode", ["LP", "HP", "BP"], 0))?;
//! ```

use crate::error::{ParameterError, ParameterResult};
use crate::types::ParameterId;

/// Default float interval, matching the step most hosts display.
pub const DEFAULT_FLOAT_INTERVAL: f64 = 0.01;

/// Discriminant of a [`ParameterDefinition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    Float,
    Int,
    Bool,
    Choice,
}

// =============================================================================
// FloatDefinition
// =============================================================================

/// Continuous parameter with range, default, unit and response-curve skew.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatDefinition<Id> {
    pub id: Id,
    pub name: String,
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Unit label (e.g., "dB", "Hz", "%").
    pub unit: String,
    /// Response-curve exponent: 1.0 linear, < 1.0 biases toward min,
    /// > 1.0 biases toward max.
    pub skew: f64,
    /// Snapping interval in native units. 0.0 disables snapping.
    pub interval: f64,
}

impl<Id: ParameterId> FloatDefinition<Id> {
    /// Create a linear float definition with no unit.
    pub fn new(id: Id, name: impl Into<String>, min: f64, max: f64, default: f64) -> Self {
        Self {
            id,
            name: name.into(),
            min,
            max,
            default,
            unit: String::new(),
            skew: 1.0,
            interval: DEFAULT_FLOAT_INTERVAL,
        }
    }

    /// Set the unit label.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set the response-curve skew.
    pub fn with_skew(mut self, skew: f64) -> Self {
        self.skew = skew;
        self
    }

    /// Set the snapping interval.
    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    fn validate(&self) -> ParameterResult<()> {
        if !(self.min.is_finite() && self.max.is_finite() && self.default.is_finite()) {
            return Err(invalid(&self.name, "range and default must be finite"));
        }
        if self.min >= self.max {
            return Err(invalid(
                &self.name,
                format!("min ({}) must be less than max ({})", self.min, self.max),
            ));
        }
        if self.default < self.min || self.default > self.max {
            return Err(invalid(
                &self.name,
                format!("default ({}) outside [{}, {}]", self.default, self.min, self.max),
            ));
        }
        if !(self.skew > 0.0 && self.skew.is_finite()) {
            return Err(invalid(&self.name, format!("skew ({}) must be positive", self.skew)));
        }
        if !(self.interval >= 0.0 && self.interval.is_finite()) {
            return Err(invalid(&self.name, "interval must be zero or positive"));
        }
        Ok(())
    }
}

// =============================================================================
// IntDefinition
// =============================================================================

/// Integer-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntDefinition<Id> {
    pub id: Id,
    pub name: String,
    pub min: i32,
    pub max: i32,
    pub default: i32,
    pub unit: String,
}

impl<Id: ParameterId> IntDefinition<Id> {
    /// Create an integer definition with no unit.
    pub fn new(id: Id, name: impl Into<String>, min: i32, max: i32, default: i32) -> Self {
        Self {
            id,
            name: name.into(),
            min,
            max,
            default,
            unit: String::new(),
        }
    }

    /// Set the unit label.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    fn validate(&self) -> ParameterResult<()> {
        if self.min >= self.max {
            return Err(invalid(
                &self.name,
                format!("min ({}) must be less than max ({})", self.min, self.max),
            ));
        }
        if self.default < self.min || self.default > self.max {
            return Err(invalid(
                &self.name,
                format!("default ({}) outside [{}, {}]", self.default, self.min, self.max),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// BoolDefinition
// =============================================================================

/// On/off parameter with display labels for both states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolDefinition<Id> {
    pub id: Id,
    pub name: String,
    pub default: bool,
    pub true_label: String,
    pub false_label: String,
}

impl<Id: ParameterId> BoolDefinition<Id> {
    /// Create a toggle labelled "On"/"Off".
    pub fn new(id: Id, name: impl Into<String>, default: bool) -> Self {
        Self {
            id,
            name: name.into(),
            default,
            true_label: "On".to_string(),
            false_label: "Off".to_string(),
        }
    }

    /// Replace the on/off labels.
    pub fn with_labels(mut self, true_label: impl Into<String>, false_label: impl Into<String>) -> Self {
        self.true_label = true_label.into();
        self.false_label = false_label.into();
        self
    }
}

// =============================================================================
// ChoiceDefinition
// =============================================================================

/// Parameter selecting one of an ordered list of labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDefinition<Id> {
    pub id: Id,
    pub name: String,
    pub choices: Vec<String>,
    pub default_index: usize,
}

impl<Id: ParameterId> ChoiceDefinition<Id> {
    /// Create a choice definition.
    pub fn new<I, S>(id: Id, name: impl Into<String>, choices: I, default_index: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            name: name.into(),
            choices: choices.into_iter().map(Into::into).collect(),
            default_index,
        }
    }

    fn validate(&self) -> ParameterResult<()> {
        if self.choices.is_empty() {
            return Err(invalid(&self.name, "choices must not be empty"));
        }
        if self.default_index >= self.choices.len() {
            return Err(invalid(
                &self.name,
                format!(
                    "default index ({}) outside 0..{}",
                    self.default_index,
                    self.choices.len()
                ),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// ParameterDefinition
// =============================================================================

/// One parameter definition of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterDefinition<Id> {
    Float(FloatDefinition<Id>),
    Int(IntDefinition<Id>),
    Bool(BoolDefinition<Id>),
    Choice(ChoiceDefinition<Id>),
}

impl<Id: ParameterId> ParameterDefinition<Id> {
    /// The parameter's ID.
    pub fn id(&self) -> Id {
        match self {
            Self::Float(d) => d.id,
            Self::Int(d) => d.id,
            Self::Bool(d) => d.id,
            Self::Choice(d) => d.id,
        }
    }

    /// The parameter's display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Float(d) => &d.name,
            Self::Int(d) => &d.name,
            Self::Bool(d) => &d.name,
            Self::Choice(d) => &d.name,
        }
    }

    /// Unit label. Empty for bool and choice parameters.
    pub fn unit(&self) -> &str {
        match self {
            Self::Float(d) => &d.unit,
            Self::Int(d) => &d.unit,
            Self::Bool(_) | Self::Choice(_) => "",
        }
    }

    /// Which of the four kinds this is.
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Float(_) => ParameterKind::Float,
            Self::Int(_) => ParameterKind::Int,
            Self::Bool(_) => ParameterKind::Bool,
            Self::Choice(_) => ParameterKind::Choice,
        }
    }

    /// Default value in native units.
    ///
    /// Bools are 0.0/1.0 and choices are their index.
    pub fn default_native(&self) -> f64 {
        match self {
            Self::Float(d) => d.default,
            Self::Int(d) => d.default as f64,
            Self::Bool(d) => {
                if d.default {
                    1.0
                } else {
                    0.0
                }
            }
            Self::Choice(d) => d.default_index as f64,
        }
    }

    /// Check the range and default invariants.
    pub fn validate(&self) -> ParameterResult<()> {
        match self {
            Self::Float(d) => d.validate(),
            Self::Int(d) => d.validate(),
            Self::Bool(_) => Ok(()),
            Self::Choice(d) => d.validate(),
        }
    }
}

impl<Id> From<FloatDefinition<Id>> for ParameterDefinition<Id> {
    fn from(definition: FloatDefinition<Id>) -> Self {
        Self::Float(definition)
    }
}

impl<Id> From<IntDefinition<Id>> for ParameterDefinition<Id> {
    fn from(definition: IntDefinition<Id>) -> Self {
        Self::Int(definition)
    }
}

impl<Id> From<BoolDefinition<Id>> for ParameterDefinition<Id> {
    fn from(definition: BoolDefinition<Id>) -> Self {
        Self::Bool(definition)
    }
}

impl<Id> From<ChoiceDefinition<Id>> for ParameterDefinition<Id> {
    fn from(definition: ChoiceDefinition<Id>) -> Self {
        Self::Choice(definition)
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> ParameterError {
    ParameterError::InvalidDefinition {
        name: name.to_string(),
        reason: reason.into(),
    }
}
