//! Parameter value formatting and parsing.
//!
//! [`ParameterFormat`] converts native parameter values to the display
//! strings a host shows in automation lanes and tooltips, and parses typed
//! user input back. The format is derived from the parameter's definition:
//!
//! ```ignore
//! use conduit_core::parameter_format::ParameterFormat;
//!
//! let gain = ParameterFormat::Float { unit: "dB".into(), precision: 2 };
//! assert_eq!(gain.format(-6.0), "-6.00 dB");
//! assert_eq!(gain.parse("-6 dB"), Some(-6.0));
//!
//! let mode = ParameterFormat::Choice { choices: vec!["LP".into(), "HP".into()] };
//! assert_eq!(mode.format(1.0), "HP");
//! ```

use crate::parameter_definition::ParameterDefinition;
use crate::types::ParameterId;

/// Display format of one store parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterFormat {
    /// Float with unit suffix (e.g., "440.00 Hz").
    Float {
        unit: String,
        /// Number of decimal places.
        precision: usize,
    },

    /// Integer with unit suffix (e.g., "4 st").
    Int { unit: String },

    /// Toggle shown with its labels.
    Bool {
        true_label: String,
        false_label: String,
    },

    /// Index shown as its label.
    Choice { choices: Vec<String> },
}

impl ParameterFormat {
    /// Derive the display format from a definition.
    ///
    /// Float precision follows the snapping interval: 0.01 shows two
    /// decimals, 0.5 one, 1.0 none. Continuous floats show two.
    pub fn from_definition<Id: ParameterId>(definition: &ParameterDefinition<Id>) -> Self {
        match definition {
            ParameterDefinition::Float(d) => Self::Float {
                unit: d.unit.clone(),
                precision: precision_for_interval(d.interval),
            },
            ParameterDefinition::Int(d) => Self::Int { unit: d.unit.clone() },
            ParameterDefinition::Bool(d) => Self::Bool {
                true_label: d.true_label.clone(),
                false_label: d.false_label.clone(),
            },
            ParameterDefinition::Choice(d) => Self::Choice {
                choices: d.choices.clone(),
            },
        }
    }

    /// Format a native value to a display string.
    pub fn format(&self, native: f64) -> String {
        match self {
            Self::Float { unit, precision } => {
                with_unit(format!("{:.prec$}", native, prec = *precision), unit)
            }
            Self::Int { unit } => with_unit(format!("{}", native.round() as i64), unit),
            Self::Bool {
                true_label,
                false_label,
            } => {
                if native >= 0.5 {
                    true_label.clone()
                } else {
                    false_label.clone()
                }
            }
            Self::Choice { choices } => {
                let index = native.round().max(0.0) as usize;
                choices
                    .get(index)
                    .or_else(|| choices.last())
                    .cloned()
                    .unwrap_or_default()
            }
        }
    }

    /// Parse a display string to a native value.
    ///
    /// Returns `None` if the string cannot be parsed. Units are optional.
    pub fn parse(&self, s: &str) -> Option<f64> {
        let s = s.trim();

        match self {
            Self::Float { unit, .. } => strip_unit(s, unit).parse().ok(),

            Self::Int { unit } => {
                let value: f64 = strip_unit(s, unit).parse().ok()?;
                Some(value.round())
            }

            Self::Bool {
                true_label,
                false_label,
            } => {
                if s.eq_ignore_ascii_case(true_label) {
                    return Some(1.0);
                }
                if s.eq_ignore_ascii_case(false_label) {
                    return Some(0.0);
                }
                match s.to_lowercase().as_str() {
                    "on" | "true" | "yes" | "1" | "enabled" => Some(1.0),
                    "off" | "false" | "no" | "0" | "disabled" => Some(0.0),
                    _ => None,
                }
            }

            Self::Choice { choices } => {
                if let Some(index) = choices.iter().position(|c| c.eq_ignore_ascii_case(s)) {
                    return Some(index as f64);
                }
                // Fall back to a bare index
                let index: usize = s.parse().ok()?;
                (index < choices.len()).then_some(index as f64)
            }
        }
    }
}

fn with_unit(value: String, unit: &str) -> String {
    if unit.is_empty() {
        value
    } else {
        format!("{} {}", value, unit)
    }
}

fn strip_unit<'a>(s: &'a str, unit: &str) -> &'a str {
    if unit.is_empty() {
        return s;
    }
    s.strip_suffix(unit).unwrap_or(s).trim()
}

fn precision_for_interval(interval: f64) -> usize {
    if interval <= 0.0 {
        return 2;
    }
    let mut precision = 0;
    let mut scaled = interval;
    while precision < 6 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        precision += 1;
    }
    precision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter_definition::{BoolDefinition, ChoiceDefinition, FloatDefinition, IntDefinition};

    #[test]
    fn test_precision_for_interval() {
        assert_eq!(precision_for_interval(0.01), 2);
        assert_eq!(precision_for_interval(0.5), 1);
        assert_eq!(precision_for_interval(1.0), 0);
        assert_eq!(precision_for_interval(0.0), 2);
    }

    #[test]
    fn test_float_format_and_parse() {
        let def: ParameterDefinition<u32> =
            FloatDefinition::new(0, "Gain", -20.0, 20.0, 0.0).with_unit("dB").into();
        let format = ParameterFormat::from_definition(&def);

        assert_eq!(format.format(10.0), "10.00 dB");
        assert_eq!(format.format(-3.256), "-3.26 dB");
        assert_eq!(format.parse("-6 dB"), Some(-6.0));
        assert_eq!(format.parse("4.5dB"), Some(4.5));
        assert_eq!(format.parse(" 2 "), Some(2.0));
        assert_eq!(format.parse("loud"), None);
    }

    #[test]
    fn test_int_format_and_parse() {
        let def: ParameterDefinition<u32> = IntDefinition::new(1, "Ratio", 1, 20, 4).into();
        let format = ParameterFormat::from_definition(&def);

        assert_eq!(format.format(4.0), "4");
        assert_eq!(format.parse("7.4"), Some(7.0));
    }

    #[test]
    fn test_bool_labels() {
        let def: ParameterDefinition<u32> =
            BoolDefinition::new(2, "Bypass", false).with_labels("Bypassed", "Active").into();
        let format = ParameterFormat::from_definition(&def);

        assert_eq!(format.format(1.0), "Bypassed");
        assert_eq!(format.format(0.0), "Active");
        assert_eq!(format.parse("bypassed"), Some(1.0));
        assert_eq!(format.parse("off"), Some(0.0));
        assert_eq!(format.parse("maybe"), None);
    }

    #[test]
    fn test_choice_labels() {
        let def: ParameterDefinition<u32> =
            ChoiceDefinition::new(3, "Mode", ["Peak", "RMS"], 0).into();
        let format = ParameterFormat::from_definition(&def);

        assert_eq!(format.format(1.0), "RMS");
        assert_eq!(format.format(9.0), "RMS");
        assert_eq!(format.parse("peak"), Some(0.0));
        assert_eq!(format.parse("1"), Some(1.0));
        assert_eq!(format.parse("2"), None);
    }
}
