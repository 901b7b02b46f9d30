//! Reusable templates for groups of related parameters.
//!
//! A [`ParameterGroup`] describes a set of member parameters once, keyed by
//! an ordinal offset from a base ID, and stamps it into a
//! [`ParameterSet`] for as many instances as needed (oscillators, bands,
//! voices...).
//!
//! ```ignore
//! let band = ParameterGroup::new()
//!     .float(0, "Frequency", 20.0, 20000.0, 1000.0, "Hz", 0.3)
//!     .float(1, "Gain", -18.0, 18.0, 0.0, "dB", 1.0)
//!     .bool(2, "Enable", true);
//!
//! // Band 1 at ordinals 10..=12, Band 2 at 13..=15
//! band.instantiate_sequential(&mut set, Id::BandStart, 2, "Band", None)?;
//! ```

use crate::error::{ParameterError, ParameterResult};
use crate::parameter_definition::{
    BoolDefinition, ChoiceDefinition, FloatDefinition, IntDefinition, ParameterDefinition,
};
use crate::parameter_set::ParameterSet;
use crate::types::ParameterId;

/// One group instantiation: where its IDs start and how its names are prefixed.
#[derive(Debug, Clone)]
pub struct GroupInstance<Id> {
    pub base_id: Id,
    pub prefix: String,
}

impl<Id> GroupInstance<Id> {
    pub fn new(base_id: Id, prefix: impl Into<String>) -> Self {
        Self {
            base_id,
            prefix: prefix.into(),
        }
    }
}

/// Member template; the ID is filled in per instance.
#[derive(Debug, Clone)]
enum Member {
    Float {
        name: String,
        min: f64,
        max: f64,
        default: f64,
        unit: String,
        skew: f64,
    },
    Int {
        name: String,
        min: i32,
        max: i32,
        default: i32,
        unit: String,
    },
    Bool {
        name: String,
        default: bool,
    },
    Choice {
        name: String,
        choices: Vec<String>,
        default_index: usize,
    },
}

/// Template for a group of parameters that is instantiated several times.
#[derive(Debug, Clone, Default)]
pub struct ParameterGroup {
    members: Vec<(u32, Member)>,
}

impl ParameterGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a float member at `offset` from the instance base ID.
    #[allow(clippy::too_many_arguments)]
    pub fn float(
        mut self,
        offset: u32,
        name: impl Into<String>,
        min: f64,
        max: f64,
        default: f64,
        unit: impl Into<String>,
        skew: f64,
    ) -> Self {
        self.members.push((
            offset,
            Member::Float {
                name: name.into(),
                min,
                max,
                default,
                unit: unit.into(),
                skew,
            },
        ));
        self
    }

    /// Add an integer member.
    pub fn int(
        mut self,
        offset: u32,
        name: impl Into<String>,
        min: i32,
        max: i32,
        default: i32,
        unit: impl Into<String>,
    ) -> Self {
        self.members.push((
            offset,
            Member::Int {
                name: name.into(),
                min,
                max,
                default,
                unit: unit.into(),
            },
        ));
        self
    }

    /// Add a boolean member.
    pub fn bool(mut self, offset: u32, name: impl Into<String>, default: bool) -> Self {
        self.members.push((
            offset,
            Member::Bool {
                name: name.into(),
                default,
            },
        ));
        self
    }

    /// Add a choice member.
    pub fn choice<I, S>(mut self, offset: u32, name: impl Into<String>, choices: I, default_index: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members.push((
            offset,
            Member::Choice {
                name: name.into(),
                choices: choices.into_iter().map(Into::into).collect(),
                default_index,
            },
        ));
        self
    }

    /// Number of members in the template.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add every member for every instance, in instance order.
    pub fn instantiate<Id: ParameterId>(
        &self,
        set: &mut ParameterSet<Id>,
        instances: &[GroupInstance<Id>],
    ) -> ParameterResult<()> {
        for instance in instances {
            for (offset, member) in &self.members {
                let id = offset_id(instance.base_id, *offset)?;
                set.add(build(id, &instance.prefix, member))?;
            }
        }
        Ok(())
    }

    /// Instantiate `count` times, naming instances `"<prefix> 1"`,
    /// `"<prefix> 2"`, ... and spacing base IDs by `stride`
    /// (default: the member count).
    pub fn instantiate_sequential<Id: ParameterId>(
        &self,
        set: &mut ParameterSet<Id>,
        base_id: Id,
        count: u32,
        prefix: &str,
        stride: Option<u32>,
    ) -> ParameterResult<()> {
        let stride = stride.unwrap_or(self.members.len() as u32);
        let instances = (0..count)
            .map(|i| {
                let base = offset_id(base_id, i * stride)?;
                Ok(GroupInstance::new(base, format!("{} {}", prefix, i + 1)))
            })
            .collect::<ParameterResult<Vec<_>>>()?;
        self.instantiate(set, &instances)
    }
}

fn offset_id<Id: ParameterId>(base: Id, offset: u32) -> ParameterResult<Id> {
    let ordinal = base
        .ordinal()
        .checked_add(offset)
        .ok_or(ParameterError::InvalidGroupOffset(u32::MAX))?;
    Id::from_ordinal(ordinal).ok_or(ParameterError::InvalidGroupOffset(ordinal))
}

fn build<Id: ParameterId>(id: Id, prefix: &str, member: &Member) -> ParameterDefinition<Id> {
    let prefixed = |name: &str| format!("{} {}", prefix, name);
    match member {
        Member::Float {
            name,
            min,
            max,
            default,
            unit,
            skew,
        } => FloatDefinition::new(id, prefixed(name), *min, *max, *default)
            .with_unit(unit.clone())
            .with_skew(*skew)
            .into(),
        Member::Int {
            name,
            min,
            max,
            default,
            unit,
        } => IntDefinition::new(id, prefixed(name), *min, *max, *default)
            .with_unit(unit.clone())
            .into(),
        Member::Bool { name, default } => BoolDefinition::new(id, prefixed(name), *default).into(),
        Member::Choice {
            name,
            choices,
            default_index,
        } => ChoiceDefinition::new(id, prefixed(name), choices.clone(), *default_index).into(),
    }
}
