//! Ordered, ID-indexed collection of parameter definitions.

use std::collections::HashMap;

use crate::error::{ParameterError, ParameterResult};
use crate::parameter_definition::ParameterDefinition;
use crate::types::ParameterId;

/// The canonical parameter schema of one plugin instance.
///
/// Definitions keep their insertion order, which is also the order the
/// store lays out its parameters and the order [`iter`](Self::iter) yields.
///
/// A set is built once during plugin construction and is read-only
/// afterwards, so it needs no synchronization.
#[derive(Debug, Clone)]
pub struct ParameterSet<Id: ParameterId> {
    definitions: Vec<ParameterDefinition<Id>>,
    index: HashMap<Id, usize>,
}

impl<Id: ParameterId> Default for ParameterSet<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: ParameterId> ParameterSet<Id> {
    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Append a definition.
    ///
    /// Invalid definitions are rejected. Adding an ID that is already
    /// present appends the new definition and points the ID at it; the
    /// earlier entry stays in [`iter`](Self::iter) order but can no longer be
    /// looked up. Use [`try_add`](Self::try_add) to reject duplicates.
    pub fn add(&mut self, definition: impl Into<ParameterDefinition<Id>>) -> ParameterResult<()> {
        let definition = definition.into();
        definition.validate()?;

        let id = definition.id();
        if self.index.contains_key(&id) {
            log::warn!(
                "parameter {:?} ('{}') added twice, later definition wins lookups",
                id,
                definition.name()
            );
        }

        self.definitions.push(definition);
        self.index.insert(id, self.definitions.len() - 1);
        Ok(())
    }

    /// Append a definition, failing if its ID is already present.
    pub fn try_add(&mut self, definition: impl Into<ParameterDefinition<Id>>) -> ParameterResult<()> {
        let definition = definition.into();
        if self.index.contains_key(&definition.id()) {
            return Err(ParameterError::DuplicateId(format!("{:?}", definition.id())));
        }
        self.add(definition)
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, definition: impl Into<ParameterDefinition<Id>>) -> ParameterResult<Self> {
        self.add(definition)?;
        Ok(self)
    }

    /// Look up a definition by ID.
    pub fn get(&self, id: Id) -> ParameterResult<&ParameterDefinition<Id>> {
        self.index
            .get(&id)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| ParameterError::NotFound(format!("{:?}", id)))
    }

    /// Whether a definition with this ID was added.
    pub fn has(&self, id: Id) -> bool {
        self.index.contains_key(&id)
    }

    /// All definitions in insertion order.
    pub fn all(&self) -> &[ParameterDefinition<Id>] {
        &self.definitions
    }

    /// Iterate definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterDefinition<Id>> + '_ {
        self.definitions.iter()
    }

    /// Iterate the IDs that resolve through [`get`](Self::get), in insertion
    /// order of their winning definition.
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.definitions
            .iter()
            .enumerate()
            .filter(|(i, d)| self.index.get(&d.id()) == Some(i))
            .map(|(_, d)| d.id())
    }

    /// Number of definitions (the number of successful `add` calls).
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
