//! Persisted parameter state.
//!
//! The store serializes its values as a small JSON document:
//!
//! ```json
//! {
//!   "tag": "Parameters",
//!   "version": 1,
//!   "parameters": [
//!     { "id": "param_0", "value": -10.0, "normalized": 0.8333333333333334 },
//!     { "id": "param_1", "value": 4.0 }
//!   ]
//! }
//! ```
//!
//! Values are native (Hz, dB, index...), so a blob stays readable and
//! survives changes to a parameter's skew or interval. The store also
//! writes the normalized value it held; on load that value is used as is
//! when it still maps to the saved native value, so a round trip is exact.

use serde::{Deserialize, Serialize};

use crate::error::{ParameterError, ParameterResult};
use crate::types::ParameterValue;

/// Current document version.
pub const STATE_VERSION: u32 = 1;

/// Default root tag of the state document.
pub const DEFAULT_STATE_TAG: &str = "Parameters";

/// One saved parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
    /// Store key (`"param_<ordinal>"`)
    pub id: String,
    /// Native value
    pub value: ParameterValue,
    /// Normalized value as stored, for a bit-exact restore. Optional so
    /// native-only documents still load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized: Option<ParameterValue>,
}

/// The persisted state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDocument {
    pub tag: String,
    pub version: u32,
    pub parameters: Vec<StateEntry>,
}

impl StateDocument {
    /// Create an empty document with the given root tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            version: STATE_VERSION,
            parameters: Vec::new(),
        }
    }

    /// Append a native value.
    pub fn push(&mut self, id: impl Into<String>, value: ParameterValue) {
        self.parameters.push(StateEntry {
            id: id.into(),
            value,
            normalized: None,
        });
    }

    /// Append a native value together with the normalized value it came
    /// from.
    pub fn push_exact(&mut self, id: impl Into<String>, value: ParameterValue, normalized: ParameterValue) {
        self.parameters.push(StateEntry {
            id: id.into(),
            value,
            normalized: Some(normalized),
        });
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> ParameterResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse and validate a blob.
    ///
    /// Fails on malformed JSON, a root tag other than `expected_tag`, a
    /// version newer than [`STATE_VERSION`], or a non-finite value.
    pub fn from_bytes(bytes: &[u8], expected_tag: &str) -> ParameterResult<Self> {
        if bytes.is_empty() {
            return Err(ParameterError::State("empty state blob".to_string()));
        }

        let document: Self = serde_json::from_slice(bytes)?;

        if document.tag != expected_tag {
            return Err(ParameterError::State(format!(
                "expected root tag '{}', found '{}'",
                expected_tag, document.tag
            )));
        }
        if document.version > STATE_VERSION {
            return Err(ParameterError::State(format!(
                "unsupported state version {} (newest known is {})",
                document.version, STATE_VERSION
            )));
        }
        if let Some(entry) = document
            .parameters
            .iter()
            .find(|e| !e.value.is_finite() || e.normalized.is_some_and(|n| !n.is_finite()))
        {
            return Err(ParameterError::State(format!(
                "non-finite value for '{}'",
                entry.id
            )));
        }

        Ok(document)
    }
}
