//! Parameter manager configuration.
//!
//! # Example
//!
//! ```ignore
//! use conduit_core::ManagerConfig;
//!
//! pub static CONFIG: ManagerConfig = ManagerConfig::new()
//!     .with_queue_capacity(256)
//!     .with_state_tag("CompressorState");
//! ```

use crate::change_queue::DEFAULT_QUEUE_CAPACITY;
use crate::state::DEFAULT_STATE_TAG;

/// Settings for a [`ParameterManager`](crate::ParameterManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Change queue capacity in records.
    pub queue_capacity: usize,

    /// Whether `set_value` enqueues the new value itself in addition to the
    /// store notification. When on, every `set_value` produces two change
    /// records for one write.
    pub redundant_enqueue: bool,

    /// Root tag of the persisted state document.
    pub state_tag: &'static str,
}

impl ManagerConfig {
    /// Default configuration: 128 records, redundant enqueue on,
    /// `"Parameters"` state tag.
    pub const fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            redundant_enqueue: true,
            state_tag: DEFAULT_STATE_TAG,
        }
    }

    /// Set the change queue capacity.
    pub const fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Enable or disable the explicit enqueue in `set_value`.
    pub const fn with_redundant_enqueue(mut self, enabled: bool) -> Self {
        self.redundant_enqueue = enabled;
        self
    }

    /// Set the state document's root tag.
    pub const fn with_state_tag(mut self, tag: &'static str) -> Self {
        self.state_tag = tag;
        self
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}
