//! # conduit-core
//!
//! Core of the Conduit parameter framework: typed parameter schemas, a
//! host-facing parameter store, and a lock-free bridge that delivers
//! parameter changes from control threads to the real-time audio thread.
//!
//! ## Main Types
//!
//! - [`ParameterSet`] - Ordered schema of parameter definitions
//! - [`ParameterGroup`] - Template for repeated parameter groups
//! - [`ParameterStore`] - Keyed normalized-value store (host interface)
//! - [`AtomicParameterStore`] - Default lock-free store
//! - [`ParameterManager`] - Audio-side callback table and queue drain
//! - [`ParameterController`] - Control-thread handle for reads and writes
//! - [`QueuedParameter`] - Deferred changes applied at a safe point
//! - [`Smoother`] - Ramping for DSP collaborators
//! - [`ParameterError`] - Error types

pub mod change_queue;
pub mod config;
pub mod error;
pub mod manager;
pub mod parameter_definition;
pub mod parameter_format;
pub mod parameter_group;
pub mod parameter_range;
pub mod parameter_set;
pub mod parameter_store;
pub mod parameter_types;
pub mod queued_parameter;
pub mod smoothing;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use change_queue::{change_queue, ChangeReceiver, ChangeRecord, ChangeSender, DEFAULT_QUEUE_CAPACITY};
pub use config::ManagerConfig;
pub use error::{ParameterError, ParameterResult};
pub use manager::{ManagerState, ParameterCallback, ParameterController, ParameterManager};
pub use parameter_definition::{
    BoolDefinition, ChoiceDefinition, FloatDefinition, IntDefinition, ParameterDefinition,
    ParameterKind, DEFAULT_FLOAT_INTERVAL,
};
pub use parameter_format::ParameterFormat;
pub use parameter_group::{GroupInstance, ParameterGroup};
pub use parameter_range::{LinearMapper, PowerMapper, RangeMapper, SteppedMapper};
pub use parameter_set::ParameterSet;
pub use parameter_store::{
    AtomicParameterStore, ListenerId, ParameterLayout, ParameterListener, ParameterStore,
};
pub use parameter_types::StoreParameter;
pub use queued_parameter::{QueueableValue, QueuedParameter};
pub use smoothing::{Smoother, SmoothingStyle};
pub use state::{StateDocument, StateEntry, DEFAULT_STATE_TAG, STATE_VERSION};
pub use types::{parameter_key, parse_key, ParameterId, ParameterValue, PARAMETER_KEY_PREFIX};
