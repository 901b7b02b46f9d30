//! # Conduit
//!
//! Lock-free parameter management for Rust audio plugins.
//!
//! Conduit keeps a plugin's parameters in a host-facing store and delivers
//! every change to the real-time audio thread through a bounded lock-free
//! queue, as per-parameter callbacks.
//!
//! ## Architecture
//!
//! ```text
//! UI / host thread                          audio thread
//!   ParameterController::set_value            ParameterManager::update
//!          |                                         ^
//!          v                                         |
//!   ParameterStore --listener--> ChangeSender ==> ChangeReceiver --> callback(value, skip)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conduit::prelude::*;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ParameterId)]
//! enum Id {
//!     Gain,
//!     Bypass,
//! }
//!
//! let mut set = ParameterSet::new();
//! set.add(FloatDefinition::new(Id::Gain, "Gain", -60.0, 12.0, 0.0).with_unit("dB"))?;
//! set.add(BoolDefinition::new(Id::Bypass, "Bypass", false))?;
//!
//! let mut manager = ParameterManager::new(&set);
//! manager.on(Id::Gain, move |db, skip| smoother.set_value(db, skip))?;
//! manager.sync_all(true);
//!
//! // audio thread, every block
//! manager.update();
//! ```

// Re-export sub-crates
pub use conduit_core as core;

// Re-export derive macros when feature is enabled
#[cfg(feature = "derive")]
pub use conduit_macros::ParameterId;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    pub use conduit_core::{
        // Schema
        BoolDefinition, ChoiceDefinition, FloatDefinition, GroupInstance, IntDefinition,
        ParameterDefinition, ParameterGroup, ParameterId, ParameterKind, ParameterSet,
        // Store
        AtomicParameterStore, ParameterListener, ParameterStore,
        // Manager
        ManagerConfig, ManagerState, ParameterController, ParameterManager,
        // DSP helpers
        QueuedParameter, Smoother, SmoothingStyle,
        // Errors
        ParameterError, ParameterResult,
        // Values
        ParameterValue,
    };

    #[cfg(feature = "derive")]
    pub use conduit_macros::ParameterId;
}
