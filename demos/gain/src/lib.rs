//! Conduit Gain - a smoothed gain stage driven by a parameter manager.
//!
//! This demo shows how to:
//! 1. Declare parameter IDs with `#[derive(ParameterId)]`
//! 2. Build a `ParameterSet` and a `ParameterManager` from it
//! 3. Register per-parameter callbacks that honor the skip-smoothing flag
//! 4. Run the construct -> `sync_all` -> `update()`-per-block lifecycle
//! 5. Defer a heavy change (oversampling) until the input is silent
//!
//! Callbacks run on the audio thread inside `update()`. They hand values to
//! the processor through [`QueuedParameter`] cells, which the processor
//! picks up right after the drain.

use std::sync::Arc;

use conduit::prelude::*;

// =============================================================================
// Parameters
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ParameterId)]
pub enum Id {
    Gain,
    Bypass,
    Oversampling,
}

/// Oversampling factors selectable by the `Oversampling` choice.
pub const OVERSAMPLING_FACTORS: [u32; 3] = [1, 2, 4];

/// Silence threshold for applying an oversampling change.
const SILENCE_DB: f32 = -60.0;

/// Build the gain plugin's parameter schema.
pub fn parameters() -> ParameterResult<ParameterSet<Id>> {
    ParameterSet::new()
        .with(FloatDefinition::new(Id::Gain, "Gain", -60.0, 12.0, 0.0).with_unit("dB"))?
        .with(BoolDefinition::new(Id::Bypass, "Bypass", false).with_labels("Bypassed", "Active"))?
        .with(ChoiceDefinition::new(Id::Oversampling, "Oversampling", ["1x", "2x", "4x"], 0))
}

/// Convert decibels to a linear amplitude multiplier.
///
/// ```text
/// linear = 10^(dB / 20)
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0f64.powf(db / 20.0)
}

/// Mailboxes between the parameter callbacks and the processor.
#[derive(Debug, Default)]
struct Controls {
    gain_db: QueuedParameter<f64>,
    gain_jump: QueuedParameter<bool>,
    bypass: QueuedParameter<bool>,
    oversampling: QueuedParameter<u32>,
}

// =============================================================================
// Processor
// =============================================================================

/// The gain processor.
pub struct GainPlugin {
    manager: ParameterManager<Id>,
    controls: Arc<Controls>,
    gain: Smoother,
    bypassed: bool,
    oversampling: u32,
}

impl GainPlugin {
    /// Build the processor and register its callbacks.
    pub fn new() -> ParameterResult<Self> {
        let mut manager = ParameterManager::new(&parameters()?);
        let controls = Arc::new(Controls::default());

        let c = Arc::clone(&controls);
        manager.on(Id::Gain, move |db, skip| {
            c.gain_db.set(db);
            if skip {
                c.gain_jump.set(true);
            }
        })?;

        let c = Arc::clone(&controls);
        manager.on(Id::Bypass, move |value, _| c.bypass.set(value >= 0.5))?;

        let c = Arc::clone(&controls);
        manager.on(Id::Oversampling, move |index, _| {
            let factor = OVERSAMPLING_FACTORS[(index as usize).min(OVERSAMPLING_FACTORS.len() - 1)];
            c.oversampling.set(factor);
        })?;

        Ok(Self {
            manager,
            controls,
            gain: Smoother::new(SmoothingStyle::Linear(20.0)),
            bypassed: false,
            oversampling: OVERSAMPLING_FACTORS[0],
        })
    }

    /// Control-thread handle for UI and host writes.
    pub fn controller(&self) -> ParameterController<Id> {
        self.manager.controller()
    }

    /// Prepare for playback: configure the smoother and push every current
    /// value without ramps.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.gain.set_sample_rate(sample_rate);
        self.manager.sync_all(true);
        self.apply_controls(&[]);
        log::debug!(
            "gain prepared at {} Hz, gain {:.2}, oversampling {}x",
            sample_rate,
            self.gain.target(),
            self.oversampling
        );
    }

    /// Process one block in place.
    pub fn process(&mut self, buffer: &mut [f32]) {
        self.manager.update();
        self.apply_controls(buffer);

        if self.bypassed {
            return;
        }
        self.gain.apply_gain(buffer);
    }

    /// Serialize the parameter state.
    pub fn save_state(&self) -> ParameterResult<Vec<u8>> {
        self.manager.save_state()
    }

    /// Restore the parameter state. Values apply without ramps.
    pub fn load_state(&mut self, data: &[u8]) -> ParameterResult<()> {
        self.manager.load_state(data)?;
        self.apply_controls(&[]);
        Ok(())
    }

    /// Current linear gain (smoothed).
    pub fn current_gain(&self) -> f64 {
        self.gain.current()
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    pub fn oversampling(&self) -> u32 {
        self.oversampling
    }

    /// Apply values the callbacks left in the mailboxes. `input` decides
    /// whether an oversampling change may land now.
    fn apply_controls(&mut self, input: &[f32]) {
        if let Some(db) = self.controls.gain_db.take() {
            let skip = self.controls.gain_jump.take().unwrap_or(false);
            self.gain.set_value(db_to_linear(db), skip);
        }
        if let Some(bypass) = self.controls.bypass.take() {
            self.bypassed = bypass;
        }
        if let Some(factor) = self.controls.oversampling.take_if_silent(input, SILENCE_DB) {
            self.oversampling = factor;
        }
    }
}

impl std::fmt::Debug for GainPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GainPlugin")
            .field("manager", &self.manager)
            .field("gain", &self.gain.current())
            .field("bypassed", &self.bypassed)
            .field("oversampling", &self.oversampling)
            .finish()
    }
}
