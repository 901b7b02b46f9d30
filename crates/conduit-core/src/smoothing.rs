//! Value smoothing for DSP collaborators.
//!
//! Parameter callbacks deliver `(native_value, skip_smoothing)`. A DSP
//! object typically forwards both straight into a [`Smoother`]:
//!
//! ```ignore
//! let mut gain = Smoother::new(SmoothingStyle::Linear(20.0));
//! gain.set_sample_rate(48000.0);
//!
//! manager.on(Id::Gain, move |db, skip| gain.set_value(db, skip));
//! ```
//!
//! `skip = true` (state load, `sync_all`) jumps to the value; `skip = false`
//! (regular `update()` changes) ramps toward it.
//!
//! `Smoother` needs `&mut self` to advance and lives on the audio thread.

/// Below this distance the smoother lands on its target.
const SETTLE_THRESHOLD: f64 = 1e-8;

/// Smoothing curve. The `f64` is the smoothing time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SmoothingStyle {
    /// Jump straight to every new value.
    #[default]
    None,

    /// Constant-rate ramp that lands on the target after the given time.
    Linear(f64),

    /// One-pole lowpass; the given time is the time constant (~63%).
    Exponential(f64),
}

/// Per-sample value smoother.
#[derive(Debug, Clone)]
pub struct Smoother {
    style: SmoothingStyle,
    sample_rate: f64,
    current: f64,
    target: f64,
    /// Exponential: pole coefficient
    coefficient: f64,
    /// Linear: increment per sample
    increment: f64,
    /// Linear: samples left in the ramp
    remaining: u32,
}

impl Smoother {
    /// Create a smoother. Call [`set_sample_rate`](Self::set_sample_rate)
    /// before processing.
    pub fn new(style: SmoothingStyle) -> Self {
        Self {
            style,
            sample_rate: 0.0,
            current: 0.0,
            target: 0.0,
            coefficient: 1.0,
            increment: 0.0,
            remaining: 0,
        }
    }

    pub fn style(&self) -> SmoothingStyle {
        self.style
    }

    /// Set the sample rate and recompute the exponential coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.coefficient = match self.style {
            SmoothingStyle::Exponential(ms) if sample_rate > 0.0 && ms > 0.0 => {
                1.0 - (-1000.0 / (ms * sample_rate)).exp()
            }
            _ => 1.0,
        };
    }

    /// Callback-shaped entry point: jump when `skip` is set, ramp otherwise.
    pub fn set_value(&mut self, value: f64, skip: bool) {
        if skip {
            self.reset(value);
        } else {
            self.set_target(value);
        }
    }

    /// Start moving toward `target`.
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
        match self.style {
            SmoothingStyle::None => self.current = target,
            SmoothingStyle::Linear(ms) => {
                let samples = ((ms * self.sample_rate / 1000.0) as u32).max(1);
                self.remaining = samples;
                self.increment = (target - self.current) / samples as f64;
            }
            SmoothingStyle::Exponential(_) => {}
        }
    }

    /// Jump to `value` with no ramp.
    pub fn reset(&mut self, value: f64) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.remaining = 0;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next(&mut self) -> f64 {
        match self.style {
            SmoothingStyle::None => self.current = self.target,
            SmoothingStyle::Linear(_) => {
                if self.remaining > 0 {
                    self.remaining -= 1;
                    self.current = if self.remaining == 0 {
                        self.target
                    } else {
                        self.current + self.increment
                    };
                }
            }
            SmoothingStyle::Exponential(_) => {
                self.current += self.coefficient * (self.target - self.current);
                if (self.current - self.target).abs() < SETTLE_THRESHOLD {
                    self.current = self.target;
                }
            }
        }
        self.current
    }

    /// Advance `samples` samples without producing output.
    pub fn skip(&mut self, samples: usize) {
        match self.style {
            SmoothingStyle::None => self.current = self.target,
            SmoothingStyle::Linear(_) => {
                let n = (samples.min(u32::MAX as usize) as u32).min(self.remaining);
                self.remaining -= n;
                self.current = if self.remaining == 0 {
                    self.target
                } else {
                    self.current + self.increment * n as f64
                };
            }
            SmoothingStyle::Exponential(_) => {
                let decay = (1.0 - self.coefficient).powi(samples.min(i32::MAX as usize) as i32);
                self.current = self.target + (self.current - self.target) * decay;
                if (self.current - self.target).abs() < SETTLE_THRESHOLD {
                    self.current = self.target;
                }
            }
        }
    }

    /// Multiply a buffer by the smoothed value, sample by sample.
    pub fn apply_gain(&mut self, buffer: &mut [f32]) {
        if !self.is_smoothing() {
            let gain = self.current as f32;
            buffer.iter_mut().for_each(|s| *s *= gain);
            return;
        }
        for sample in buffer.iter_mut() {
            *sample *= self.next() as f32;
        }
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Whether a ramp is in progress.
    #[inline]
    pub fn is_smoothing(&self) -> bool {
        match self.style {
            SmoothingStyle::None => false,
            SmoothingStyle::Linear(_) => self.remaining > 0,
            SmoothingStyle::Exponential(_) => self.current != self.target,
        }
    }
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(SmoothingStyle::None)
    }
}
