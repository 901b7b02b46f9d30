//! Deferred parameter changes.
//!
//! Some parameter changes cannot be applied mid-stream: switching an
//! oversampling factor reallocates filters, changing a delay line's maximum
//! length reallocates its buffer. A [`QueuedParameter`] holds the latest
//! requested value until the audio thread reaches a point where applying it
//! is safe.
//!
//! ```ignore
//! let factor = Arc::new(QueuedParameter::<u32>::new());
//!
//! // parameter callback
//! let pending = Arc::clone(&factor);
//! manager.on(Id::Oversampling, move |value, _| pending.set(value as u32));
//!
//! // audio thread, start of the block
//! if let Some(new_factor) = factor.take_if_silent(input, -60.0) {
//!     oversampler.set_factor(new_factor);
//! }
//! ```
//!
//! Only the latest value is kept. All operations are lock-free.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Value types a [`QueuedParameter`] can hold.
pub trait QueueableValue: Copy + Send + Sync + 'static {
    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}

impl QueueableValue for f32 {
    fn to_bits(self) -> u64 {
        f32::to_bits(self) as u64
    }

    fn from_bits(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl QueueableValue for f64 {
    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

impl QueueableValue for i32 {
    fn to_bits(self) -> u64 {
        self as u32 as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits as u32 as i32
    }
}

impl QueueableValue for u32 {
    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits as u32
    }
}

impl QueueableValue for bool {
    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits != 0
    }
}

/// Latest-value mailbox between a control thread and the audio thread.
///
/// `set` may be called from any thread. The `take*` family belongs to one
/// consumer (the audio thread). A `set` racing a take is never lost: it
/// either is the value taken or stays pending for the next call.
#[derive(Debug)]
pub struct QueuedParameter<T: QueueableValue> {
    value: AtomicU64,
    pending: AtomicBool,
    /// Bumped by every `set`
    generation: AtomicU32,
    /// Consumer side: generation the countdown was armed for
    armed_generation: AtomicU32,
    /// Consumer side: blocks left, 0 when idle
    blocks_remaining: AtomicU32,
    _marker: PhantomData<T>,
}

impl<T: QueueableValue> Default for QueuedParameter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: QueueableValue> QueuedParameter<T> {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
            pending: AtomicBool::new(false),
            generation: AtomicU32::new(0),
            armed_generation: AtomicU32::new(0),
            blocks_remaining: AtomicU32::new(0),
            _marker: PhantomData,
        }
    }

    /// Queue a value, replacing any pending one. Restarts a running
    /// [`take_after_blocks`](Self::take_after_blocks) countdown.
    pub fn set(&self, value: T) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Relaxed);
        self.pending.store(true, Ordering::Release);
    }

    /// Whether a value is waiting.
    pub fn has_pending_change(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// The pending value, left in place.
    pub fn get(&self) -> Option<T> {
        if self.has_pending_change() {
            Some(T::from_bits(self.value.load(Ordering::Relaxed)))
        } else {
            None
        }
    }

    /// The pending value, cleared.
    pub fn take(&self) -> Option<T> {
        // Claim the flag before reading: a later `set` re-arms it
        if !self.pending.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.blocks_remaining.store(0, Ordering::Relaxed);
        Some(T::from_bits(self.value.load(Ordering::Relaxed)))
    }

    /// Drop any pending value.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Call once per block. The first call after a `set` starts a countdown
    /// of `blocks`; the value is returned (and cleared) when it runs out.
    pub fn take_after_blocks(&self, blocks: u32) -> Option<T> {
        if !self.has_pending_change() {
            return None;
        }

        let generation = self.generation.load(Ordering::Acquire);
        let remaining = self.blocks_remaining.load(Ordering::Relaxed);
        if remaining == 0 || generation != self.armed_generation.load(Ordering::Relaxed) {
            if blocks == 0 {
                return self.take_generation(generation);
            }
            self.armed_generation.store(generation, Ordering::Relaxed);
            self.blocks_remaining.store(blocks, Ordering::Relaxed);
            return None;
        }

        if remaining > 1 {
            self.blocks_remaining.store(remaining - 1, Ordering::Relaxed);
            return None;
        }
        self.take_generation(generation)
    }

    /// Take the pending value once the peak of `samples` is below
    /// `threshold_db`.
    pub fn take_if_silent(&self, samples: &[f32], threshold_db: f32) -> Option<T> {
        self.take_if(|| {
            let peak = samples.iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
            peak < 10.0f32.powf(threshold_db / 20.0)
        })
    }

    /// Take the pending value once `condition` returns true. The condition
    /// is only evaluated while a value is pending.
    pub fn take_if(&self, condition: impl FnOnce() -> bool) -> Option<T> {
        if !self.has_pending_change() || !condition() {
            return None;
        }
        self.take()
    }

    /// Take the value of `generation`. If a newer `set` slipped in, it
    /// stays pending and its own countdown starts on the next call.
    fn take_generation(&self, generation: u32) -> Option<T> {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return None;
        }
        let bits = self.value.load(Ordering::Relaxed);
        self.blocks_remaining.store(0, Ordering::Relaxed);

        if self.generation.load(Ordering::Acquire) != generation {
            self.pending.store(true, Ordering::Release);
            return None;
        }
        Some(T::from_bits(bits))
    }
}
