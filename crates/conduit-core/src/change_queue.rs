//! Lock-free single-producer/single-consumer queue of parameter changes.
//!
//! The queue moves [`ChangeRecord`]s from the control side (store
//! notifications, `set_value`) to the audio thread. It is a fixed-capacity
//! ring buffer from the `ringbuf` crate: the producer publishes its write
//! index with release ordering and the consumer reads it with acquire
//! ordering, so a record is never observed before its contents.
//!
//! Neither side blocks or allocates after construction. A write against a
//! full queue is dropped and counted; the queue stays usable.
//!
//! ```ignore
//! let (mut tx, mut rx) = change_queue::<ChangeRecord<u32>>(128);
//! tx.push(ChangeRecord::new(0, 10.0));
//! tx.push(ChangeRecord::new(1, 4.0));
//!
//! // audio thread
//! let delivered = rx.drain(|record| println!("{:?}", record));
//! assert_eq!(delivered, 2);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::types::ParameterValue;

/// Default queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Snapshot of one parameter's native value at write time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeRecord<Id> {
    pub id: Id,
    pub value: ParameterValue,
}

impl<Id> ChangeRecord<Id> {
    pub fn new(id: Id, value: ParameterValue) -> Self {
        Self { id, value }
    }
}

/// Create a queue holding up to `capacity` records (at least one).
pub fn change_queue<T: Copy + Send>(capacity: usize) -> (ChangeSender<T>, ChangeReceiver<T>) {
    let (producer, consumer) = HeapRb::<T>::new(capacity.max(1)).split();
    let dropped = Arc::new(AtomicU64::new(0));

    (
        ChangeSender {
            producer,
            dropped: Arc::clone(&dropped),
        },
        ChangeReceiver { consumer, dropped },
    )
}

/// Producer half. Exactly one thread may push at a time; wrap it in a
/// mutex to share it between control threads.
pub struct ChangeSender<T> {
    producer: HeapProd<T>,
    dropped: Arc<AtomicU64>,
}

impl<T: Copy> ChangeSender<T> {
    /// Push one record. Returns `false` (and counts a drop) if the queue
    /// is full.
    pub fn push(&mut self, record: T) -> bool {
        if self.producer.try_push(record).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Push as many records as fit, in order, with one commit.
    ///
    /// Returns the number accepted; the rest are counted as dropped.
    pub fn push_slice(&mut self, records: &[T]) -> usize {
        let accepted = self.producer.push_slice(records);
        let rejected = records.len() - accepted;
        if rejected > 0 {
            self.dropped.fetch_add(rejected as u64, Ordering::Relaxed);
        }
        accepted
    }

    /// Free slots.
    pub fn vacant(&self) -> usize {
        self.producer.vacant_len()
    }

    pub fn capacity(&self) -> usize {
        self.producer.capacity().get()
    }

    /// Total records dropped since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Shared handle to the drop counter, readable without access to the
    /// sender.
    pub fn drop_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

/// Consumer half, owned by the audio thread.
pub struct ChangeReceiver<T> {
    consumer: HeapCons<T>,
    dropped: Arc<AtomicU64>,
}

impl<T: Copy> ChangeReceiver<T> {
    /// Visit every record that was committed when the call started, in
    /// FIFO order, then release their slots at once.
    ///
    /// Returns the number of records visited. Real-time safe: no locks, no
    /// allocation, bounded by the capacity.
    #[inline]
    pub fn drain(&mut self, mut f: impl FnMut(T)) -> usize {
        let ready = self.consumer.occupied_len();
        if ready == 0 {
            return 0;
        }

        let mut visited = 0;
        {
            // Ring storage may wrap: two contiguous spans
            let (head, tail) = self.consumer.as_slices();
            for record in head.iter().chain(tail.iter()).take(ready) {
                f(*record);
                visited += 1;
            }
        }

        self.consumer.skip(visited)
    }

    /// Records waiting to be drained.
    pub fn pending(&self) -> usize {
        self.consumer.occupied_len()
    }

    /// Total records dropped by the sender since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> std::fmt::Debug for ChangeSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSender")
            .field("vacant", &self.producer.vacant_len())
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> std::fmt::Debug for ChangeReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeReceiver")
            .field("pending", &self.consumer.occupied_len())
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish()
    }
}
