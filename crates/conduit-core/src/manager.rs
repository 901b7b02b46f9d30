//! Parameter manager: the bridge between the parameter store and the DSP.
//!
//! The manager builds a [`ParameterStore`] from a [`ParameterSet`],
//! subscribes to its change notifications and forwards every change through
//! a lock-free [`change_queue`] to per-parameter callbacks that run on the
//! audio thread.
//!
//! # Threading
//!
//! The work is split over two types:
//!
//! - [`ParameterManager`] is owned by the audio side. It holds the callback
//!   table and the queue's consumer. [`update`](ParameterManager::update)
//!   drains the queue once per block without locking or allocating.
//!   Operations that invoke callbacks outside the queue (`on`, `sync_all`,
//!   `load_state`) take `&mut self`, so they cannot overlap `update()`.
//! - [`ParameterController`] is a cloneable `Send + Sync` handle for
//!   control threads (UI, host callbacks). It reads and writes the store.
//!   Its writes reach the audio side only through the queue.
//!
//! Producers are serialized by a mutex around the queue's sender, which is
//! only ever taken on the control side.
//!
//! # Lifecycle
//!
//! ```text
//! Constructed --sync_all--> Prepared --update--> Processing --release/drop--> Released
//! ```
//!
//! # Example
//!
//! ```ignore
//! let mut manager = ParameterManager::new(&set);
//! manager.on(Id::Gain, move |db, skip| gain.set_value(db, skip))?;
//!
//! let controller = manager.controller();
//! // UI thread
//! controller.set_value(Id::Gain, 0.75)?;
//!
//! // audio thread, start of every block
//! manager.update();
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::change_queue::{change_queue, ChangeReceiver, ChangeRecord, ChangeSender};
use crate::config::ManagerConfig;
use crate::error::{ParameterError, ParameterResult};
use crate::parameter_set::ParameterSet;
use crate::parameter_store::{AtomicParameterStore, ListenerId, ParameterLayout, ParameterListener, ParameterStore};
use crate::types::{ParameterId, ParameterValue};

/// Per-parameter DSP callback: `(native_value, skip_smoothing)`.
pub type ParameterCallback = Box<dyn FnMut(ParameterValue, bool) + Send>;

/// Lifecycle of a [`ParameterManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Built, callbacks may be registered.
    Constructed,
    /// `sync_all` has pushed current values to every callback.
    Prepared,
    /// `update` is being called per block.
    Processing,
    /// Store listeners removed; no more changes arrive.
    Released,
}

/// State shared between the manager, its controllers and its listener.
struct Shared<Id: ParameterId, S> {
    store: Arc<S>,
    keys: HashMap<Id, String>,
    ids: HashMap<String, Id>,
    sender: Mutex<ChangeSender<ChangeRecord<Id>>>,
    dropped: Arc<AtomicU64>,
    config: ManagerConfig,
}

impl<Id: ParameterId, S: ParameterStore> Shared<Id, S> {
    fn key(&self, id: Id) -> ParameterResult<&str> {
        self.keys
            .get(&id)
            .map(String::as_str)
            .ok_or_else(|| ParameterError::UnknownParameter(format!("{:?}", id)))
    }

    fn enqueue(&self, id: Id, value: ParameterValue) {
        let mut sender = self.sender.lock();
        if !sender.push(ChangeRecord::new(id, value)) {
            log::warn!(
                "change queue full, dropped {:?} = {} ({} dropped so far)",
                id,
                value,
                sender.dropped()
            );
        }
    }

    fn get_value(&self, id: Id) -> ParameterResult<ParameterValue> {
        self.store.get_normalized(self.key(id)?)
    }

    fn get_native_value(&self, id: Id) -> ParameterResult<ParameterValue> {
        let key = self.key(id)?;
        let normalized = self.store.get_normalized(key)?;
        self.store.normalized_to_native(key, normalized)
    }

    fn set_value(&self, id: Id, normalized: ParameterValue) -> ParameterResult<()> {
        let key = self.key(id)?;
        self.store.set_normalized_notifying_host(key, normalized)?;
        if self.config.redundant_enqueue {
            let native = self.get_native_value(id)?;
            self.enqueue(id, native);
        }
        Ok(())
    }

    fn save_state(&self) -> ParameterResult<Vec<u8>> {
        self.store.save_state(self.config.state_tag)
    }

    fn dropped_changes(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Store listener turning notifications into change records.
///
/// Holds the shared state weakly: the store owns the listener, the shared
/// state owns the store.
struct QueueListener<Id: ParameterId, S> {
    shared: Weak<Shared<Id, S>>,
}

impl<Id: ParameterId, S: ParameterStore> ParameterListener for QueueListener<Id, S> {
    fn parameter_changed(&self, key: &str, normalized: ParameterValue) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let Some(&id) = shared.ids.get(key) else {
            return;
        };
        match shared.store.normalized_to_native(key, normalized) {
            Ok(native) => shared.enqueue(id, native),
            Err(err) => log::warn!("dropping change for '{}': {}", key, err),
        }
    }
}

/// Audio-side owner of the callback table and the change queue consumer.
pub struct ParameterManager<Id: ParameterId, S: ParameterStore + 'static = AtomicParameterStore> {
    shared: Arc<Shared<Id, S>>,
    receiver: ChangeReceiver<ChangeRecord<Id>>,
    callbacks: BTreeMap<Id, ParameterCallback>,
    listeners: Vec<ListenerId>,
    state: ManagerState,
}

impl<Id: ParameterId> ParameterManager<Id, AtomicParameterStore> {
    /// Build a manager over a fresh [`AtomicParameterStore`] with the
    /// default configuration.
    pub fn new(set: &ParameterSet<Id>) -> Self {
        Self::with_config(set, ManagerConfig::new())
    }

    /// Build a manager over a fresh [`AtomicParameterStore`].
    pub fn with_config(set: &ParameterSet<Id>, config: ManagerConfig) -> Self {
        Self::with_store(set, config)
    }
}

impl<Id: ParameterId, S: ParameterStore + 'static> ParameterManager<Id, S> {
    /// Build a manager over a fresh store of type `S`.
    pub fn with_store(set: &ParameterSet<Id>, config: ManagerConfig) -> Self {
        let store = Arc::new(S::from_layout(ParameterLayout::from_set(set)));
        Self::from_store(store, set, config)
    }

    /// Build a manager over an existing store.
    ///
    /// IDs of `set` whose key the store does not know are left out and
    /// logged.
    pub fn from_store(store: Arc<S>, set: &ParameterSet<Id>, config: ManagerConfig) -> Self {
        let mut keys = HashMap::with_capacity(set.len());
        let mut ids = HashMap::with_capacity(set.len());
        for id in set.ids() {
            let key = id.key();
            if !store.contains(&key) {
                log::warn!("store has no parameter '{}' for {:?}, skipping", key, id);
                continue;
            }
            ids.insert(key.clone(), id);
            keys.insert(id, key);
        }

        let (sender, receiver) = change_queue(config.queue_capacity);
        let shared = Arc::new(Shared {
            store,
            keys,
            ids,
            dropped: sender.drop_counter(),
            sender: Mutex::new(sender),
            config,
        });

        let listener: Arc<dyn ParameterListener> = Arc::new(QueueListener {
            shared: Arc::downgrade(&shared),
        });
        let listeners = set
            .ids()
            .filter_map(|id| shared.keys.get(&id))
            .map(|key| shared.store.add_listener(key, Arc::clone(&listener)))
            .collect::<Vec<_>>();

        log::debug!(
            "parameter manager ready: {} parameters, queue capacity {}",
            shared.keys.len(),
            config.queue_capacity
        );

        Self {
            shared,
            receiver,
            callbacks: BTreeMap::new(),
            listeners,
            state: ManagerState::Constructed,
        }
    }

    /// Register (or replace) the callback for `id`.
    ///
    /// Setup-time only; the `&mut self` receiver keeps it off the audio
    /// thread while `update()` may run.
    pub fn on<F>(&mut self, id: Id, callback: F) -> ParameterResult<()>
    where
        F: FnMut(ParameterValue, bool) + Send + 'static,
    {
        self.shared.key(id)?;
        self.callbacks.insert(id, Box::new(callback));
        Ok(())
    }

    /// Whether a callback is registered for `id`.
    pub fn has_callback(&self, id: Id) -> bool {
        self.callbacks.contains_key(&id)
    }

    /// Deliver queued changes to their callbacks with `skip_smoothing = false`.
    ///
    /// Call once per processing block, before any DSP reading the values.
    /// Changes for IDs with no callback are consumed silently. Returns the
    /// number of changes drained.
    ///
    /// Real-time safe: no locks, no allocation, no logging.
    pub fn update(&mut self) -> usize {
        if self.state != ManagerState::Released {
            self.state = ManagerState::Processing;
        }

        let callbacks = &mut self.callbacks;
        self.receiver.drain(|record| {
            if let Some(callback) = callbacks.get_mut(&record.id) {
                callback(record.value, false);
            }
        })
    }

    /// Call every registered callback once with its parameter's current
    /// native value, bypassing the queue.
    pub fn sync_all(&mut self, skip_smoothing: bool) {
        self.push_current_values(skip_smoothing);
        if self.state == ManagerState::Constructed {
            self.state = ManagerState::Prepared;
        }
    }

    /// Current normalized value.
    pub fn get_value(&self, id: Id) -> ParameterResult<ParameterValue> {
        self.shared.get_value(id)
    }

    /// Current native value.
    pub fn get_native_value(&self, id: Id) -> ParameterResult<ParameterValue> {
        self.shared.get_native_value(id)
    }

    /// Write a normalized value through the store. See
    /// [`ParameterController::set_value`].
    pub fn set_value(&self, id: Id, normalized: ParameterValue) -> ParameterResult<()> {
        self.shared.set_value(id, normalized)
    }

    /// Serialize every parameter value.
    pub fn save_state(&self) -> ParameterResult<Vec<u8>> {
        self.shared.save_state()
    }

    /// Restore values from a [`save_state`](Self::save_state) blob, then call
    /// every callback with its new value and `skip_smoothing = true`.
    ///
    /// A malformed blob changes nothing and fires no callback.
    pub fn load_state(&mut self, blob: &[u8]) -> ParameterResult<()> {
        self.shared.store.load_state(self.shared.config.state_tag, blob)?;
        self.push_current_values(true);
        Ok(())
    }

    /// A control-thread handle onto the same store and queue.
    pub fn controller(&self) -> ParameterController<Id, S> {
        ParameterController {
            shared: Arc::clone(&self.shared),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Changes waiting for the next `update()`.
    pub fn pending_changes(&self) -> usize {
        self.receiver.pending()
    }

    /// Changes lost to a full queue since construction.
    pub fn dropped_changes(&self) -> u64 {
        self.receiver.dropped()
    }

    /// Unsubscribe from the store. Queued changes stay drainable.
    pub fn release(&mut self) {
        if self.state == ManagerState::Released {
            return;
        }
        for id in self.listeners.drain(..) {
            self.shared.store.remove_listener(id);
        }
        self.state = ManagerState::Released;
        log::debug!("parameter manager released");
    }

    fn push_current_values(&mut self, skip_smoothing: bool) {
        for (&id, callback) in self.callbacks.iter_mut() {
            if let Ok(native) = self.shared.get_native_value(id) {
                callback(native, skip_smoothing);
            }
        }
    }
}

impl<Id: ParameterId, S: ParameterStore + 'static> Drop for ParameterManager<Id, S> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<Id: ParameterId, S: ParameterStore + 'static> std::fmt::Debug for ParameterManager<Id, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterManager")
            .field("parameters", &self.shared.keys.len())
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .field("pending", &self.receiver.pending())
            .field("state", &self.state)
            .finish()
    }
}

/// Control-thread handle onto a manager's store and queue.
///
/// Cheap to clone; every clone feeds the same audio-side manager.
pub struct ParameterController<Id: ParameterId, S: ParameterStore + 'static = AtomicParameterStore> {
    shared: Arc<Shared<Id, S>>,
}

impl<Id: ParameterId, S: ParameterStore + 'static> Clone for ParameterController<Id, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<Id: ParameterId, S: ParameterStore + 'static> ParameterController<Id, S> {
    /// Current normalized value.
    pub fn get_value(&self, id: Id) -> ParameterResult<ParameterValue> {
        self.shared.get_value(id)
    }

    /// Current native value.
    pub fn get_native_value(&self, id: Id) -> ParameterResult<ParameterValue> {
        self.shared.get_native_value(id)
    }

    /// Write a normalized value through the store.
    ///
    /// The store notifies the manager, which queues the new native value.
    /// With [`ManagerConfig::redundant_enqueue`] on, the value is queued a
    /// second time directly, so one call yields two change records.
    pub fn set_value(&self, id: Id, normalized: ParameterValue) -> ParameterResult<()> {
        self.shared.set_value(id, normalized)
    }

    /// Serialize every parameter value.
    pub fn save_state(&self) -> ParameterResult<Vec<u8>> {
        self.shared.save_state()
    }

    /// Display text for `id` at a normalized value.
    pub fn value_to_text(&self, id: Id, normalized: ParameterValue) -> ParameterResult<String> {
        self.shared.store.value_to_text(self.shared.key(id)?, normalized)
    }

    /// Parse display text for `id` into a normalized value.
    pub fn text_to_value(&self, id: Id, text: &str) -> ParameterResult<Option<ParameterValue>> {
        self.shared.store.text_to_value(self.shared.key(id)?, text)
    }

    /// Changes lost to a full queue since construction.
    pub fn dropped_changes(&self) -> u64 {
        self.shared.dropped_changes()
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.shared.store
    }
}

impl<Id: ParameterId, S: ParameterStore + 'static> std::fmt::Debug for ParameterController<Id, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterController")
            .field("parameters", &self.shared.keys.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter_definition::{BoolDefinition, ChoiceDefinition, FloatDefinition, IntDefinition};
    use approx::assert_relative_eq;
    use std::sync::mpsc;

    const GAIN: u32 = 0;
    const RATIO: u32 = 1;
    const ENABLE: u32 = 2;
    const MODE: u32 = 3;

    fn set() -> ParameterSet<u32> {
        let mut set = ParameterSet::new();
        set.add(FloatDefinition::new(GAIN, "Gain", -20.0, 20.0, 0.0).with_unit("dB"))
            .unwrap();
        set.add(IntDefinition::new(RATIO, "Ratio", 1, 20, 4)).unwrap();
        set.add(BoolDefinition::new(ENABLE, "Enable", true)).unwrap();
        set.add(ChoiceDefinition::new(MODE, "Mode", ["Peak", "RMS"], 0)).unwrap();
        set
    }

    type Calls = Arc<Mutex<Vec<(u32, f64, bool)>>>;

    fn record_all(manager: &mut ParameterManager<u32>) -> Calls {
        let calls: Calls = Arc::default();
        for id in [GAIN, RATIO, ENABLE, MODE] {
            let calls = Arc::clone(&calls);
            manager
                .on(id, move |value, skip| calls.lock().push((id, value, skip)))
                .unwrap();
        }
        calls
    }

    #[test]
    fn test_set_value_enqueues_twice_by_default() {
        let mut manager = ParameterManager::new(&set());
        let calls = record_all(&mut manager);

        manager.set_value(GAIN, 0.75).unwrap();
        assert_eq!(manager.pending_changes(), 2);
        assert_eq!(manager.update(), 2);

        let calls = calls.lock();
        assert_eq!(calls.len(), 2);
        for &(id, value, skip) in calls.iter() {
            assert_eq!(id, GAIN);
            assert_relative_eq!(value, 10.0, epsilon = 1e-9);
            assert!(!skip);
        }
    }

    #[test]
    fn test_single_enqueue_without_redundant_path() {
        let config = ManagerConfig::new().with_redundant_enqueue(false);
        let mut manager = ParameterManager::with_config(&set(), config);
        let calls = record_all(&mut manager);

        manager.set_value(GAIN, 0.75).unwrap();
        manager.update();

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, GAIN);
        assert_relative_eq!(calls[0].1, 10.0, epsilon = 1e-9);
        assert!(!calls[0].2);
    }

    #[test]
    fn test_update_without_changes_is_a_no_op() {
        let mut manager = ParameterManager::new(&set());
        let calls = record_all(&mut manager);
        assert_eq!(manager.update(), 0);
        assert!(calls.lock().is_empty());
        assert_eq!(manager.state(), ManagerState::Processing);
    }

    #[test]
    fn test_change_without_callback_is_consumed() {
        let mut manager = ParameterManager::new(&set());
        manager.set_value(RATIO, 1.0).unwrap();
        assert_eq!(manager.update(), 2);
        assert_eq!(manager.pending_changes(), 0);
    }

    #[test]
    fn test_sync_all_pushes_current_values() {
        let mut manager = ParameterManager::new(&set());
        let calls = record_all(&mut manager);
        manager.controller().set_value(RATIO, 1.0).unwrap();

        manager.sync_all(true);
        assert_eq!(manager.state(), ManagerState::Prepared);

        let calls = calls.lock();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], (GAIN, 0.0, true));
        assert_eq!(calls[1], (RATIO, 20.0, true));
        assert_eq!(calls[2], (ENABLE, 1.0, true));
        assert_eq!(calls[3], (MODE, 0.0, true));
    }

    #[test]
    fn test_unknown_ids_are_reported() {
        let mut manager = ParameterManager::new(&set());
        assert!(matches!(manager.get_value(42), Err(ParameterError::UnknownParameter(_))));
        assert!(manager.get_native_value(42).is_err());
        assert!(manager.set_value(42, 0.5).is_err());
        assert!(manager.on(42, |_, _| {}).is_err());
        assert_eq!(manager.pending_changes(), 0);
    }

    #[test]
    fn test_reads_follow_writes() {
        let manager = ParameterManager::new(&set());
        let controller = manager.controller();
        controller.set_value(MODE, 1.0).unwrap();

        assert_eq!(manager.get_value(MODE).unwrap(), 1.0);
        assert_eq!(manager.get_native_value(MODE).unwrap(), 1.0);
        assert_eq!(controller.value_to_text(MODE, 1.0).unwrap(), "RMS");
        assert_eq!(controller.text_to_value(ENABLE, "Off").unwrap(), Some(0.0));
    }

    #[test]
    fn test_load_state_fires_callbacks_with_skip() {
        let mut manager = ParameterManager::new(&set());
        let calls = record_all(&mut manager);
        manager.set_value(RATIO, 1.0).unwrap();
        manager.update();
        calls.lock().clear();

        let blob = br#"{"tag":"Parameters","version":1,"parameters":[{"id":"param_0","value":-10.0}]}"#;
        manager.load_state(blob).unwrap();

        let calls = calls.lock();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].0, GAIN);
        assert_relative_eq!(calls[0].1, -10.0, epsilon = 1e-9);
        assert_eq!(calls[1], (RATIO, 4.0, true));
        assert_eq!(calls[2], (ENABLE, 1.0, true));
        assert_eq!(calls[3], (MODE, 0.0, true));
        assert!(calls.iter().all(|c| c.2));
    }

    #[test]
    fn test_malformed_state_changes_nothing() {
        let mut manager = ParameterManager::new(&set());
        let calls = record_all(&mut manager);
        manager.set_value(GAIN, 1.0).unwrap();
        manager.update();
        calls.lock().clear();

        assert!(manager.load_state(b"<xml/>").is_err());
        assert!(manager.load_state(&[]).is_err());
        assert!(calls.lock().is_empty());
        assert_relative_eq!(manager.get_native_value(GAIN).unwrap(), 20.0);
    }

    #[test]
    fn test_overflow_is_counted() {
        let config = ManagerConfig::new().with_queue_capacity(4).with_redundant_enqueue(false);
        let mut manager = ParameterManager::with_config(&set(), config);
        let controller = manager.controller();

        for i in 0..6 {
            controller.set_value(GAIN, i as f64 / 10.0).unwrap();
        }
        assert_eq!(controller.dropped_changes(), 2);
        assert_eq!(manager.dropped_changes(), 2);

        // Readable while a producer holds the sender
        let guard = manager.shared.sender.lock();
        assert_eq!(controller.dropped_changes(), 2);
        drop(guard);

        assert_eq!(manager.update(), 4);

        controller.set_value(GAIN, 1.0).unwrap();
        assert_eq!(manager.update(), 1);
    }

    #[test]
    fn test_release_unsubscribes() {
        let mut manager = ParameterManager::new(&set());
        let store = Arc::clone(manager.store());
        assert_eq!(store.listener_count(), 4);

        manager.release();
        assert_eq!(manager.state(), ManagerState::Released);
        assert_eq!(store.listener_count(), 0);

        store.set_normalized_notifying_host("param_0", 1.0).unwrap();
        assert_eq!(manager.pending_changes(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let manager = ParameterManager::new(&set());
        let store = Arc::clone(manager.store());
        drop(manager);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_controller_writes_from_another_thread() {
        let mut manager = ParameterManager::with_config(&set(), ManagerConfig::new().with_redundant_enqueue(false));
        let (tx, rx) = mpsc::channel();
        manager.on(GAIN, move |value, _| tx.send(value).unwrap()).unwrap();

        let controller = manager.controller();
        std::thread::spawn(move || controller.set_value(GAIN, 0.25).unwrap())
            .join()
            .unwrap();

        manager.update();
        assert_relative_eq!(rx.try_recv().unwrap(), -10.0, epsilon = 1e-9);
    }
}
