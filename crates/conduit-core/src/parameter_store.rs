//! Host-facing parameter store.
//!
//! The store is the single source of truth for parameter values shared with
//! the host and the UI. It is addressed by string key (`"param_<ordinal>"`),
//! keeps values normalized, and tells registered [`ParameterListener`]s about
//! every write.
//!
//! # Thread Safety
//!
//! [`ParameterStore`] requires `Send + Sync` because it is reached from
//! several threads at once:
//! - Host thread: automation playback, state save/load
//! - UI thread: displays and modifies parameter values
//! - Control code: [`ParameterController`](crate::ParameterController) reads and writes
//!
//! The audio thread never touches the store; it receives changes through the
//! manager's change queue.
//!
//! Listeners run synchronously on the writing thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{ParameterError, ParameterResult};
use crate::parameter_set::ParameterSet;
use crate::parameter_types::StoreParameter;
use crate::state::{StateDocument, StateEntry};
use crate::types::{ParameterId, ParameterValue};

/// Receives value-change notifications from a [`ParameterStore`].
pub trait ParameterListener: Send + Sync {
    /// Called after `key` was set to `normalized`.
    fn parameter_changed(&self, key: &str, normalized: ParameterValue);
}

/// Handle returned by [`ParameterStore::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered list of parameters a store is built from.
#[derive(Debug, Default)]
pub struct ParameterLayout {
    parameters: Vec<StoreParameter>,
}

impl ParameterLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out every resolvable definition of a set, in set order.
    pub fn from_set<Id: ParameterId>(set: &ParameterSet<Id>) -> Self {
        let parameters = set
            .ids()
            .filter_map(|id| set.get(id).ok())
            .filter_map(|definition| match StoreParameter::from_definition(definition) {
                Ok(parameter) => Some(parameter),
                Err(err) => {
                    log::warn!("leaving '{}' out of the layout: {}", definition.name(), err);
                    None
                }
            })
            .collect();
        Self { parameters }
    }

    pub fn push(&mut self, parameter: StoreParameter) {
        self.parameters.push(parameter);
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoreParameter> + '_ {
        self.parameters.iter()
    }
}

/// Keyed store of normalized parameter values.
///
/// Unknown keys are reported as [`ParameterError::UnknownParameter`].
pub trait ParameterStore: Send + Sync {
    /// Build a store holding `layout`'s parameters at their defaults.
    fn from_layout(layout: ParameterLayout) -> Self
    where
        Self: Sized;

    /// Number of parameters.
    fn count(&self) -> usize;

    /// Whether `key` names a parameter.
    fn contains(&self, key: &str) -> bool;

    /// Register a listener for one key.
    fn add_listener(&self, key: &str, listener: Arc<dyn ParameterListener>) -> ListenerId;

    /// Unregister a listener. Unknown IDs are ignored.
    fn remove_listener(&self, id: ListenerId);

    /// Current normalized value.
    fn get_normalized(&self, key: &str) -> ParameterResult<ParameterValue>;

    /// Convert normalized to native for `key`.
    fn normalized_to_native(&self, key: &str, normalized: ParameterValue) -> ParameterResult<ParameterValue>;

    /// Convert native to normalized for `key`.
    fn native_to_normalized(&self, key: &str, native: ParameterValue) -> ParameterResult<ParameterValue>;

    /// Normalized default of `key`.
    fn default_normalized(&self, key: &str) -> ParameterResult<ParameterValue>;

    /// Store a normalized value, as if the host had automated it, and notify
    /// the key's listeners.
    fn set_normalized_notifying_host(&self, key: &str, normalized: ParameterValue) -> ParameterResult<()>;

    /// Display text for a normalized value.
    fn value_to_text(&self, key: &str, normalized: ParameterValue) -> ParameterResult<String>;

    /// Parse display text. `Ok(None)` if the text does not parse.
    fn text_to_value(&self, key: &str, text: &str) -> ParameterResult<Option<ParameterValue>>;

    /// Serialize every value under the root tag `tag`.
    fn save_state(&self, tag: &str) -> ParameterResult<Vec<u8>>;

    /// Replace every value from a blob produced by [`save_state`](Self::save_state).
    ///
    /// Malformed blobs leave the store unchanged. Parameters missing from
    /// the blob return to their defaults.
    fn load_state(&self, tag: &str, blob: &[u8]) -> ParameterResult<()>;
}

struct ListenerEntry {
    id: ListenerId,
    key: String,
    listener: Arc<dyn ParameterListener>,
}

/// Lock-free-read store backed by atomic normalized cells.
pub struct AtomicParameterStore {
    parameters: Vec<StoreParameter>,
    index: HashMap<String, usize>,
    listeners: RwLock<Vec<ListenerEntry>>,
    next_listener_id: AtomicU64,
}

impl AtomicParameterStore {
    fn parameter(&self, key: &str) -> ParameterResult<&StoreParameter> {
        self.index
            .get(key)
            .map(|&i| &self.parameters[i])
            .ok_or_else(|| ParameterError::UnknownParameter(key.to_string()))
    }

    /// Iterate the store's parameters in layout order.
    pub fn parameters(&self) -> impl Iterator<Item = &StoreParameter> + '_ {
        self.parameters.iter()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Store and notify if the snapped value differs from the current one.
    fn write(&self, parameter: &StoreParameter, normalized: ParameterValue, force_notify: bool) {
        let previous = parameter.get_normalized();
        let stored = parameter.set_normalized(normalized);
        if force_notify || stored != previous {
            self.notify(parameter.key(), stored);
        }
    }

    /// Store a saved normalized value bit for bit and notify on change.
    fn restore(&self, parameter: &StoreParameter, normalized: ParameterValue) {
        let previous = parameter.get_normalized();
        parameter.restore_normalized(normalized);
        if normalized.to_bits() != previous.to_bits() {
            self.notify(parameter.key(), normalized);
        }
    }

    fn notify(&self, key: &str, normalized: ParameterValue) {
        // Collect first so listeners run without the registry lock held
        let targets: Vec<Arc<dyn ParameterListener>> = self
            .listeners
            .read()
            .iter()
            .filter(|entry| entry.key == key)
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        for listener in targets {
            listener.parameter_changed(key, normalized);
        }
    }
}

impl ParameterStore for AtomicParameterStore {
    fn from_layout(layout: ParameterLayout) -> Self {
        let mut index = HashMap::with_capacity(layout.len());
        for (i, parameter) in layout.parameters.iter().enumerate() {
            if index.insert(parameter.key().to_string(), i).is_some() {
                log::warn!("store key '{}' laid out twice, keeping the later one", parameter.key());
            }
        }

        Self {
            parameters: layout.parameters,
            index,
            listeners: RwLock::new(Vec::new()),
            next_listener_id: AtomicU64::new(0),
        }
    }

    fn count(&self) -> usize {
        self.parameters.len()
    }

    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn add_listener(&self, key: &str, listener: Arc<dyn ParameterListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push(ListenerEntry {
            id,
            key: key.to_string(),
            listener,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.write().retain(|entry| entry.id != id);
    }

    fn get_normalized(&self, key: &str) -> ParameterResult<ParameterValue> {
        Ok(self.parameter(key)?.get_normalized())
    }

    fn normalized_to_native(&self, key: &str, normalized: ParameterValue) -> ParameterResult<ParameterValue> {
        Ok(self.parameter(key)?.normalized_to_native(normalized))
    }

    fn native_to_normalized(&self, key: &str, native: ParameterValue) -> ParameterResult<ParameterValue> {
        Ok(self.parameter(key)?.native_to_normalized(native))
    }

    fn default_normalized(&self, key: &str) -> ParameterResult<ParameterValue> {
        Ok(self.parameter(key)?.default_normalized())
    }

    fn set_normalized_notifying_host(&self, key: &str, normalized: ParameterValue) -> ParameterResult<()> {
        let parameter = self.parameter(key)?;
        self.write(parameter, normalized, true);
        Ok(())
    }

    fn value_to_text(&self, key: &str, normalized: ParameterValue) -> ParameterResult<String> {
        Ok(self.parameter(key)?.value_to_text(normalized))
    }

    fn text_to_value(&self, key: &str, text: &str) -> ParameterResult<Option<ParameterValue>> {
        Ok(self.parameter(key)?.text_to_value(text))
    }

    fn save_state(&self, tag: &str) -> ParameterResult<Vec<u8>> {
        let mut document = StateDocument::new(tag);
        for parameter in &self.parameters {
            let normalized = parameter.get_normalized();
            document.push_exact(parameter.key(), parameter.normalized_to_native(normalized), normalized);
        }
        document.to_bytes()
    }

    fn load_state(&self, tag: &str, blob: &[u8]) -> ParameterResult<()> {
        let document = StateDocument::from_bytes(blob, tag)?;

        let mut loaded: HashMap<&str, &StateEntry> = HashMap::with_capacity(document.parameters.len());
        for entry in &document.parameters {
            if self.contains(&entry.id) {
                loaded.insert(entry.id.as_str(), entry);
            } else {
                log::debug!("ignoring unknown state entry '{}'", entry.id);
            }
        }

        // Resolve everything before the first write so a load applies whole
        let targets: Vec<Restore> = self
            .parameters
            .iter()
            .map(|p| match loaded.get(p.key()) {
                Some(entry) => Restore::resolve(p, entry),
                None => Restore::Snapped(p.default_normalized()),
            })
            .collect();

        for (parameter, target) in self.parameters.iter().zip(targets) {
            match target {
                Restore::Exact(normalized) => self.restore(parameter, normalized),
                Restore::Snapped(normalized) => self.write(parameter, normalized, false),
            }
        }

        log::debug!(
            "loaded {} of {} parameters from state",
            loaded.len(),
            self.parameters.len()
        );
        Ok(())
    }
}

/// How a saved entry is written back.
enum Restore {
    /// The saved normalized value reproduces the saved native value.
    Exact(ParameterValue),
    /// Native-only (or hand-edited) entry, snapped through the mapper.
    Snapped(ParameterValue),
}

impl Restore {
    fn resolve(parameter: &StoreParameter, entry: &StateEntry) -> Self {
        match entry.normalized {
            Some(normalized)
                if (0.0..=1.0).contains(&normalized)
                    && parameter.normalized_to_native(normalized) == entry.value =>
            {
                Self::Exact(normalized)
            }
            _ => Self::Snapped(parameter.native_to_normalized(entry.value)),
        }
    }
}

impl std::fmt::Debug for AtomicParameterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicParameterStore")
            .field("parameters", &self.parameters)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter_definition::{BoolDefinition, ChoiceDefinition, FloatDefinition, IntDefinition};
    use crate::state::DEFAULT_STATE_TAG;
    use approx::assert_relative_eq;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, f64)>>,
    }

    impl ParameterListener for Recorder {
        fn parameter_changed(&self, key: &str, normalized: ParameterValue) {
            self.calls.lock().push((key.to_string(), normalized));
        }
    }

    fn store() -> AtomicParameterStore {
        let mut set = ParameterSet::new();
        set.add(FloatDefinition::new(0u32, "Threshold", -60.0, 0.0, -20.0).with_unit("dB"))
            .unwrap();
        set.add(IntDefinition::new(1u32, "Ratio", 1, 20, 4)).unwrap();
        set.add(BoolDefinition::new(2u32, "Enable", true)).unwrap();
        set.add(ChoiceDefinition::new(3u32, "Mode", ["Peak", "RMS"], 0)).unwrap();
        AtomicParameterStore::from_layout(ParameterLayout::from_set(&set))
    }

    #[test]
    fn test_layout_and_defaults() {
        let store = store();
        assert_eq!(store.count(), 4);
        assert!(store.contains("param_3"));
        assert!(!store.contains("param_4"));
        assert_relative_eq!(store.get_normalized("param_0").unwrap(), 40.0 / 60.0);
        assert_eq!(store.get_normalized("param_2").unwrap(), 1.0);
        assert!(matches!(
            store.get_normalized("param_9"),
            Err(ParameterError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_listener_notified_on_write() {
        let store = store();
        let recorder = Arc::new(Recorder::default());
        store.add_listener("param_1", recorder.clone());

        store.set_normalized_notifying_host("param_1", 1.0).unwrap();
        store.set_normalized_notifying_host("param_0", 0.0).unwrap();

        let calls = recorder.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("param_1".to_string(), 1.0));
    }

    #[test]
    fn test_remove_listener() {
        let store = store();
        let recorder = Arc::new(Recorder::default());
        let id = store.add_listener("param_0", recorder.clone());
        assert_eq!(store.listener_count(), 1);

        store.remove_listener(id);
        store.set_normalized_notifying_host("param_0", 0.5).unwrap();

        assert_eq!(store.listener_count(), 0);
        assert!(recorder.calls.lock().is_empty());
    }

    #[test]
    fn test_state_round_trip() {
        let source = store();
        source.set_normalized_notifying_host("param_0", 0.25).unwrap();
        source.set_normalized_notifying_host("param_3", 1.0).unwrap();
        let blob = source.save_state(DEFAULT_STATE_TAG).unwrap();

        let target = store();
        target.load_state(DEFAULT_STATE_TAG, &blob).unwrap();
        for key in ["param_0", "param_1", "param_2", "param_3"] {
            assert_eq!(
                source.get_normalized(key).unwrap(),
                target.get_normalized(key).unwrap(),
                "{key}"
            );
        }
    }

    #[test]
    fn test_state_restores_stored_bits() {
        let mut set = ParameterSet::new();
        set.add(
            FloatDefinition::new(0u32, "Freq", 20.0, 20000.0, 1000.0)
                .with_skew(0.3)
                .with_interval(0.0),
        )
        .unwrap();
        let source = AtomicParameterStore::from_layout(ParameterLayout::from_set(&set));
        let target = AtomicParameterStore::from_layout(ParameterLayout::from_set(&set));

        for step in 0..500 {
            source.set_normalized_notifying_host("param_0", step as f64 / 499.0).unwrap();
            target
                .load_state(DEFAULT_STATE_TAG, &source.save_state(DEFAULT_STATE_TAG).unwrap())
                .unwrap();
            assert_eq!(
                source.get_normalized("param_0").unwrap().to_bits(),
                target.get_normalized("param_0").unwrap().to_bits()
            );
        }
    }

    #[test]
    fn test_inconsistent_normalized_entry_falls_back_to_native() {
        let store = store();
        // Hand-edited native value, stale normalized value
        let blob = br#"{"tag":"Parameters","version":1,"parameters":[{"id":"param_0","value":-30.0,"normalized":0.9}]}"#;
        store.load_state(DEFAULT_STATE_TAG, blob).unwrap();
        assert_relative_eq!(
            store.normalized_to_native("param_0", store.get_normalized("param_0").unwrap()).unwrap(),
            -30.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_partial_state_resets_missing_to_defaults() {
        let store = store();
        store.set_normalized_notifying_host("param_1", 1.0).unwrap();

        let blob = br#"{"tag":"Parameters","version":1,"parameters":[{"id":"param_0","value":-10.0},{"id":"param_77","value":1.0}]}"#;
        store.load_state(DEFAULT_STATE_TAG, blob).unwrap();

        assert_relative_eq!(
            store.normalized_to_native("param_0", store.get_normalized("param_0").unwrap()).unwrap(),
            -10.0,
            epsilon = 1e-9
        );
        assert_eq!(
            store.get_normalized("param_1").unwrap(),
            store.default_normalized("param_1").unwrap()
        );
    }

    #[test]
    fn test_malformed_state_leaves_store_unchanged() {
        let store = store();
        store.set_normalized_notifying_host("param_0", 0.1).unwrap();
        let before = store.get_normalized("param_0").unwrap();

        assert!(store.load_state(DEFAULT_STATE_TAG, b"not json").is_err());
        assert!(store.load_state("Other", &store.save_state(DEFAULT_STATE_TAG).unwrap()).is_err());
        assert_eq!(store.get_normalized("param_0").unwrap(), before);
    }

    #[test]
    fn test_text_conversion_by_key() {
        let store = store();
        assert_eq!(store.value_to_text("param_3", 1.0).unwrap(), "RMS");
        assert_eq!(store.text_to_value("param_2", "Off").unwrap(), Some(0.0));
        assert_eq!(store.text_to_value("param_2", "sideways").unwrap(), None);
    }
}
