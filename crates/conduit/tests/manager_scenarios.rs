use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use approx::assert_relative_eq;
use conduit::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ParameterId)]
enum Id {
    Threshold,
    Ratio,
    Attack,
    Knee,
    Detector,
    Gain,
    Unused,
}

fn compressor_set() -> ParameterSet<Id> {
    let mut set = ParameterSet::new();
    set.add(FloatDefinition::new(Id::Threshold, "Threshold", -60.0, 0.0, -20.0).with_unit("dB"))
        .unwrap();
    set.add(FloatDefinition::new(Id::Ratio, "Ratio", 1.0, 20.0, 4.0).with_skew(0.5))
        .unwrap();
    set.add(FloatDefinition::new(Id::Attack, "Attack", 0.1, 100.0, 10.0).with_unit("ms"))
        .unwrap();
    set.add(IntDefinition::new(Id::Knee, "Knee", 0, 12, 6).with_unit("dB"))
        .unwrap();
    set.add(ChoiceDefinition::new(Id::Detector, "Detector", ["Peak", "RMS"], 1))
        .unwrap();
    set.add(FloatDefinition::new(Id::Gain, "Gain", -20.0, 20.0, 0.0).with_unit("dB"))
        .unwrap();
    set.add(BoolDefinition::new(Id::Unused, "Unused", false)).unwrap();
    set
}

type Log = Arc<Mutex<Vec<(Id, f64, bool)>>>;

fn subscribe(manager: &mut ParameterManager<Id>, ids: &[Id]) -> Log {
    let log: Log = Arc::default();
    for &id in ids {
        let log = Arc::clone(&log);
        manager
            .on(id, move |value, skip| log.lock().unwrap().push((id, value, skip)))
            .unwrap();
    }
    log
}

const SUBSCRIBED: [Id; 6] = [Id::Threshold, Id::Ratio, Id::Attack, Id::Knee, Id::Detector, Id::Gain];

#[test]
fn test_gain_write_reaches_callback_once() {
    let config = ManagerConfig::new().with_redundant_enqueue(false);
    let mut manager = ParameterManager::with_config(&compressor_set(), config);
    let log = subscribe(&mut manager, &[Id::Gain]);

    manager.controller().set_value(Id::Gain, 0.75).unwrap();
    manager.update();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, Id::Gain);
    assert_relative_eq!(log[0].1, 10.0, epsilon = 1e-9);
    assert!(!log[0].2);
}

#[test]
fn test_default_set_value_delivers_two_records() {
    let mut manager = ParameterManager::new(&compressor_set());
    let log = subscribe(&mut manager, &[Id::Gain]);

    manager.controller().set_value(Id::Gain, 0.75).unwrap();
    manager.update();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|&(id, value, skip)| {
        id == Id::Gain && (value - 10.0).abs() < 1e-9 && !skip
    }));
}

#[test]
fn test_change_for_unsubscribed_id_has_no_effect() {
    let mut manager = ParameterManager::new(&compressor_set());
    let log = subscribe(&mut manager, &SUBSCRIBED);

    manager.set_value(Id::Unused, 1.0).unwrap();
    assert!(manager.update() > 0);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_sync_all_calls_each_callback_once() {
    let mut manager = ParameterManager::new(&compressor_set());
    let log = subscribe(&mut manager, &SUBSCRIBED);

    manager.sync_all(true);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), SUBSCRIBED.len());
    for (entry, id) in log.iter().zip(SUBSCRIBED) {
        assert_eq!(entry.0, id);
        assert!(entry.2);
        assert_relative_eq!(entry.1, manager.get_native_value(id).unwrap());
    }
    assert_relative_eq!(log[0].1, -20.0, epsilon = 1e-9);
    assert_relative_eq!(log[1].1, 4.0, epsilon = 1e-9);
    assert_eq!(log[3].1, 6.0);
    assert_eq!(log[4].1, 1.0);
}

#[test]
fn test_load_partial_state() {
    let mut manager = ParameterManager::new(&compressor_set());
    let controller = manager.controller();
    controller.set_value(Id::Attack, 1.0).unwrap();
    controller.set_value(Id::Detector, 0.0).unwrap();
    manager.update();

    let log = subscribe(&mut manager, &SUBSCRIBED);
    let blob = br#"{"tag":"Parameters","version":1,"parameters":[{"id":"param_0","value":-10.0}]}"#;
    manager.load_state(blob).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), SUBSCRIBED.len());
    assert!(log.iter().all(|entry| entry.2));
    assert_relative_eq!(log[0].1, -10.0, epsilon = 1e-9);
    assert_relative_eq!(log[2].1, 10.0, epsilon = 1e-9);
    assert_eq!(log[4].1, 1.0);
}

#[test]
fn test_state_round_trip_between_instances() {
    let source = ParameterManager::new(&compressor_set());
    let controller = source.controller();
    controller.set_value(Id::Threshold, 0.3).unwrap();
    controller.set_value(Id::Ratio, 0.8).unwrap();
    controller.set_value(Id::Knee, 0.25).unwrap();
    controller.set_value(Id::Detector, 0.0).unwrap();
    let blob = controller.save_state().unwrap();

    let mut target = ParameterManager::new(&compressor_set());
    target.load_state(&blob).unwrap();

    for id in SUBSCRIBED.iter().copied().chain([Id::Unused]) {
        assert_eq!(
            source.get_native_value(id).unwrap(),
            target.get_native_value(id).unwrap(),
            "{:?}",
            id
        );
    }
}

#[test]
fn test_garbage_state_keeps_current_values() {
    let mut manager = ParameterManager::new(&compressor_set());
    let log = subscribe(&mut manager, &SUBSCRIBED);
    let before: Vec<f64> = SUBSCRIBED
        .iter()
        .map(|&id| manager.get_native_value(id).unwrap())
        .collect();

    let blobs: [&[u8]; 3] = [
        b"",
        b"\xff\xfe",
        br#"{"tag":"Parameters","version":1,"parameters":[{"id":"param_0"}]}"#,
    ];
    for blob in blobs {
        assert!(matches!(manager.load_state(blob), Err(ParameterError::State(_))));
    }

    let after: Vec<f64> = SUBSCRIBED
        .iter()
        .map(|&id| manager.get_native_value(id).unwrap())
        .collect();
    assert_eq!(before, after);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_writes_from_a_control_thread_arrive_in_order() {
    let config = ManagerConfig::new()
        .with_redundant_enqueue(false)
        .with_queue_capacity(1024);
    let mut manager = ParameterManager::with_config(&compressor_set(), config);
    let log = subscribe(&mut manager, &[Id::Threshold, Id::Gain]);

    let controller = manager.controller();
    let writer = thread::spawn(move || {
        for step in 1..=100 {
            let normalized = step as f64 / 100.0;
            controller.set_value(Id::Threshold, normalized).unwrap();
            controller.set_value(Id::Gain, normalized).unwrap();
        }
    });

    let done = Arc::new(AtomicBool::new(false));
    let audio_done = Arc::clone(&done);
    let audio = thread::spawn(move || {
        let mut delivered = 0;
        loop {
            let finished = audio_done.load(Ordering::Acquire);
            delivered += manager.update();
            if finished {
                delivered += manager.update();
                break;
            }
            thread::yield_now();
        }
        (delivered, manager.dropped_changes())
    });

    writer.join().unwrap();
    done.store(true, Ordering::Release);
    let (delivered, dropped) = audio.join().unwrap();

    assert_eq!(dropped, 0);
    assert_eq!(delivered, 200);

    let log = log.lock().unwrap();
    let thresholds: Vec<f64> = log.iter().filter(|e| e.0 == Id::Threshold).map(|e| e.1).collect();
    assert_eq!(thresholds.len(), 100);
    assert!(thresholds.windows(2).all(|w| w[0] <= w[1]));
    assert_relative_eq!(*thresholds.last().unwrap(), 0.0, epsilon = 1e-9);

    // Records alternate Threshold, Gain as they were written
    for pair in log.chunks(2) {
        assert_eq!(pair[0].0, Id::Threshold);
        assert_eq!(pair[1].0, Id::Gain);
    }
}

#[test]
fn test_burst_over_capacity_is_bounded() {
    let config = ManagerConfig::new()
        .with_redundant_enqueue(false)
        .with_queue_capacity(128);
    let mut manager = ParameterManager::with_config(&compressor_set(), config);
    let log = subscribe(&mut manager, &[Id::Gain]);
    let controller = manager.controller();

    for step in 0..200 {
        controller.set_value(Id::Gain, (step % 2) as f64).unwrap();
    }

    assert_eq!(manager.update(), 128);
    assert_eq!(manager.dropped_changes(), 72);
    assert_eq!(log.lock().unwrap().len(), 128);

    // The queue keeps working after the overflow
    controller.set_value(Id::Gain, 0.5).unwrap();
    assert_eq!(manager.update(), 1);
    assert_relative_eq!(log.lock().unwrap().last().unwrap().1, 0.0, epsilon = 1e-9);
}

#[test]
fn test_unsnapped_skewed_float_round_trips_exactly() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ParameterId)]
    enum Filter {
        Cutoff,
    }

    let set = ParameterSet::new()
        .with(
            FloatDefinition::new(Filter::Cutoff, "Cutoff", 20.0, 20000.0, 1000.0)
                .with_skew(0.3)
                .with_interval(0.0),
        )
        .unwrap();
    let mut source = ParameterManager::new(&set);
    let mut target = ParameterManager::new(&set);

    let steps = 2000;
    let mismatches: Vec<(f64, f64, f64)> = (0..steps)
        .filter_map(|step| {
            let normalized = step as f64 / (steps - 1) as f64;
            source.set_value(Filter::Cutoff, normalized).unwrap();
            source.update();

            target.load_state(&source.save_state().unwrap()).unwrap();
            target.update();

            let saved = source.get_native_value(Filter::Cutoff).unwrap();
            let restored = target.get_native_value(Filter::Cutoff).unwrap();
            (saved.to_bits() != restored.to_bits()).then_some((normalized, saved, restored))
        })
        .collect();

    assert!(mismatches.is_empty(), "{} mismatches, first {:?}", mismatches.len(), mismatches.first());
}
