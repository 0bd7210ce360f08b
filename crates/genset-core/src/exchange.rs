use crate::model::Status;
use serde::Serialize;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Point-in-time state of the simulated unit, published once per tick.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct GeneratorSnapshot {
    pub timestamp_us: u64,
    pub tick: u64,
    pub rpm: f64,
    pub target_rpm: f64,
    pub vibration_g: f64,
    pub voltage_l1_v: f64,
    pub current_l1_a: f64,
    pub power_kw: f64,
    pub oil_pressure_bar: f64,
    pub health_pct: f64,
    pub status: Status,
    pub tick_jitter_us: u32,
    pub ticks_missed: u64,
}

/// Single-writer triple buffer. The writer flips between slots so readers
/// always observe a complete value without blocking the writer.
struct TripleBuffer<T: Copy + Default> {
    slots: [UnsafeCell<T>; 3],
    index: AtomicUsize,
}

unsafe impl<T: Copy + Default + Send> Send for TripleBuffer<T> {}
unsafe impl<T: Copy + Default + Sync> Sync for TripleBuffer<T> {}

impl<T: Copy + Default> TripleBuffer<T> {
    fn new() -> Self {
        let slots = std::array::from_fn(|_| UnsafeCell::new(T::default()));
        Self {
            slots,
            index: AtomicUsize::new(0),
        }
    }

    fn write(&self, value: T) {
        let current = self.index.load(Ordering::Relaxed);
        let next = (current + 1) % 3;
        unsafe {
            *self.slots[next].get() = value;
        }
        self.index.store(next, Ordering::Release);
    }

    fn read(&self) -> T {
        let idx = self.index.load(Ordering::Acquire);
        unsafe { *self.slots[idx].get() }
    }
}

/// Shared-state rendezvous between the simulation thread and everything
/// else: telemetry readers get the latest snapshot, the control channel
/// latches an emergency-stop request.
///
/// The request flag is drained at the start of each tick, so a tick never
/// observes a torn `(target_rpm, status)` pair: the brake is applied fully
/// before the tick computes, or not at all.
pub struct StateExchange {
    snapshot: TripleBuffer<GeneratorSnapshot>,
    emergency_stop: AtomicBool,
}

impl StateExchange {
    pub fn new() -> Self {
        Self {
            snapshot: TripleBuffer::new(),
            emergency_stop: AtomicBool::new(false),
        }
    }

    /// Called by the simulation thread after every tick. Non-blocking.
    pub fn publish(&self, snapshot: GeneratorSnapshot) {
        self.snapshot.write(snapshot);
    }

    /// Latest published snapshot. Readers never block the simulation.
    pub fn latest(&self) -> GeneratorSnapshot {
        self.snapshot.read()
    }

    /// Called from the control-channel delivery context. Safe to call
    /// repeatedly; the brake is idempotent.
    pub fn request_emergency_stop(&self) {
        self.emergency_stop.store(true, Ordering::Release);
    }

    /// Drains a pending emergency-stop request. Called by the simulation
    /// thread at the start of each tick.
    pub fn take_emergency_stop(&self) -> bool {
        self.emergency_stop.swap(false, Ordering::AcqRel)
    }
}

impl Default for StateExchange {
    fn default() -> Self {
        Self::new()
    }
}
