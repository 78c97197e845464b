// src/sensor/voltage.rs

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::trace;

use crate::config::model::SupplySection;
use crate::types::{SupplyMode, Voltage};

/// Source of stored-energy readings, in the same units as `required_voltage`.
///
/// A read must be cheap and must not block.
pub trait VoltageSensor: Send {
    fn read_voltage(&mut self) -> Voltage;
}

/// Always returns the same reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedVoltageSensor {
    voltage: Voltage,
}

impl FixedVoltageSensor {
    pub fn new(voltage: Voltage) -> Self {
        Self { voltage }
    }
}

impl VoltageSensor for FixedVoltageSensor {
    fn read_voltage(&mut self) -> Voltage {
        self.voltage
    }
}

/// Replays a fixed sequence, one value per read, then holds the last value.
#[derive(Debug, Clone)]
pub struct ScriptedVoltageSensor {
    remaining: VecDeque<Voltage>,
    last: Voltage,
}

impl ScriptedVoltageSensor {
    /// `fallback` is returned if `trace` is empty.
    pub fn new(trace: impl IntoIterator<Item = Voltage>, fallback: Voltage) -> Self {
        Self {
            remaining: trace.into_iter().collect(),
            last: fallback,
        }
    }
}

impl VoltageSensor for ScriptedVoltageSensor {
    fn read_voltage(&mut self) -> Voltage {
        if let Some(next) = self.remaining.pop_front() {
            self.last = next;
        }
        trace!(voltage = self.last, "scripted voltage read");
        self.last
    }
}

/// Voltage cell shared between the scheduler and whoever drives it.
#[derive(Debug, Clone, Default)]
pub struct SharedVoltage {
    cell: Arc<AtomicU32>,
}

impl SharedVoltage {
    pub fn new(initial: Voltage) -> Self {
        Self {
            cell: Arc::new(AtomicU32::new(initial)),
        }
    }

    pub fn set(&self, voltage: Voltage) {
        self.cell.store(voltage, Ordering::SeqCst);
    }

    pub fn get(&self) -> Voltage {
        self.cell.load(Ordering::SeqCst)
    }
}

impl VoltageSensor for SharedVoltage {
    fn read_voltage(&mut self) -> Voltage {
        self.get()
    }
}

/// Build the sensor described by a `[supply]` section.
pub fn sensor_from_config(supply: &SupplySection) -> Box<dyn VoltageSensor> {
    match supply.mode {
        SupplyMode::Fixed => Box::new(FixedVoltageSensor::new(supply.voltage)),
        SupplyMode::Trace => Box::new(ScriptedVoltageSensor::new(
            supply.trace.iter().copied(),
            supply.voltage,
        )),
    }
}

impl<S: VoltageSensor + ?Sized> VoltageSensor for Box<S> {
    fn read_voltage(&mut self) -> Voltage {
        (**self).read_voltage()
    }
}
