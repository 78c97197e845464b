// src/sensor/mod.rs

//! Collaborators the scheduler samples: supply voltage and time.
//!
//! Both are traits so the runtime can be driven by real hardware readings,
//! a replayed trace, or a handle that tests move around by hand.

pub mod clock;
pub mod voltage;

pub use clock::{Clock, TokioClock};
pub use voltage::{
    FixedVoltageSensor, ScriptedVoltageSensor, SharedVoltage, VoltageSensor, sensor_from_config,
};
