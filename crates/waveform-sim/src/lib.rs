//! Synthetic Waveform Simulation
//!
//! Generates labeled DCRM resistance waveforms: a slow sinusoidal baseline
//! with Gaussian noise and, depending on the fault type, an injected ramp,
//! offset or oscillation. Used to build training sets and for live demos.

mod generator;

pub use generator::{
    Waveform, WaveformGenerator, BASE_RESISTANCE, DEFAULT_NUM_SAMPLES, NOISE_STD, TIME_SPAN_MS,
};
