//! Waveform Generator

use feature_engine::FaultType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::RangeInclusive;
use tracing::debug;

/// Samples per generated waveform unless told otherwise
pub const DEFAULT_NUM_SAMPLES: usize = 1000;

/// Mean contact resistance (mOhm)
pub const BASE_RESISTANCE: f64 = 2.5;

/// Amplitude of the slow baseline oscillation (mOhm)
const OSCILLATION_AMPLITUDE: f64 = 0.1;

/// Period of the slow baseline oscillation (ms)
const OSCILLATION_PERIOD_MS: f64 = 100.0;

/// Span of the time axis (ms)
pub const TIME_SPAN_MS: f64 = 300.0;

/// Standard deviation of the additive measurement noise (mOhm)
pub const NOISE_STD: f64 = 0.05;

/// Amplitude of the unstable-contact oscillation (mOhm)
const UNSTABLE_AMPLITUDE: f64 = 0.5;

/// Sample-rate divisor of the unstable oscillation frequency
const UNSTABLE_RATE: f64 = 50.0;

/// Stream simulation favours healthy waveforms 3:1:1:1
const STREAM_MIX: [FaultType; 6] = [
    FaultType::Normal,
    FaultType::Normal,
    FaultType::Normal,
    FaultType::Spike,
    FaultType::Plateau,
    FaultType::Unstable,
];

/// Where and how wide an anomaly may be injected
struct InjectionWindow {
    /// Start position as fractions of the waveform length
    start: (f64, f64),
    /// Width in samples
    width: RangeInclusive<usize>,
}

const SPIKE_WINDOW: InjectionWindow = InjectionWindow {
    start: (0.25, 0.35),
    width: 15..=25,
};

const PLATEAU_WINDOW: InjectionWindow = InjectionWindow {
    start: (0.55, 0.65),
    width: 40..=60,
};

const UNSTABLE_WINDOW: InjectionWindow = InjectionWindow {
    start: (0.85, 0.95),
    width: 25..=35,
};

/// A resistance waveform and its time axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    /// Resistance samples (mOhm)
    pub resistance: Vec<f64>,
    /// Sample times (ms), uniformly spaced over [0, TIME_SPAN_MS]
    pub time: Vec<f64>,
}

impl Waveform {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.resistance.len()
    }

    /// Check if waveform is empty
    pub fn is_empty(&self) -> bool {
        self.resistance.is_empty()
    }
}

/// Synthetic DCRM waveform generator.
///
/// Owns its random source, so a generator built with [`WaveformGenerator::new`]
/// reproduces the same sequence of waveforms for the same seed.
#[derive(Debug)]
pub struct WaveformGenerator {
    rng: StdRng,
}

impl WaveformGenerator {
    /// Create a deterministic generator
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate a waveform carrying the signature of `fault_type`.
    ///
    /// Injection windows are placed relative to `num_samples` and clipped at
    /// the end of the waveform; very short waveforms may lose part or all of
    /// the anomaly.
    pub fn generate(&mut self, fault_type: FaultType, num_samples: usize) -> Waveform {
        let time = time_axis(num_samples);
        let mut resistance: Vec<f64> = time
            .iter()
            .map(|&t| {
                BASE_RESISTANCE
                    + OSCILLATION_AMPLITUDE * (2.0 * PI * t / OSCILLATION_PERIOD_MS).sin()
            })
            .collect();

        match fault_type {
            FaultType::Normal => {}
            FaultType::Spike => {
                let (pos, width) = self.window(&SPIKE_WINDOW, num_samples);
                let magnitude = self.rng.gen_range(4.0..6.0);
                let step = magnitude / (width - 1) as f64;
                for (k, v) in resistance.iter_mut().skip(pos).take(width).enumerate() {
                    *v += step * k as f64;
                }
                debug!("Injected spike at {} (width={}, magnitude={:.2})", pos, width, magnitude);
            }
            FaultType::Plateau => {
                let (pos, width) = self.window(&PLATEAU_WINDOW, num_samples);
                let offset = self.rng.gen_range(1.5..2.5);
                for v in resistance.iter_mut().skip(pos).take(width) {
                    *v += offset;
                }
                debug!("Injected plateau at {} (width={}, offset={:.2})", pos, width, offset);
            }
            FaultType::Unstable => {
                let (pos, width) = self.window(&UNSTABLE_WINDOW, num_samples);
                let freq = self.rng.gen_range(6.0..10.0);
                for (k, v) in resistance.iter_mut().skip(pos).take(width).enumerate() {
                    *v += UNSTABLE_AMPLITUDE * (2.0 * PI * freq * k as f64 / UNSTABLE_RATE).sin();
                }
                debug!("Injected oscillation at {} (width={}, freq={:.2})", pos, width, freq);
            }
        }

        for v in &mut resistance {
            let z: f64 = self.rng.sample(StandardNormal);
            *v += NOISE_STD * z;
        }

        Waveform { resistance, time }
    }

    /// Pick a fault type from the stream mix and generate it
    pub fn generate_random(&mut self, num_samples: usize) -> (FaultType, Waveform) {
        let fault_type = STREAM_MIX[self.rng.gen_range(0..STREAM_MIX.len())];
        (fault_type, self.generate(fault_type, num_samples))
    }

    fn window(&mut self, window: &InjectionWindow, num_samples: usize) -> (usize, usize) {
        let lo = (num_samples as f64 * window.start.0) as usize;
        let hi = (num_samples as f64 * window.start.1) as usize;
        let pos = self.rng.gen_range(lo..=hi);
        let width = self.rng.gen_range(window.width.clone());
        (pos, width)
    }
}

/// `num_samples` points evenly spaced over [0, TIME_SPAN_MS], both ends included
fn time_axis(num_samples: usize) -> Vec<f64> {
    match num_samples {
        0 => Vec::new(),
        1 => vec![0.0],
        n => {
            let step = TIME_SPAN_MS / (n - 1) as f64;
            (0..n).map(|i| i as f64 * step).collect()
        }
    }
}
