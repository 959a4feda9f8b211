//! Naive table-free oscillators evaluated directly on the sample time axis.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::{sample_count, sample_time};

/// Supported waveform shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// A fixed-frequency oscillator.
///
/// Samples are computed from the absolute sample index rather than an
/// accumulated phase, so long buffers don't drift.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub shape: Shape,
    pub frequency: f64,
    sample_rate: u32,
}

impl Oscillator {
    pub fn new(shape: Shape, frequency: f64, sample_rate: u32) -> Self {
        Oscillator {
            shape,
            frequency,
            sample_rate,
        }
    }

    /// Phase in [0, 1) at sample `index`.
    fn phase(&self, index: usize) -> f64 {
        (self.frequency * sample_time(index, self.sample_rate)).rem_euclid(1.0)
    }

    /// Value of the waveform at sample `index`.
    pub fn sample_at(&self, index: usize) -> f64 {
        match self.shape {
            Shape::Sine => self.sine(index),
            Shape::Square => {
                let s = self.sine(index);
                if s > 0.0 {
                    1.0
                } else if s < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Shape::Sawtooth => 2.0 * self.phase(index) - 1.0,
            Shape::Triangle => 2.0 * (2.0 * self.phase(index) - 1.0).abs() - 1.0,
        }
    }

    fn sine(&self, index: usize) -> f64 {
        (2.0 * PI * self.frequency * sample_time(index, self.sample_rate)).sin()
    }

    /// Render `duration` seconds of the waveform.
    pub fn render(&self, duration: f64) -> Vec<f64> {
        (0..sample_count(duration, self.sample_rate))
            .map(|i| self.sample_at(i))
            .collect()
    }
}

/// Render `duration` seconds of `shape` at `frequency`.
pub fn oscillator(frequency: f64, duration: f64, sample_rate: u32, shape: Shape) -> Vec<f64> {
    Oscillator::new(shape, frequency, sample_rate).render(duration)
}
