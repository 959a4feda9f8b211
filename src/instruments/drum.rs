//! Drum kit: noise bursts and low sine thumps under exponential decays.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dsp::noise::white_noise;
use crate::dsp::{normalize, sample_count, sample_time};
use crate::error::{Result, SynthError};
use crate::waveform::WaveformBuffer;

/// The closed set of drum voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrumKind {
    Snare,
    Hihat,
    Tom1,
    Tom2,
    Kick,
    Crash,
    Ride,
    Floor,
}

/// How a drum voice is generated. Every term is shaped by `e^(-decay·t)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recipe {
    /// Gaussian noise.
    Noise { decay: f64 },
    /// A single sine tone.
    Tone { frequency: f64, decay: f64 },
    /// A sine thump with a separately decaying noise layer on top.
    Thump {
        frequency: f64,
        decay: f64,
        noise_sigma: f64,
        noise_decay: f64,
    },
}

impl DrumKind {
    pub const ALL: [DrumKind; 8] = [
        DrumKind::Snare,
        DrumKind::Hihat,
        DrumKind::Tom1,
        DrumKind::Tom2,
        DrumKind::Kick,
        DrumKind::Crash,
        DrumKind::Ride,
        DrumKind::Floor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DrumKind::Snare => "snare",
            DrumKind::Hihat => "hihat",
            DrumKind::Tom1 => "tom1",
            DrumKind::Tom2 => "tom2",
            DrumKind::Kick => "kick",
            DrumKind::Crash => "crash",
            DrumKind::Ride => "ride",
            DrumKind::Floor => "floor",
        }
    }

    pub fn recipe(self) -> Recipe {
        match self {
            DrumKind::Snare => Recipe::Noise { decay: 5.0 },
            DrumKind::Hihat => Recipe::Noise { decay: 50.0 },
            DrumKind::Tom1 => Recipe::Tone {
                frequency: 60.0,
                decay: 5.0,
            },
            DrumKind::Tom2 => Recipe::Tone {
                frequency: 80.0,
                decay: 5.0,
            },
            DrumKind::Kick => Recipe::Thump {
                frequency: 40.0,
                decay: 4.0,
                noise_sigma: 0.6,
                noise_decay: 3.0,
            },
            DrumKind::Crash | DrumKind::Ride => Recipe::Noise { decay: 3.0 },
            DrumKind::Floor => Recipe::Tone {
                frequency: 40.0,
                decay: 5.0,
            },
        }
    }
}

impl fmt::Display for DrumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrumKind {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        DrumKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SynthError::config(format!("unsupported drum type '{s}'")))
    }
}

impl Recipe {
    pub fn render<R: Rng>(&self, duration: f64, sample_rate: u32, rng: &mut R) -> Vec<f64> {
        let len = sample_count(duration, sample_rate);
        let decay_at = |k: f64, i: usize| (-k * sample_time(i, sample_rate)).exp();
        let sine_at = |f: f64, i: usize| (2.0 * PI * f * sample_time(i, sample_rate)).sin();

        match *self {
            Recipe::Noise { decay } => white_noise(len, 1.0, rng)
                .into_iter()
                .enumerate()
                .map(|(i, n)| n * decay_at(decay, i))
                .collect(),
            Recipe::Tone { frequency, decay } => (0..len)
                .map(|i| sine_at(frequency, i) * decay_at(decay, i))
                .collect(),
            Recipe::Thump {
                frequency,
                decay,
                noise_sigma,
                noise_decay,
            } => white_noise(len, noise_sigma, rng)
                .into_iter()
                .enumerate()
                .map(|(i, n)| sine_at(frequency, i) * decay_at(decay, i) + n * decay_at(noise_decay, i))
                .collect(),
        }
    }
}

pub fn drum_sound<R: Rng>(
    kind: DrumKind,
    duration: f64,
    sample_rate: u32,
    rng: &mut R,
) -> WaveformBuffer {
    let mut samples = kind.recipe().render(duration, sample_rate, rng);
    normalize(&mut samples);
    WaveformBuffer::new(samples, sample_rate)
}
