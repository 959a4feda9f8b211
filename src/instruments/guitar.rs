//! Strummed guitar chords: one Karplus-Strong string per note, staggered
//! onsets, then a body-resonance convolution.

use rand::Rng;

use crate::dsp::convolution::BodyResonance;
use crate::dsp::pluck::karplus_strong;
use crate::dsp::{normalize, sample_count};
use crate::error::{Result, SynthError};
use crate::waveform::WaveformBuffer;

/// Default onset offset between strings.
pub const STRUM_DELAY: f64 = 0.03;
/// Default string damping.
pub const DAMPING: f64 = 0.995;

/// Strum `frequencies` in order, string `i` starting `i · strum_delay`
/// seconds after the first.
pub fn strum_chord<R: Rng>(
    frequencies: &[f64],
    duration: f64,
    sample_rate: u32,
    strum_delay: f64,
    damping: f64,
    rng: &mut R,
) -> Result<WaveformBuffer> {
    if frequencies.is_empty() {
        return Err(SynthError::config("a guitar chord needs at least one string"));
    }

    let len = sample_count(duration, sample_rate);
    let mut chord = vec![0.0; len];
    for (i, &frequency) in frequencies.iter().enumerate() {
        let string = karplus_strong(frequency, duration, sample_rate, damping, rng)?;
        let onset = sample_count(i as f64 * strum_delay, sample_rate);
        if onset >= len {
            continue;
        }
        for (c, s) in chord[onset..].iter_mut().zip(string) {
            *c += s;
        }
    }

    let strings = frequencies.len() as f64;
    chord.iter_mut().for_each(|s| *s /= strings);

    let mut samples = BodyResonance::default().apply(&chord, sample_rate);
    normalize(&mut samples);
    Ok(WaveformBuffer::new(samples, sample_rate))
}
