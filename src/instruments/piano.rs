//! Electric-piano style keyboard voice.
//!
//! sine → decay-only ADSR → 1 kHz low-pass → LFO fine-tune → tremolo →
//! 2 kHz low-pass → chorus → normalize.

use crate::dsp::chorus::chorus;
use crate::dsp::envelope::Adsr;
use crate::dsp::filter::lowpass;
use crate::dsp::modulation::{lfo_finetune, tremolo};
use crate::dsp::normalize;
use crate::dsp::oscillator::{Shape, oscillator};
use crate::error::Result;
use crate::waveform::WaveformBuffer;

use super::check_frequency;

/// No attack; the decay takes the whole note down to 0.1 before a short release.
pub const PIANO_ENVELOPE: Adsr = Adsr {
    attack: 0.0,
    decay: 2.0,
    sustain_level: 0.1,
    release: 0.1,
};

const TONE_CUTOFF: f64 = 1000.0;
const SMOOTHING_CUTOFF: f64 = 2000.0;
const LFO_RATE: f64 = 0.1;
const LFO_DEPTH: f64 = 0.02;
const TREMOLO_RATE: f64 = 5.0;
const TREMOLO_DEPTH: f64 = 0.5;
const CHORUS_DEPTH: f64 = 0.3;

pub fn piano_note(frequency: f64, duration: f64, sample_rate: u32) -> Result<WaveformBuffer> {
    check_frequency(frequency)?;

    let mut samples = oscillator(frequency, duration, sample_rate, Shape::Sine);
    PIANO_ENVELOPE.apply(&mut samples, sample_rate);
    let samples = lowpass(&samples, TONE_CUTOFF, sample_rate)?;
    let mut samples = lfo_finetune(&samples, LFO_RATE, LFO_DEPTH, sample_rate);
    tremolo(&mut samples, TREMOLO_RATE, TREMOLO_DEPTH, sample_rate);
    // de-harshen
    let samples = lowpass(&samples, SMOOTHING_CUTOFF, sample_rate)?;
    let mut samples = chorus(&samples, CHORUS_DEPTH, sample_rate);

    normalize(&mut samples);
    Ok(WaveformBuffer::new(samples, sample_rate))
}
