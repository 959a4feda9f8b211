//! Additive bass: a fundamental plus three harmonics under an ADSR.

use crate::dsp::envelope::Adsr;
use crate::dsp::normalize;
use crate::dsp::oscillator::{Oscillator, Shape};
use crate::error::Result;
use crate::waveform::WaveformBuffer;

use super::check_frequency;

/// (multiple of the fundamental, amplitude)
const HARMONICS: [(f64, f64); 4] = [(1.0, 1.0), (2.0, 0.6), (3.0, 0.4), (4.0, 0.2)];

/// Attack 0.1 s, decay 0.3 s to 0.7, release 0.4 s. Notes shorter than
/// 0.8 s leave no sustain and start losing decay.
pub const BASS_ENVELOPE: Adsr = Adsr {
    attack: 0.1,
    decay: 0.3,
    sustain_level: 0.7,
    release: 0.4,
};

pub fn bass_note(frequency: f64, duration: f64, sample_rate: u32) -> Result<WaveformBuffer> {
    check_frequency(frequency)?;

    let mut samples = HARMONICS.iter().fold(Vec::new(), |mut acc, &(multiple, amp)| {
        let partial = Oscillator::new(Shape::Sine, frequency * multiple, sample_rate).render(duration);
        if acc.is_empty() {
            acc = vec![0.0; partial.len()];
        }
        for (a, p) in acc.iter_mut().zip(partial) {
            *a += amp * p;
        }
        acc
    });

    BASS_ENVELOPE.apply(&mut samples, sample_rate);
    normalize(&mut samples);
    Ok(WaveformBuffer::new(samples, sample_rate))
}
