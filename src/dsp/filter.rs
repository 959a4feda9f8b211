//! Low-pass filtering: RBJ biquads cascaded into a 4th-order Butterworth.

use std::f64::consts::PI;

use crate::error::{Result, SynthError};

/// Q values of the two second-order sections of a 4th-order Butterworth:
/// `1 / (2 cos(π/8))` and `1 / (2 cos(3π/8))`.
const BUTTERWORTH4_Q: [f64; 2] = [0.541_196_100_146_197, 1.306_562_964_876_376_4];

/// A low-pass biquad IIR filter (2nd order).
///
/// Implements the standard Direct Form II Transposed structure.
/// Coefficient formulas from the Audio EQ Cookbook (Robert Bristow-Johnson).
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    // State (Direct Form II Transposed)
    z1: f64,
    z2: f64,
}

impl BiquadFilter {
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: u32) -> Self {
        let w0 = 2.0 * PI * cutoff / sample_rate as f64;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let b1 = 1.0 - cos_w0;
        let b0 = b1 / 2.0;
        let b2 = b0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        // Normalize by a0
        BiquadFilter {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    /// Process a single sample through the filter.
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Reset filter state.
    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }
}

/// 4th-order Butterworth low-pass: two biquad sections in series.
#[derive(Debug, Clone)]
pub struct ButterworthLowpass {
    sections: [BiquadFilter; 2],
}

impl ButterworthLowpass {
    /// `cutoff` must lie strictly between 0 Hz and Nyquist.
    pub fn new(cutoff: f64, sample_rate: u32) -> Result<Self> {
        let nyquist = sample_rate as f64 / 2.0;
        if !(cutoff > 0.0 && cutoff < nyquist) {
            return Err(SynthError::config(format!(
                "low-pass cutoff {cutoff} Hz must be between 0 and Nyquist ({nyquist} Hz)"
            )));
        }
        Ok(ButterworthLowpass {
            sections: BUTTERWORTH4_Q.map(|q| BiquadFilter::lowpass(cutoff, q, sample_rate)),
        })
    }

    pub fn process(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input, |x, section| section.process(x))
    }

    pub fn reset(&mut self) {
        self.sections.iter_mut().for_each(BiquadFilter::reset);
    }
}

/// Causal 4th-order Butterworth low-pass over a whole buffer, starting from
/// zero state.
pub fn lowpass(buffer: &[f64], cutoff: f64, sample_rate: u32) -> Result<Vec<f64>> {
    let mut filter = ButterworthLowpass::new(cutoff, sample_rate)?;
    Ok(buffer.iter().map(|&x| filter.process(x)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::{Shape, oscillator};
    use crate::dsp::peak;

    #[test]
    fn lowpass_passes_dc() {
        let out = lowpass(&vec![1.0; 4000], 1000.0, 44100).unwrap();
        let last = *out.last().unwrap();
        assert!((last - 1.0).abs() < 1e-6, "Lowpass should pass DC, got {last}");
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let input = oscillator(10_000.0, 0.1, 44100, Shape::Sine);
        let out = lowpass(&input, 200.0, 44100).unwrap();
        // skip transient
        let tail = peak(&out[1000..]);
        assert!(tail < 1e-3, "Lowpass@200Hz should crush 10kHz, got {tail}");
    }

    #[test]
    fn cutoff_is_minus_3db() {
        let input = oscillator(1000.0, 0.5, 44100, Shape::Sine);
        let out = lowpass(&input, 1000.0, 44100).unwrap();
        let gain = peak(&out[10_000..]);
        assert!(
            (gain - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.02,
            "Butterworth gain at cutoff should be ~0.707, got {gain}"
        );
    }

    #[test]
    fn causal_from_zero_state() {
        let mut input = vec![0.0; 100];
        input[50] = 1.0;
        let out = lowpass(&input, 2000.0, 44100).unwrap();
        assert!(out[..50].iter().all(|&s| s == 0.0));
        assert!(out[50] != 0.0);
    }

    #[test]
    fn rejects_cutoff_above_nyquist() {
        assert!(lowpass(&[0.0; 4], 2000.0, 4000).is_err());
        assert!(lowpass(&[0.0; 4], 0.0, 44100).is_err());
    }

    #[test]
    fn reset_clears_state() {
        let mut f = ButterworthLowpass::new(500.0, 8000).unwrap();
        for _ in 0..10 {
            f.process(1.0);
        }
        f.reset();
        assert_eq!(f.process(0.0), 0.0);
    }
}
