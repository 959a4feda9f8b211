//! Impulse-response convolution used for instrument body resonance.

use std::f64::consts::PI;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use super::{normalize, sample_count, sample_time};

/// Below this many multiply-adds the direct form beats the FFT.
const DIRECT_LIMIT: usize = 1 << 16;

/// Synthetic body response: an exponentially decaying sinusoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyResonance {
    /// Impulse length in seconds.
    pub duration: f64,
    /// Exponential decay rate `k` in `e^(-k·t)`.
    pub decay: f64,
    /// Resonant frequency in Hz.
    pub frequency: f64,
}

impl Default for BodyResonance {
    fn default() -> Self {
        BodyResonance {
            duration: 0.2,
            decay: 20.0,
            frequency: 120.0,
        }
    }
}

impl BodyResonance {
    pub fn impulse(&self, sample_rate: u32) -> Vec<f64> {
        (0..sample_count(self.duration, sample_rate))
            .map(|i| {
                let t = sample_time(i, sample_rate);
                (-self.decay * t).exp() * (2.0 * PI * self.frequency * t).sin()
            })
            .collect()
    }

    /// Convolve `signal` with the body impulse, keep the first `signal.len()`
    /// samples and renormalize to unit peak.
    pub fn apply(&self, signal: &[f64], sample_rate: u32) -> Vec<f64> {
        let mut out = convolve(signal, &self.impulse(sample_rate));
        normalize(&mut out);
        out
    }
}

/// Full linear convolution of `signal` with `ir`, truncated to the length of
/// `signal`.
pub fn convolve(signal: &[f64], ir: &[f64]) -> Vec<f64> {
    if signal.is_empty() || ir.is_empty() {
        return vec![0.0; signal.len()];
    }
    if signal.len().saturating_mul(ir.len()) <= DIRECT_LIMIT {
        convolve_direct(signal, ir)
    } else {
        convolve_fft(signal, ir)
    }
}

fn convolve_direct(signal: &[f64], ir: &[f64]) -> Vec<f64> {
    (0..signal.len())
        .map(|n| {
            let taps = ir.len().min(n + 1);
            (0..taps).map(|k| ir[k] * signal[n - k]).sum::<f64>()
        })
        .collect()
}

fn convolve_fft(signal: &[f64], ir: &[f64]) -> Vec<f64> {
    let size = (signal.len() + ir.len() - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(size);
    let inverse = planner.plan_fft_inverse(size);

    let padded = |x: &[f64]| -> Vec<Complex<f64>> {
        let mut v: Vec<Complex<f64>> = x.iter().map(|&s| Complex::new(s, 0.0)).collect();
        v.resize(size, Complex::new(0.0, 0.0));
        v
    };
    let mut a = padded(signal);
    let mut b = padded(ir);
    forward.process(&mut a);
    forward.process(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x *= *y;
    }
    inverse.process(&mut a);

    // rustfft leaves the inverse unscaled
    let scale = 1.0 / size as f64;
    a[..signal.len()].iter().map(|c| c.re * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identity_impulse() {
        let signal = vec![0.5, -1.0, 0.25, 0.0];
        assert_eq!(convolve(&signal, &[1.0]), signal);
    }

    #[test]
    fn truncates_to_input_length() {
        let out = convolve(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn fft_matches_direct() {
        let signal: Vec<f64> = (0..3000).map(|i| ((i * 37) % 101) as f64 / 50.0 - 1.0).collect();
        let ir = BodyResonance::default().impulse(8000);
        let direct = convolve_direct(&signal, &ir);
        let fft = convolve_fft(&signal, &ir);
        assert_eq!(direct.len(), fft.len());
        for (d, f) in direct.iter().zip(&fft) {
            assert_abs_diff_eq!(*d, *f, epsilon = 1e-9);
        }
    }

    #[test]
    fn body_impulse_shape() {
        let ir = BodyResonance::default().impulse(44100);
        assert_eq!(ir.len(), 8820);
        assert_eq!(ir[0], 0.0);
        // Decays: last quarter is much quieter than the first
        let head = crate::dsp::peak(&ir[..2205]);
        let tail = crate::dsp::peak(&ir[6615..]);
        assert!(tail < head * 0.1);
    }

    #[test]
    fn apply_normalizes() {
        let mut signal = vec![0.0; 2000];
        signal[10] = 0.3;
        let out = BodyResonance::default().apply(&signal, 8000);
        assert_eq!(out.len(), 2000);
        assert_abs_diff_eq!(crate::dsp::peak(&out), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn apply_keeps_silence() {
        let out = BodyResonance::default().apply(&[0.0; 500], 8000);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
