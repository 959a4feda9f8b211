//! Karplus-Strong plucked string.
//!
//! A noise burst circulates through a delay line of one period; every pass
//! averages neighbouring samples and scales them by the damping factor,
//! which acts as a damped feedback comb filter.

use rand::Rng;

use super::delay::DelayLine;
use super::sample_count;
use crate::error::{Result, SynthError};

/// Synthesize `duration` seconds of a plucked string at `frequency`.
///
/// The delay line holds `round(sample_rate / frequency)` samples of uniform
/// noise in [-1, 1] drawn from `rng`. `damping` must be in (0, 1); values
/// near 1 ring longer.
pub fn karplus_strong<R: Rng>(
    frequency: f64,
    duration: f64,
    sample_rate: u32,
    damping: f64,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(SynthError::config(format!(
            "string frequency must be positive, got {frequency}"
        )));
    }
    if !(damping > 0.0 && damping < 1.0) {
        return Err(SynthError::config(format!(
            "damping must be in (0, 1), got {damping}"
        )));
    }
    let period = (sample_rate as f64 / frequency).round() as usize;
    if period < 2 {
        return Err(SynthError::config(format!(
            "string frequency {frequency} Hz is too high for {sample_rate} Hz"
        )));
    }

    let noise = (0..period).map(|_| rng.gen_range(-1.0..=1.0)).collect();
    let mut line = DelayLine::from_samples(noise);

    let len = sample_count(duration, sample_rate);
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        let head = line.head();
        out.push(head);
        line.advance(damping * 0.5 * (head + line.get(1)));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn energy(window: &[f64]) -> f64 {
        window.iter().map(|s| s * s).sum()
    }

    #[test]
    fn output_length_is_exact() {
        let mut rng = StdRng::seed_from_u64(1);
        let out = karplus_strong(110.0, 0.37, 44100, 0.995, &mut rng).unwrap();
        assert_eq!(out.len(), (44100.0_f64 * 0.37).round() as usize);
    }

    #[test]
    fn first_period_is_the_noise_seed() {
        let mut rng = StdRng::seed_from_u64(7);
        let out = karplus_strong(441.0, 0.1, 44100, 0.9, &mut rng).unwrap();
        assert!(out[..100].iter().all(|s| (-1.0..=1.0).contains(s)));
        // Second period is the damped average of the first
        let expected = 0.9 * 0.5 * (out[0] + out[1]);
        assert!((out[100] - expected).abs() < 1e-12);
    }

    #[test]
    fn same_seed_same_string() {
        let a = karplus_strong(196.0, 0.2, 44100, 0.995, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = karplus_strong(196.0, 0.2, 44100, 0.995, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn matches_shifting_reference() {
        let mut rng = StdRng::seed_from_u64(11);
        let out = karplus_strong(2000.0, 0.01, 8000, 0.99, &mut rng).unwrap();

        let mut rng = StdRng::seed_from_u64(11);
        let mut buf: Vec<f64> = (0..4).map(|_| rng.gen_range(-1.0..=1.0)).collect();
        for &s in &out {
            assert_eq!(s, buf[0]);
            let avg = 0.99 * 0.5 * (buf[0] + buf[1]);
            buf.remove(0);
            buf.push(avg);
        }
    }

    #[test]
    fn energy_decays_over_windows() {
        let mut rng = StdRng::seed_from_u64(5);
        let out = karplus_strong(220.0, 2.0, 44100, 0.996, &mut rng).unwrap();
        let energies: Vec<f64> = out.chunks(4410).map(energy).collect();
        for pair in energies.windows(2) {
            assert!(pair[1] < pair[0], "energy should decay: {energies:?}");
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(karplus_strong(0.0, 1.0, 44100, 0.99, &mut rng).is_err());
        assert!(karplus_strong(440.0, 1.0, 44100, 1.0, &mut rng).is_err());
        assert!(karplus_strong(30_000.0, 1.0, 44100, 0.99, &mut rng).is_err());
    }
}
