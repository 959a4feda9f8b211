//! Noise sources.

use std::f64::consts::PI;

use rand::Rng;

/// One sample from N(0, σ²) using the Box–Muller transform.
pub fn gaussian<R: Rng>(rng: &mut R, sigma: f64) -> f64 {
    // u1 in (0, 1] keeps ln() finite
    let u1: f64 = 1.0 - rng.gen_range(0.0..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// `len` samples of Gaussian white noise with standard deviation `sigma`.
pub fn white_noise<R: Rng>(len: usize, sigma: f64, rng: &mut R) -> Vec<f64> {
    (0..len).map(|_| gaussian(rng, sigma)).collect()
}
