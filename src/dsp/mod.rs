//! DSP primitives: pure Rust buffer-in/buffer-out synthesis building blocks.
//!
//! Everything here works on whole `f64` buffers at a fixed sample rate.
//! Primitives never normalize on their own (except the body-resonance
//! convolution); instruments call [`normalize`] once at the end of their chain.

pub mod chorus;
pub mod convolution;
pub mod delay;
pub mod envelope;
pub mod filter;
pub mod modulation;
pub mod noise;
pub mod oscillator;
pub mod pluck;
pub mod renderer;

/// Number of samples covering `seconds` at `sample_rate`, rounded to nearest.
pub fn sample_count(seconds: f64, sample_rate: u32) -> usize {
    if seconds <= 0.0 || !seconds.is_finite() {
        return 0;
    }
    (seconds * sample_rate as f64).round() as usize
}

/// Time in seconds of sample `index`.
#[inline]
pub fn sample_time(index: usize, sample_rate: u32) -> f64 {
    index as f64 / sample_rate as f64
}

/// Largest absolute sample value, 0.0 for an empty buffer.
pub fn peak(buffer: &[f64]) -> f64 {
    buffer.iter().fold(0.0_f64, |m, &s| m.max(s.abs()))
}

/// Scale `buffer` in place so its peak absolute amplitude is 1.0.
///
/// A silent buffer (zero or non-finite peak) is left untouched instead of
/// being divided by zero. Returns the peak measured before scaling.
pub fn normalize(buffer: &mut [f64]) -> f64 {
    let p = peak(buffer);
    if p == 0.0 || !p.is_finite() {
        return 0.0;
    }
    for s in buffer.iter_mut() {
        *s /= p;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_scales_to_unit_peak() {
        let mut buf = vec![0.25, -0.5, 0.1];
        let p = normalize(&mut buf);
        assert_eq!(p, 0.5);
        assert_eq!(peak(&buf), 1.0);
        assert_eq!(buf[1], -1.0);
    }

    #[test]
    fn normalize_leaves_silence_alone() {
        let mut buf = vec![0.0; 64];
        assert_eq!(normalize(&mut buf), 0.0);
        assert!(buf.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn sample_count_rounds() {
        assert_eq!(sample_count(1.0, 44100), 44100);
        assert_eq!(sample_count(0.5, 44100), 22050);
        assert_eq!(sample_count(-1.0, 44100), 0);
    }
}
