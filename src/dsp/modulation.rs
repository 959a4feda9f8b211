//! Low-frequency modulation: time-axis vibrato and amplitude tremolo.

use std::f64::consts::PI;

use super::sample_time;

/// Read `buffer` at a fractional sample position with linear interpolation,
/// holding the first/last sample outside the buffer.
fn read_interpolated(buffer: &[f64], position: f64) -> f64 {
    let Some(&last) = buffer.last() else {
        return 0.0;
    };
    if position <= 0.0 {
        return buffer[0];
    }
    let idx = position as usize;
    if idx >= buffer.len() - 1 {
        return last;
    }
    let frac = position - idx as f64;
    buffer[idx] * (1.0 - frac) + buffer[idx + 1] * frac
}

/// LFO fine-tune: resample `buffer` along a time axis perturbed by
/// `depth · sin(2π · rate · t)` seconds.
pub fn lfo_finetune(buffer: &[f64], rate: f64, depth: f64, sample_rate: u32) -> Vec<f64> {
    let sr = sample_rate as f64;
    (0..buffer.len())
        .map(|i| {
            let t = sample_time(i, sample_rate);
            let offset = depth * (2.0 * PI * rate * t).sin();
            read_interpolated(buffer, (t + offset) * sr)
        })
        .collect()
}

/// Tremolo: multiply `buffer` in place by `1 + depth · sin(2π · rate · t)`.
pub fn tremolo(buffer: &mut [f64], rate: f64, depth: f64, sample_rate: u32) {
    for (i, s) in buffer.iter_mut().enumerate() {
        let t = sample_time(i, sample_rate);
        *s *= 1.0 + depth * (2.0 * PI * rate * t).sin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_depth_lfo_is_identity() {
        let input: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
        let out = lfo_finetune(&input, 5.0, 0.0, 1000);
        for (a, b) in input.iter().zip(&out) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn lfo_shifts_time_axis() {
        // A ramp makes the time shift directly visible in the output value.
        let input: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let out = lfo_finetune(&input, 1.0, 0.01, 1000);
        // At t = 0.25 s the LFO is at its peak: +10 samples.
        assert!((out[250] - 260.0).abs() < 1e-6, "got {}", out[250]);
        // At t = 0.75 s it is at its trough: -10 samples.
        assert!((out[750] - 740.0).abs() < 1e-6, "got {}", out[750]);
    }

    #[test]
    fn lfo_holds_edges() {
        let input = vec![3.0, 4.0, 5.0];
        assert_eq!(read_interpolated(&input, -2.0), 3.0);
        assert_eq!(read_interpolated(&input, 7.5), 5.0);
        assert_eq!(read_interpolated(&input, 0.5), 3.5);
        assert_eq!(read_interpolated(&[], 0.5), 0.0);
    }

    #[test]
    fn tremolo_modulates_amplitude() {
        let mut buf = vec![1.0; 1000];
        tremolo(&mut buf, 1.0, 0.5, 1000);
        assert!((buf[0] - 1.0).abs() < 1e-12);
        assert!((buf[250] - 1.5).abs() < 1e-9);
        assert!((buf[750] - 0.5).abs() < 1e-9);
    }
}
