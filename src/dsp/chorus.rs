//! Chorus effect: thickens a sound by summing delayed, attenuated copies.
//!
//! Unlike a modulated-delay chorus this one uses fixed tap offsets: copy `k`
//! (1-based) is delayed by `k · spacing` and scaled by `depth / k`.

use super::sample_count;

/// A static multi-tap chorus.
///
/// Delayed voices are zero-padded at the head. They do not wrap the tail of
/// the sound around to the start, so the first `k · spacing` seconds of voice
/// `k` are silent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chorus {
    /// Gain of the first extra voice; voice `k` gets `depth / k`.
    pub depth: f64,
    /// Number of delayed copies added to the dry signal.
    pub voices: usize,
    /// Delay between successive voices in seconds.
    pub spacing: f64,
}

impl Default for Chorus {
    fn default() -> Self {
        Chorus {
            depth: 0.3,
            voices: 2,
            spacing: 0.02,
        }
    }
}

impl Chorus {
    pub fn with_depth(depth: f64) -> Self {
        Chorus {
            depth,
            ..Chorus::default()
        }
    }

    /// Return the dry signal plus the delayed voices, same length as the input.
    /// Delayed copies start silent; nothing wraps around from the tail.
    pub fn process(&self, input: &[f64], sample_rate: u32) -> Vec<f64> {
        let mut out = input.to_vec();
        for voice in 1..=self.voices {
            let delay = sample_count(self.spacing * voice as f64, sample_rate);
            if delay >= input.len() {
                continue;
            }
            let gain = self.depth / voice as f64;
            for (o, &x) in out[delay..].iter_mut().zip(input) {
                *o += x * gain;
            }
        }
        out
    }
}

/// Chorus with the default 20 ms / 40 ms taps.
pub fn chorus(input: &[f64], depth: f64, sample_rate: u32) -> Vec<f64> {
    Chorus::with_depth(depth).process(input, sample_rate)
}
