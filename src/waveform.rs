//! Immutable sample buffers shared between the sound bank, the renderer and
//! live playback.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A finished mono buffer at a fixed sample rate.
///
/// Cloning is cheap: the samples live behind an `Arc` and are never mutated
/// once the buffer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformBuffer {
    samples: Arc<[f64]>,
    sample_rate: u32,
}

impl WaveformBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        WaveformBuffer {
            samples: samples.into(),
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn peak(&self) -> f64 {
        crate::dsp::peak(&self.samples)
    }

    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| s as f32).collect()
    }

    /// 16-bit PCM, clipping anything outside [-1, 1].
    pub fn to_i16(&self) -> Vec<i16> {
        self.samples.iter().map(|&s| to_pcm16(s)).collect()
    }
}

#[inline]
pub(crate) fn to_pcm16(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_conversion_clips() {
        let buf = WaveformBuffer::new(vec![0.0, 1.0, -1.0, 2.0, 0.5], 8000);
        assert_eq!(buf.to_i16(), vec![0, 32767, -32767, 32767, 16383]);
    }

    #[test]
    fn clones_share_samples() {
        let a = WaveformBuffer::new(vec![0.1; 10], 8000);
        let b = a.clone();
        assert!(std::ptr::eq(a.samples().as_ptr(), b.samples().as_ptr()));
        assert_eq!(b.duration(), 10.0 / 8000.0);
    }
}
