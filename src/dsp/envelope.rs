//! ADSR envelope applied to a finished buffer.

/// Linear ramp of `n` points from `start` to `end`, both endpoints included.
fn ramp(start: f64, end: f64, n: usize) -> impl Iterator<Item = f64> {
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |k| start + (end - start) * (k as f64 / last))
}

/// Segment lengths in samples. They always sum to the buffer length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments {
    pub attack: usize,
    pub decay: usize,
    pub sustain: usize,
    pub release: usize,
}

impl Segments {
    pub fn total(&self) -> usize {
        self.attack + self.decay + self.sustain + self.release
    }
}

/// ADSR envelope with linear attack/decay/release curves.
///
/// The sustain segment fills whatever the other three leave of the buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    /// Attack time in seconds.
    pub attack: f64,
    /// Decay time in seconds.
    pub decay: f64,
    /// Sustain level [0, 1].
    pub sustain_level: f64,
    /// Release time in seconds.
    pub release: f64,
}

impl Adsr {
    pub fn new(attack: f64, decay: f64, sustain_level: f64, release: f64) -> Self {
        Adsr {
            attack,
            decay,
            sustain_level,
            release,
        }
    }

    /// Split a buffer of `len` samples into the four segments.
    ///
    /// When attack + decay + release don't fit, decay is shortened first,
    /// then release, then attack.
    pub fn segments(&self, len: usize, sample_rate: u32) -> Segments {
        let samples = |secs: f64| {
            if secs.is_finite() && secs > 0.0 {
                ((secs * sample_rate as f64).round() as usize).min(len)
            } else {
                0
            }
        };
        let mut attack = samples(self.attack);
        let mut decay = samples(self.decay);
        let mut release = samples(self.release);

        let mut excess = (attack + decay + release).saturating_sub(len);
        for seg in [&mut decay, &mut release, &mut attack] {
            let cut = excess.min(*seg);
            *seg -= cut;
            excess -= cut;
        }

        Segments {
            attack,
            decay,
            sustain: len - attack - decay - release,
            release,
        }
    }

    /// The envelope curve for a buffer of `len` samples.
    pub fn curve(&self, len: usize, sample_rate: u32) -> Vec<f64> {
        let seg = self.segments(len, sample_rate);
        let level = self.sustain_level.clamp(0.0, 1.0);
        let mut curve = Vec::with_capacity(len);
        curve.extend(ramp(0.0, 1.0, seg.attack));
        curve.extend(ramp(1.0, level, seg.decay));
        curve.extend(std::iter::repeat_n(level, seg.sustain));
        curve.extend(ramp(level, 0.0, seg.release));
        curve
    }

    /// Multiply `buffer` in place by the envelope.
    pub fn apply(&self, buffer: &mut [f64], sample_rate: u32) {
        let curve = self.curve(buffer.len(), sample_rate);
        for (s, g) in buffer.iter_mut().zip(curve) {
            *s *= g;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn segments_fill_buffer() {
        let env = Adsr::new(0.1, 0.3, 0.7, 0.4);
        let seg = env.segments(44100, 44100);
        assert_eq!(seg.attack, 4410);
        assert_eq!(seg.decay, 13230);
        assert_eq!(seg.release, 17640);
        assert_eq!(seg.sustain, 44100 - 4410 - 13230 - 17640);
        assert_eq!(seg.total(), 44100);
    }

    #[test]
    fn decay_shrinks_first() {
        // 2s decay in a 2s buffer with 0.1s release
        let env = Adsr::new(0.0, 2.0, 0.1, 0.1);
        let seg = env.segments(2000, 1000);
        assert_eq!(seg.attack, 0);
        assert_eq!(seg.release, 100);
        assert_eq!(seg.decay, 1900);
        assert_eq!(seg.sustain, 0);
    }

    #[test]
    fn release_shrinks_after_decay() {
        let env = Adsr::new(0.2, 0.5, 0.5, 1.0);
        let seg = env.segments(1000, 1000);
        assert_eq!(seg.decay, 0);
        assert_eq!(seg.attack, 200);
        assert_eq!(seg.release, 800);
        assert_eq!(seg.total(), 1000);
    }

    #[test]
    fn no_attack_starts_at_full_level() {
        let env = Adsr::new(0.0, 0.5, 0.1, 0.1);
        let curve = env.curve(1000, 1000);
        assert_eq!(curve[0], 1.0);
        assert!((curve[499] - 0.1).abs() < 1e-12);
        assert_eq!(*curve.last().unwrap(), 0.0);
    }

    #[test]
    fn apply_scales_buffer() {
        let env = Adsr::new(0.1, 0.1, 0.5, 0.1);
        let mut buf = vec![1.0; 1000];
        env.apply(&mut buf, 1000);
        assert_eq!(buf[0], 0.0);
        assert_eq!(buf[99], 1.0);
        assert_eq!(buf[500], 0.5);
        assert_eq!(buf[999], 0.0);
    }

    proptest! {
        #[test]
        fn curve_shape_per_segment(
            attack in 0.0f64..1.0,
            decay in 0.0f64..1.0,
            level in 0.0f64..=1.0,
            release in 0.0f64..1.0,
            len in 0usize..3000,
        ) {
            let env = Adsr::new(attack, decay, level, release);
            let seg = env.segments(len, 1000);
            let curve = env.curve(len, 1000);
            prop_assert_eq!(seg.total(), len);
            prop_assert_eq!(curve.len(), len);

            let (a, rest) = curve.split_at(seg.attack);
            let (d, rest) = rest.split_at(seg.decay);
            let (s, r) = rest.split_at(seg.sustain);
            prop_assert!(a.windows(2).all(|w| w[1] >= w[0]));
            prop_assert!(d.windows(2).all(|w| w[1] <= w[0] + 1e-12));
            prop_assert!(s.iter().all(|&x| x == level));
            prop_assert!(r.windows(2).all(|w| w[1] <= w[0] + 1e-12));
        }
    }
}
