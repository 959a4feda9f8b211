//! Fixed-capacity delay line backed by a ring buffer.

/// A delay line of constant length addressed through a wrapping cursor.
///
/// Logically it behaves like a queue that always holds `len()` samples:
/// [`DelayLine::advance`] drops the oldest sample and appends a new one
/// without moving any data.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f64>,
    cursor: usize,
}

impl DelayLine {
    /// Create a delay line holding `samples` in order, oldest first.
    pub fn from_samples(samples: Vec<f64>) -> Self {
        DelayLine {
            buffer: samples,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The sample at logical position `offset` (0 = oldest).
    #[inline]
    pub fn get(&self, offset: usize) -> f64 {
        self.buffer[(self.cursor + offset) % self.buffer.len()]
    }

    /// The oldest sample.
    #[inline]
    pub fn head(&self) -> f64 {
        self.buffer[self.cursor]
    }

    /// Drop the oldest sample and append `sample` at the tail.
    #[inline]
    pub fn advance(&mut self, sample: f64) {
        self.buffer[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor == self.buffer.len() {
            self.cursor = 0;
        }
    }

    /// Logical contents, oldest first.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn behaves_like_shifting_queue() {
        let mut line = DelayLine::from_samples(vec![1.0, 2.0, 3.0]);
        let mut reference = vec![1.0, 2.0, 3.0];
        for step in 0..10 {
            assert_eq!(line.head(), reference[0]);
            assert_eq!(line.to_vec(), reference);
            let next = step as f64 * 10.0;
            line.advance(next);
            reference.remove(0);
            reference.push(next);
        }
    }

    #[test]
    fn get_wraps_around() {
        let mut line = DelayLine::from_samples(vec![0.0, 1.0]);
        line.advance(5.0);
        assert_eq!(line.get(0), 1.0);
        assert_eq!(line.get(1), 5.0);
        assert_eq!(line.len(), 2);
    }
}
