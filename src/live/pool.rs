//! Fixed-size polyphony pool.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::device::{Clip, PlaybackChannel};

/// Default polyphony ceiling.
pub const DEFAULT_CHANNELS: usize = 16;

/// N playback channels shared by every key-event handler.
///
/// Finding a free channel and starting a clip on it happen under one lock,
/// so concurrent dispatches never land on the same channel. There is no
/// voice stealing: with every channel busy the clip is dropped.
pub struct ChannelPool {
    channels: Mutex<Vec<Arc<dyn PlaybackChannel>>>,
}

impl ChannelPool {
    pub fn new(channels: Vec<Arc<dyn PlaybackChannel>>) -> Self {
        Self {
            channels: Mutex::new(channels),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn busy_count(&self) -> usize {
        self.channels.lock().iter().filter(|c| c.is_busy()).count()
    }

    /// Play `clip` on the first free channel and return its index, or `None`
    /// when the pool is saturated.
    pub fn dispatch(&self, clip: &Clip) -> Option<usize> {
        let channels = self.channels.lock();
        let Some(index) = channels.iter().position(|c| !c.is_busy()) else {
            warn!("All {} channels busy, dropping note", channels.len());
            return None;
        };
        channels[index].play(clip.clone());
        debug!("Dispatched {} samples to channel {index}", clip.len());
        Some(index)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    /// A channel that stays busy until told otherwise.
    #[derive(Default)]
    pub(crate) struct LatchedChannel {
        pub busy: AtomicBool,
        pub plays: AtomicUsize,
    }

    impl LatchedChannel {
        pub fn release(&self) {
            self.busy.store(false, Ordering::SeqCst);
        }
    }

    impl PlaybackChannel for LatchedChannel {
        fn play(&self, _clip: Clip) {
            self.busy.store(true, Ordering::SeqCst);
            self.plays.fetch_add(1, Ordering::SeqCst);
        }

        fn is_busy(&self) -> bool {
            self.busy.load(Ordering::SeqCst)
        }
    }

    fn pool(n: usize) -> (ChannelPool, Vec<Arc<LatchedChannel>>) {
        let raw: Vec<Arc<LatchedChannel>> = (0..n).map(|_| Arc::default()).collect();
        let channels = raw
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn PlaybackChannel>)
            .collect();
        (ChannelPool::new(channels), raw)
    }

    fn clip() -> Clip {
        Clip::F32(vec![0.0; 4].into())
    }

    #[test]
    fn first_free_channel_wins() {
        let (pool, raw) = pool(3);
        assert_eq!(pool.dispatch(&clip()), Some(0));
        assert_eq!(pool.dispatch(&clip()), Some(1));
        raw[0].release();
        assert_eq!(pool.dispatch(&clip()), Some(0));
        assert_eq!(pool.dispatch(&clip()), Some(2));
        assert_eq!(pool.dispatch(&clip()), None);
        assert_eq!(pool.busy_count(), 3);
    }

    #[test]
    fn empty_pool_drops_everything() {
        let (pool, _) = pool(0);
        assert!(pool.is_empty());
        assert_eq!(pool.dispatch(&clip()), None);
    }

    #[test]
    fn concurrent_dispatch_never_shares_a_channel() {
        const N: usize = 8;
        for _ in 0..20 {
            let (pool, raw) = pool(N);
            let pool = Arc::new(pool);
            let barrier = Arc::new(Barrier::new(N + 1));

            let handles: Vec<_> = (0..=N)
                .map(|_| {
                    let pool = Arc::clone(&pool);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        pool.dispatch(&clip())
                    })
                })
                .collect();
            let results: Vec<Option<usize>> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();

            let played: HashSet<usize> = results.iter().flatten().copied().collect();
            assert_eq!(played.len(), N);
            assert_eq!(results.iter().filter(|r| r.is_none()).count(), 1);
            assert!(raw.iter().all(|c| c.plays.load(Ordering::SeqCst) == 1));
        }
    }
}
