//! Live, key-triggered playback of a sound bank.

pub mod device;
pub mod keymap;
pub mod pool;
pub mod session;

pub use device::{AudioOutput, Clip, PlaybackChannel, SampleFormat};
pub use keymap::{DEFAULT_LAYOUT, KeyMapping, KeyPrompter};
pub use pool::{ChannelPool, DEFAULT_CHANNELS};
pub use session::{KeyOutcome, KeySender, Session, SessionState};

#[cfg(feature = "audio")]
pub use device::CpalOutput;
