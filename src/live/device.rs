//! Audio output abstraction for live playback.
//!
//! A device hands out a fixed set of [`PlaybackChannel`]s. Each channel plays
//! one [`Clip`] at a time and reports itself free again once the clip ends;
//! that release happens on the device's side, never on the caller's.

use std::sync::Arc;

use crate::error::Result;
use crate::waveform::WaveformBuffer;

/// Sample encodings an output device may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    F32,
    I16,
}

/// A waveform already converted to a device's sample format. Cloning is cheap.
#[derive(Debug, Clone, PartialEq)]
pub enum Clip {
    F32(Arc<[f32]>),
    I16(Arc<[i16]>),
}

impl Clip {
    pub fn from_waveform(waveform: &WaveformBuffer, format: SampleFormat) -> Self {
        match format {
            SampleFormat::F32 => Clip::F32(waveform.to_f32().into()),
            SampleFormat::I16 => Clip::I16(waveform.to_i16().into()),
        }
    }

    pub fn format(&self) -> SampleFormat {
        match self {
            Clip::F32(_) => SampleFormat::F32,
            Clip::I16(_) => SampleFormat::I16,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Clip::F32(s) => s.len(),
            Clip::I16(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The clip as `f32` in [-1, 1], whatever its storage.
    pub fn to_f32(&self) -> Arc<[f32]> {
        match self {
            Clip::F32(s) => Arc::clone(s),
            Clip::I16(s) => s.iter().map(|&v| v as f32 / i16::MAX as f32).collect(),
        }
    }
}

/// One voice of an output device.
pub trait PlaybackChannel: Send + Sync {
    /// Start playing `clip`. The channel must report busy before this
    /// returns, and must not block until playback ends.
    fn play(&self, clip: Clip);

    fn is_busy(&self) -> bool;
}

/// An output device that can be opened with a fixed number of channels.
pub trait AudioOutput: Send {
    fn sample_format(&self) -> SampleFormat;

    fn initialize(
        &mut self,
        sample_rate: u32,
        channel_count: usize,
    ) -> Result<Vec<Arc<dyn PlaybackChannel>>>;

    /// Release the device. Clips still sounding may be cut off.
    fn teardown(&mut self);
}

#[cfg(feature = "audio")]
pub use self::cpal_backend::CpalOutput;

#[cfg(feature = "audio")]
mod cpal_backend {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread::JoinHandle;

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use crossbeam_channel::{Receiver, Sender, bounded};
    use parking_lot::Mutex;
    use tracing::{debug, error, info};

    use super::{AudioOutput, Clip, PlaybackChannel, SampleFormat};
    use crate::error::{Result, SynthError};

    /// A voice mixed into the shared output stream by the audio callback.
    #[derive(Default)]
    struct CpalVoice {
        busy: AtomicBool,
        playing: Mutex<Option<(Arc<[f32]>, usize)>>,
    }

    impl PlaybackChannel for CpalVoice {
        fn play(&self, clip: Clip) {
            self.busy.store(true, Ordering::Release);
            *self.playing.lock() = Some((clip.to_f32(), 0));
        }

        fn is_busy(&self) -> bool {
            self.busy.load(Ordering::Acquire)
        }
    }

    impl CpalVoice {
        /// Add this voice's next `frames` samples into `out` (interleaved,
        /// `channels` wide), freeing the voice when its clip is exhausted.
        fn mix_into(&self, out: &mut [f32], channels: usize) {
            // never wait on the audio thread; a voice being handed a clip
            // simply starts one callback later
            let Some(mut slot) = self.playing.try_lock() else {
                return;
            };
            let Some((samples, position)) = slot.as_mut() else {
                return;
            };
            for frame in out.chunks_mut(channels) {
                let Some(&s) = samples.get(*position) else {
                    break;
                };
                frame.iter_mut().for_each(|o| *o += s);
                *position += 1;
            }
            if *position >= samples.len() {
                *slot = None;
                self.busy.store(false, Ordering::Release);
            }
        }
    }

    /// The default cpal output device, opened as an `f32` stream.
    ///
    /// cpal streams are not `Send`, so the stream is created and kept alive
    /// on its own thread until teardown.
    #[derive(Default)]
    pub struct CpalOutput {
        quit: Option<Sender<()>>,
        thread: Option<JoinHandle<()>>,
    }

    impl CpalOutput {
        pub fn new() -> Self {
            Self::default()
        }

        fn run_stream(
            sample_rate: u32,
            voices: Vec<Arc<CpalVoice>>,
            ready: Sender<Result<()>>,
            quit: Receiver<()>,
        ) {
            let host = cpal::default_host();
            let Some(device) = host.default_output_device() else {
                let _ = ready.send(Err(SynthError::Audio(
                    "default output device is not available".into(),
                )));
                return;
            };
            let config = cpal::StreamConfig {
                channels: 1,
                sample_rate: cpal::SampleRate(sample_rate),
                buffer_size: cpal::BufferSize::Default,
            };
            let stream = device.build_output_stream(
                &config,
                move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    out.fill(0.0);
                    for voice in &voices {
                        voice.mix_into(out, 1);
                    }
                    out.iter_mut().for_each(|s| *s = s.clamp(-1.0, 1.0));
                },
                |e| error!("Audio stream error: {e}"),
                None,
            );
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready.send(Err(SynthError::Audio(e.to_string())));
                    return;
                }
            };
            if let Err(e) = stream.play() {
                let _ = ready.send(Err(SynthError::Audio(e.to_string())));
                return;
            }
            let _ = ready.send(Ok(()));
            // parks until teardown drops or signals the sender
            let _ = quit.recv();
            debug!("Closing audio stream");
        }
    }

    impl AudioOutput for CpalOutput {
        fn sample_format(&self) -> SampleFormat {
            SampleFormat::F32
        }

        fn initialize(
            &mut self,
            sample_rate: u32,
            channel_count: usize,
        ) -> Result<Vec<Arc<dyn PlaybackChannel>>> {
            self.teardown();

            let voices: Vec<Arc<CpalVoice>> =
                (0..channel_count).map(|_| Arc::new(CpalVoice::default())).collect();
            let (ready_tx, ready_rx) = bounded(1);
            let (quit_tx, quit_rx) = bounded(1);
            let stream_voices = voices.clone();
            let thread = std::thread::Builder::new()
                .name("open-synth-audio".into())
                .spawn(move || Self::run_stream(sample_rate, stream_voices, ready_tx, quit_rx))?;

            let started = ready_rx
                .recv()
                .map_err(|_| SynthError::Audio("audio thread exited during setup".into()))
                .and_then(|r| r);
            if let Err(e) = started {
                let _ = thread.join();
                return Err(e);
            }

            info!("Opened audio output at {sample_rate} Hz with {channel_count} voices");
            self.quit = Some(quit_tx);
            self.thread = Some(thread);
            Ok(voices
                .into_iter()
                .map(|v| v as Arc<dyn PlaybackChannel>)
                .collect())
        }

        fn teardown(&mut self) {
            if let Some(quit) = self.quit.take() {
                let _ = quit.send(());
            }
            if let Some(thread) = self.thread.take() {
                if thread.join().is_err() {
                    error!("Audio thread panicked");
                }
            }
        }
    }

    impl Drop for CpalOutput {
        fn drop(&mut self) {
            self.teardown();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn voice_frees_itself_after_clip() {
            let voice = CpalVoice::default();
            voice.play(Clip::F32(vec![0.5, 0.25, -0.5].into()));
            assert!(voice.is_busy());

            let mut out = [0.0f32; 2];
            voice.mix_into(&mut out, 1);
            assert_eq!(out, [0.5, 0.25]);
            assert!(voice.is_busy());

            let mut out = [0.0f32; 4];
            voice.mix_into(&mut out, 1);
            assert_eq!(out, [-0.5, 0.0, 0.0, 0.0]);
            assert!(!voice.is_busy());
        }
    }
}
