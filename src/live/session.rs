//! Live playback session: instrument selection, key configuration and the
//! key-event dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, select};
use tracing::{debug, error, info, warn};

use super::device::{AudioOutput, Clip};
use super::keymap::{KeyMapping, KeyPrompter};
use super::pool::{ChannelPool, DEFAULT_CHANNELS};
use crate::bank::SoundBank;
use crate::error::{Result, SynthError};
use crate::instruments::bank_key;

/// Key events waiting for the dispatcher beyond this are dropped.
pub const KEY_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InstrumentSelected,
    Listening,
    Configuring,
}

/// What became of one key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The session isn't listening.
    Ignored,
    /// No sound is bound to the key.
    Unmapped,
    /// Playing on the given channel.
    Played(usize),
    /// Every channel was busy.
    Dropped,
}

/// Precomputed clips for the current instrument plus the pool they play on.
struct Voices {
    clips: HashMap<char, Clip>,
    pool: ChannelPool,
}

impl Voices {
    fn dispatch(&self, key: char) -> KeyOutcome {
        match self.clips.get(&key) {
            None => KeyOutcome::Unmapped,
            Some(clip) => match self.pool.dispatch(clip) {
                Some(channel) => KeyOutcome::Played(channel),
                None => KeyOutcome::Dropped,
            },
        }
    }
}

struct Playback {
    voices: Arc<Voices>,
    keys: Sender<char>,
    quit: Option<Sender<()>>,
    dispatcher: Option<JoinHandle<()>>,
}

/// Handle for a key listener to feed events into a listening session.
/// `press` never blocks.
#[derive(Debug, Clone)]
pub struct KeySender(Sender<char>);

impl KeySender {
    /// Queue a key event. Returns `false` if it was dropped, either because
    /// the queue is full or the session stopped listening.
    pub fn press(&self, key: char) -> bool {
        match self.0.try_send(key) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Key queue full, dropping '{key}'");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

fn run_dispatcher(voices: Arc<Voices>, keys: Receiver<char>, quit: Receiver<()>) {
    loop {
        select! {
            recv(keys) -> key => match key {
                Ok(key) => {
                    let outcome = voices.dispatch(key);
                    debug!("Key '{key}': {outcome:?}");
                }
                Err(_) => break,
            },
            recv(quit) -> _ => break,
        }
    }
}

/// A live session over one sound bank and one output device.
pub struct Session<O: AudioOutput> {
    bank: Arc<SoundBank>,
    mapping: KeyMapping,
    output: O,
    channel_count: usize,
    instrument: Option<String>,
    state: SessionState,
    playback: Option<Playback>,
}

impl<O: AudioOutput> Session<O> {
    /// A fresh session with the default key layout and 16 channels.
    pub fn new(bank: Arc<SoundBank>, output: O) -> Self {
        let mapping = KeyMapping::default_for(&bank);
        Self {
            bank,
            mapping,
            output,
            channel_count: DEFAULT_CHANNELS,
            instrument: None,
            state: SessionState::Idle,
            playback: None,
        }
    }

    pub fn with_channels(mut self, channel_count: usize) -> Self {
        self.channel_count = channel_count;
        self
    }

    pub fn with_mapping(mut self, mapping: KeyMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }

    pub fn bank(&self) -> &SoundBank {
        &self.bank
    }

    /// Make `name` the current instrument. Unknown names, and any call while
    /// listening or configuring, leave the session untouched.
    pub fn select_instrument(&mut self, name: &str) -> bool {
        if !matches!(self.state, SessionState::Idle | SessionState::InstrumentSelected) {
            return false;
        }
        let name = bank_key(name).to_string();
        if !self.bank.contains_instrument(&name) {
            debug!("Ignoring selection of unknown instrument '{name}'");
            return false;
        }
        info!("Selected instrument {name}");
        self.instrument = Some(name);
        self.state = SessionState::InstrumentSelected;
        true
    }

    /// Open the output device and start the dispatcher. Key events go
    /// through the returned sender.
    pub fn start_listening(&mut self) -> Result<KeySender> {
        let (SessionState::InstrumentSelected, Some(instrument)) = (self.state, &self.instrument)
        else {
            return Err(SynthError::InvalidState(format!(
                "cannot start listening from {:?}",
                self.state
            )));
        };

        let format = self.output.sample_format();
        let clips: HashMap<char, Clip> = self
            .mapping
            .keys(instrument)
            .into_iter()
            .flatten()
            .filter_map(|(&key, sound)| {
                let waveform = self.bank.get(instrument, sound)?;
                Some((key, Clip::from_waveform(waveform, format)))
            })
            .collect();

        let channels = self
            .output
            .initialize(self.bank.sample_rate(), self.channel_count)?;
        let voices = Arc::new(Voices {
            clips,
            pool: ChannelPool::new(channels),
        });

        let (key_tx, key_rx) = bounded(KEY_QUEUE_CAPACITY);
        let (quit_tx, quit_rx) = bounded(1);
        let dispatcher_voices = Arc::clone(&voices);
        let spawned = std::thread::Builder::new()
            .name("open-synth-keys".into())
            .spawn(move || run_dispatcher(dispatcher_voices, key_rx, quit_rx));
        let dispatcher = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.output.teardown();
                return Err(e.into());
            }
        };

        info!(
            "Listening on {instrument} with {} mapped keys and {} channels",
            voices.clips.len(),
            voices.pool.len()
        );
        self.playback = Some(Playback {
            voices,
            keys: key_tx.clone(),
            quit: Some(quit_tx),
            dispatcher: Some(dispatcher),
        });
        self.state = SessionState::Listening;
        Ok(KeySender(key_tx))
    }

    /// Handle one key event on the caller's thread. Never blocks on audio.
    pub fn handle_key(&self, key: char) -> KeyOutcome {
        match &self.playback {
            Some(playback) => playback.voices.dispatch(key),
            None => KeyOutcome::Ignored,
        }
    }

    /// Another sender for the running session's key queue.
    pub fn key_sender(&self) -> Option<KeySender> {
        self.playback.as_ref().map(|p| KeySender(p.keys.clone()))
    }

    /// Stop the dispatcher, release the device and go back to instrument
    /// selection. Notes already playing are not waited for.
    pub fn stop_listening(&mut self) -> Result<()> {
        let Some(mut playback) = self.playback.take() else {
            return Err(SynthError::InvalidState(format!(
                "cannot stop listening from {:?}",
                self.state
            )));
        };
        drop(playback.quit.take());
        if let Some(dispatcher) = playback.dispatcher.take() {
            if dispatcher.join().is_err() {
                error!("Key dispatcher panicked");
            }
        }
        self.output.teardown();
        self.state = SessionState::InstrumentSelected;
        info!("Stopped listening");
        Ok(())
    }

    /// Run an interactive binding pass for the current instrument. Returns
    /// how many bindings changed.
    pub fn configure(&mut self, prompter: &mut impl KeyPrompter) -> Result<usize> {
        let (SessionState::InstrumentSelected, Some(instrument)) =
            (self.state, self.instrument.clone())
        else {
            return Err(SynthError::InvalidState(format!(
                "cannot configure keys from {:?}",
                self.state
            )));
        };
        self.state = SessionState::Configuring;
        let changed = self.mapping.configure(&self.bank, &instrument, prompter);
        self.state = SessionState::InstrumentSelected;
        changed
    }
}

impl<O: AudioOutput> Drop for Session<O> {
    fn drop(&mut self) {
        if self.playback.is_some() {
            let _ = self.stop_listening();
        }
    }
}
