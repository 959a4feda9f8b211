//! Key → sound bindings for live playback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bank::SoundBank;
use crate::error::{Result, SynthError};

/// Keys handed out by [`KeyMapping::default_for`], in order.
pub const DEFAULT_LAYOUT: [char; 31] = [
    'a', 's', 'd', 'f', 'g', 'h', 'j', 'k', 'l', ';', '\'', //
    'q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o', 'p', //
    'z', 'x', 'c', 'v', 'b', 'n', 'm', ',', '.', '/',
];

/// Per-instrument key bindings. A key triggers at most one sound per
/// instrument; a sound may sit under several keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMapping {
    bindings: BTreeMap<String, BTreeMap<char, String>>,
}

/// Source of key choices for an interactive configuration pass.
pub trait KeyPrompter {
    /// Which key should play `sound` on `instrument`? `None` keeps the
    /// current binding.
    fn prompt(&mut self, instrument: &str, sound: &str) -> Option<char>;
}

impl KeyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every instrument's sounds, in name order, to [`DEFAULT_LAYOUT`].
    /// Sounds beyond the layout stay unmapped.
    pub fn default_for(bank: &SoundBank) -> Self {
        let bindings = bank
            .instruments()
            .map(|instrument| {
                let keys = DEFAULT_LAYOUT
                    .iter()
                    .copied()
                    .zip(bank.sound_names(instrument).into_iter().map(String::from))
                    .collect();
                (instrument.to_string(), keys)
            })
            .collect();
        Self { bindings }
    }

    pub fn lookup(&self, instrument: &str, key: char) -> Option<&str> {
        self.bindings
            .get(instrument)
            .and_then(|keys| keys.get(&key))
            .map(String::as_str)
    }

    pub fn keys(&self, instrument: &str) -> Option<&BTreeMap<char, String>> {
        self.bindings.get(instrument)
    }

    /// Bind `key` to `sound`, replacing whatever the key played before.
    pub fn bind(&mut self, bank: &SoundBank, instrument: &str, key: char, sound: &str) -> Result<()> {
        if bank.get(instrument, sound).is_none() {
            return Err(SynthError::config(format!(
                "cannot bind '{key}': no sound '{sound}' for instrument '{instrument}'"
            )));
        }
        debug!("Binding '{key}' to {instrument}/{sound}");
        self.bindings
            .entry(instrument.to_string())
            .or_default()
            .insert(key, sound.to_string());
        Ok(())
    }

    pub fn unbind(&mut self, instrument: &str, key: char) -> Option<String> {
        self.bindings.get_mut(instrument)?.remove(&key)
    }

    /// Ask `prompter` for a key for each of `instrument`'s sounds in name
    /// order. Returns how many bindings changed.
    pub fn configure(
        &mut self,
        bank: &SoundBank,
        instrument: &str,
        prompter: &mut impl KeyPrompter,
    ) -> Result<usize> {
        let mut changed = 0;
        for sound in bank.sound_names(instrument) {
            let Some(key) = prompter.prompt(instrument, sound) else {
                continue;
            };
            if self.lookup(instrument, key) == Some(sound) {
                continue;
            }
            self.bind(bank, instrument, key, sound)?;
            changed += 1;
        }
        Ok(changed)
    }
}
