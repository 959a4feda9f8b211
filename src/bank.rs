//! Sound bank: every configured sound synthesized once and kept by
//! instrument and name, plus an optional on-disk cache.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::{InstrumentConfig, SynthSettings};
use crate::error::Result;
use crate::instruments::{DrumKind, Instrument, bass_note, drum_sound, piano_note, strum_chord};
use crate::waveform::WaveformBuffer;

// ── Sound Bank ──────────────────────────────────────────────

/// instrument name → sound name → waveform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundBank {
    sample_rate: u32,
    instruments: BTreeMap<String, BTreeMap<String, WaveformBuffer>>,
}

impl SoundBank {
    pub fn new(sample_rate: u32) -> Self {
        SoundBank {
            sample_rate,
            instruments: BTreeMap::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn insert(&mut self, instrument: &str, sound: &str, waveform: WaveformBuffer) {
        self.instruments
            .entry(instrument.to_string())
            .or_default()
            .insert(sound.to_string(), waveform);
    }

    pub fn get(&self, instrument: &str, sound: &str) -> Option<&WaveformBuffer> {
        self.instruments.get(instrument)?.get(sound)
    }

    pub fn instrument(&self, instrument: &str) -> Option<&BTreeMap<String, WaveformBuffer>> {
        self.instruments.get(instrument)
    }

    pub fn contains_instrument(&self, instrument: &str) -> bool {
        self.instruments.contains_key(instrument)
    }

    /// Instrument names in sorted order.
    pub fn instruments(&self) -> impl Iterator<Item = &str> {
        self.instruments.keys().map(String::as_str)
    }

    /// Sound names of `instrument` in sorted order; empty if unknown.
    pub fn sound_names(&self, instrument: &str) -> Vec<&str> {
        self.instruments
            .get(instrument)
            .map(|sounds| sounds.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Total number of sounds.
    pub fn len(&self) -> usize {
        self.instruments.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// instrument → sound names, for listings.
    pub fn catalog(&self) -> BTreeMap<String, Vec<String>> {
        self.instruments
            .iter()
            .map(|(inst, sounds)| (inst.clone(), sounds.keys().cloned().collect()))
            .collect()
    }
}

// ── Builder ─────────────────────────────────────────────────

/// Generation parameters of one configured sound.
#[derive(Debug, Clone, PartialEq)]
enum SoundParams {
    Note(f64),
    Chord(Vec<f64>),
    Drum(DrumKind),
}

#[derive(Debug, Clone)]
struct SoundJob {
    instrument: Instrument,
    name: String,
    params: SoundParams,
}

impl SoundJob {
    fn synthesize(&self, settings: &SynthSettings, base_seed: u64) -> Result<WaveformBuffer> {
        let sr = settings.sample_rate;
        debug!("Synthesizing {}/{}", self.instrument, self.name);
        match &self.params {
            SoundParams::Note(f) => match self.instrument {
                Instrument::Bass => bass_note(*f, settings.bass_duration, sr),
                _ => piano_note(*f, settings.piano_duration, sr),
            },
            SoundParams::Chord(freqs) => {
                let mut rng = sound_rng(base_seed, self.instrument, &self.name);
                strum_chord(
                    freqs,
                    settings.guitar_duration,
                    sr,
                    settings.strum_delay,
                    settings.damping,
                    &mut rng,
                )
            }
            SoundParams::Drum(kind) => {
                let mut rng = sound_rng(base_seed, self.instrument, &self.name);
                Ok(drum_sound(*kind, settings.drum_duration, sr, &mut rng))
            }
        }
    }
}

/// A generator private to one sound, so results don't depend on build order.
fn sound_rng(base_seed: u64, instrument: Instrument, name: &str) -> StdRng {
    let mut hasher = Sha256::new();
    hasher.update(base_seed.to_le_bytes());
    hasher.update(instrument.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(name.as_bytes());
    StdRng::from_seed(hasher.finalize().into())
}

/// Flatten the configuration into jobs, resolving drum tags up front so an
/// unknown tag fails before anything is synthesized.
fn plan(config: &InstrumentConfig) -> Result<Vec<SoundJob>> {
    let mut jobs = Vec::with_capacity(config.sound_count());
    let job = |instrument, name: &String, params| SoundJob {
        instrument,
        name: name.clone(),
        params,
    };
    for (name, &f) in &config.bass {
        jobs.push(job(Instrument::Bass, name, SoundParams::Note(f)));
    }
    for (name, tag) in &config.drum {
        let kind: DrumKind = tag.as_deref().unwrap_or(name).parse()?;
        jobs.push(job(Instrument::Drum, name, SoundParams::Drum(kind)));
    }
    for (name, freqs) in &config.guitar {
        jobs.push(job(Instrument::Guitar, name, SoundParams::Chord(freqs.clone())));
    }
    for (name, &f) in &config.piano {
        jobs.push(job(Instrument::Piano, name, SoundParams::Note(f)));
    }
    Ok(jobs)
}

/// Synthesize every sound in `config`.
///
/// Any failure aborts the whole build; no partial bank is returned.
pub fn build_bank(config: &InstrumentConfig, settings: &SynthSettings) -> Result<SoundBank> {
    settings.validate()?;
    let base_seed = settings.seed.unwrap_or_else(rand::random);
    let jobs = plan(config)?;
    info!(
        "Building sound bank: {} sounds at {} Hz",
        jobs.len(),
        settings.sample_rate
    );

    #[cfg(feature = "parallel")]
    let waveforms: Vec<WaveformBuffer> = {
        use rayon::prelude::*;
        jobs.par_iter()
            .map(|job| job.synthesize(settings, base_seed))
            .collect::<Result<_>>()?
    };
    #[cfg(not(feature = "parallel"))]
    let waveforms: Vec<WaveformBuffer> = jobs
        .iter()
        .map(|job| job.synthesize(settings, base_seed))
        .collect::<Result<_>>()?;

    let mut bank = SoundBank::new(settings.sample_rate);
    for (job, waveform) in jobs.iter().zip(waveforms) {
        bank.insert(job.instrument.as_str(), &job.name, waveform);
    }
    Ok(bank)
}

// ── Cache ───────────────────────────────────────────────────

/// Persistence for a built bank.
pub trait BankStore {
    /// The stored bank, or `None` if nothing has been stored yet.
    fn load(&self) -> Result<Option<SoundBank>>;
    fn save(&self, bank: &SoundBank) -> Result<()>;
}

/// A bank stored as one bincode file.
///
/// The file's existence is its only validity check: a store created with
/// [`FileBankStore::new`] keeps serving its bank after the configuration
/// changes. [`FileBankStore::keyed`] avoids that by naming the file after a
/// digest of the configuration and settings.
#[derive(Debug, Clone)]
pub struct FileBankStore {
    path: PathBuf,
}

impl FileBankStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBankStore { path: path.into() }
    }

    /// A store under `dir` whose file name is derived from `config` and
    /// `settings`.
    pub fn keyed(
        dir: impl AsRef<Path>,
        config: &InstrumentConfig,
        settings: &SynthSettings,
    ) -> Result<Self> {
        let digest = config_digest(config, settings)?;
        Ok(FileBankStore::new(
            dir.as_ref().join(format!("bank-{}.bin", &digest[..16])),
        ))
    }

    /// Platform cache directory for banks, if the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "open_synth").map(|dirs| dirs.cache_dir().to_path_buf())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BankStore for FileBankStore {
    fn load(&self) -> Result<Option<SoundBank>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)?;
        Ok(Some(bincode::deserialize(&bytes)?))
    }

    fn save(&self, bank: &SoundBank) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = bincode::serialize(bank)?;
        // Write beside the target and rename so a crash never leaves half a bank.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Hex SHA-256 over the JSON form of `config` and `settings`.
pub fn config_digest(config: &InstrumentConfig, settings: &SynthSettings) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(config)?);
    hasher.update(serde_json::to_vec(settings)?);
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

/// Return the stored bank if there is one, otherwise build and store it.
///
/// A failed save is logged and the freshly built bank is still returned.
pub fn load_or_build(
    config: &InstrumentConfig,
    settings: &SynthSettings,
    store: &impl BankStore,
) -> Result<SoundBank> {
    if let Some(bank) = store.load()? {
        info!("Loaded cached sound bank ({} sounds)", bank.len());
        if bank.sample_rate() != settings.sample_rate {
            warn!(
                "Cached bank is at {} Hz but settings ask for {} Hz",
                bank.sample_rate(),
                settings.sample_rate
            );
        }
        return Ok(bank);
    }
    info!("No cached sound bank, synthesizing");
    let bank = build_bank(config, settings)?;
    if let Err(e) = store.save(&bank) {
        warn!("Failed to cache sound bank: {e}");
    }
    Ok(bank)
}
