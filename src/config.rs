//! Declarative inputs: instrument configuration, synthesis settings and
//! timeline scripts.
//!
//! All three are plain serde types read from JSON. Maps are ordered so that
//! building and hashing a configuration is deterministic.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::{Result, SynthError};

fn from_json<T: DeserializeOwned>(what: &str, json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| SynthError::config(format!("malformed {what}: {e}")))
}

fn load_json<T: DeserializeOwned>(what: &str, path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    from_json(what, &text)
}

// ── Instrument Configuration ────────────────────────────────

/// Sound definitions per instrument category.
///
/// ```json
/// {
///   "bass":   { "E1": 41.2 },
///   "drum":   { "kick": null, "boom": "floor" },
///   "guitar": { "Emaj": [82.41, 123.47, 164.81, 207.65, 246.94, 329.63] },
///   "piano":  { "A4": 440.0 }
/// }
/// ```
///
/// A drum entry whose value is `null` uses its own name as the drum type.
/// Top-level keys other than the four categories are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    #[serde(default)]
    pub bass: BTreeMap<String, f64>,
    #[serde(default)]
    pub drum: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub guitar: BTreeMap<String, Vec<f64>>,
    #[serde(default, alias = "keyboard")]
    pub piano: BTreeMap<String, f64>,
}

impl InstrumentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        from_json("instrument config", json)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        load_json("instrument config", path.as_ref())
    }

    /// Total number of sounds across all categories.
    pub fn sound_count(&self) -> usize {
        self.bass.len() + self.drum.len() + self.guitar.len() + self.piano.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sound_count() == 0
    }
}

// ── Synthesis Settings ──────────────────────────────────────

/// Global synthesis parameters shared by every instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SynthSettings {
    pub sample_rate: u32,
    /// Bass note length in seconds. Anything under 0.8 s eats into the
    /// envelope's decay segment.
    pub bass_duration: f64,
    pub drum_duration: f64,
    /// Guitar chord length in seconds.
    pub guitar_duration: f64,
    pub piano_duration: f64,
    /// Onset offset between successive guitar strings, in seconds.
    pub strum_delay: f64,
    /// Karplus-Strong feedback damping, in (0, 1).
    pub damping: f64,
    /// Base seed for every stochastic generator. `None` draws a fresh one
    /// per build.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SynthSettings {
    fn default() -> Self {
        SynthSettings {
            sample_rate: 44100,
            bass_duration: 1.0,
            drum_duration: 1.0,
            guitar_duration: 30.0,
            piano_duration: 2.0,
            strum_delay: 0.03,
            damping: 0.995,
            seed: None,
        }
    }
}

impl SynthSettings {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SynthError::config("sample rate must be positive"));
        }
        for (name, secs) in [
            ("bass", self.bass_duration),
            ("drum", self.drum_duration),
            ("guitar", self.guitar_duration),
            ("piano", self.piano_duration),
        ] {
            if !(secs.is_finite() && secs > 0.0) {
                return Err(SynthError::config(format!(
                    "{name} duration must be positive, got {secs}"
                )));
            }
        }
        if !(self.strum_delay.is_finite() && self.strum_delay >= 0.0) {
            return Err(SynthError::config(format!(
                "strum delay must be non-negative, got {}",
                self.strum_delay
            )));
        }
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(SynthError::config(format!(
                "damping must be in (0, 1), got {}",
                self.damping
            )));
        }
        Ok(())
    }
}

// ── Timeline Script ─────────────────────────────────────────

/// One sound placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub instrument: String,
    pub sound_name: String,
    pub start_time_seconds: f64,
}

impl TimelineEvent {
    pub fn new(instrument: &str, sound_name: &str, start_time_seconds: f64) -> Self {
        TimelineEvent {
            instrument: instrument.to_string(),
            sound_name: sound_name.to_string(),
            start_time_seconds,
        }
    }
}

/// A song: timed events plus the nominal length and rate of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub song_duration_seconds: f64,
    pub sample_rate: u32,
    pub events: Vec<TimelineEvent>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self> {
        let script: Script = from_json("script", json)?;
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let script: Script = load_json("script", path.as_ref())?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.song_duration_seconds.is_finite() && self.song_duration_seconds > 0.0) {
            return Err(SynthError::config(format!(
                "song duration must be positive, got {}",
                self.song_duration_seconds
            )));
        }
        if self.sample_rate == 0 {
            return Err(SynthError::config("script sample rate must be positive"));
        }
        for (i, event) in self.events.iter().enumerate() {
            let t = event.start_time_seconds;
            if !(t.is_finite() && t >= 0.0) {
                return Err(SynthError::config(format!(
                    "event {i} ({}/{}) has invalid start time {t}",
                    event.instrument, event.sound_name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_categories() {
        let cfg = InstrumentConfig::from_json(
            r#"{
                "bass": {"E1": 41.2},
                "drum": {"kick": null, "boom": "floor"},
                "guitar": {"Emaj": [82.41, 123.47]},
                "keyboard": {"A4": 440.0},
                "theremin": {"spooky": 1}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.bass["E1"], 41.2);
        assert_eq!(cfg.drum["kick"], None);
        assert_eq!(cfg.drum["boom"].as_deref(), Some("floor"));
        assert_eq!(cfg.guitar["Emaj"], vec![82.41, 123.47]);
        assert_eq!(cfg.piano["A4"], 440.0);
        assert_eq!(cfg.sound_count(), 5);
    }

    #[test]
    fn missing_categories_default_empty() {
        let cfg = InstrumentConfig::from_json(r#"{"drum": {"snare": null}}"#).unwrap();
        assert!(cfg.bass.is_empty() && cfg.guitar.is_empty() && cfg.piano.is_empty());
        assert!(!cfg.is_empty());
    }

    #[test]
    fn wrong_value_type_is_configuration_error() {
        let err = InstrumentConfig::from_json(r#"{"bass": {"E1": "low"}}"#).unwrap_err();
        assert!(matches!(err, SynthError::Configuration(_)));
    }

    #[test]
    fn settings_defaults_and_partial_override() {
        let s: SynthSettings = serde_json::from_str(r#"{"sampleRate": 22050, "seed": 9}"#).unwrap();
        assert_eq!(s.sample_rate, 22050);
        assert_eq!(s.seed, Some(9));
        assert_eq!(s.piano_duration, 2.0);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn settings_reject_bad_damping() {
        let s = SynthSettings {
            damping: 1.0,
            ..SynthSettings::default()
        };
        assert!(matches!(s.validate(), Err(SynthError::Configuration(_))));
    }

    #[test]
    fn script_round_trips_field_names() {
        let script = Script::from_json(
            r#"{"songDurationSeconds": 2.0, "sampleRate": 44100,
                "events": [{"instrument": "drum", "soundName": "kick", "startTimeSeconds": 0.0}]}"#,
        )
        .unwrap();
        assert_eq!(script.events[0], TimelineEvent::new("drum", "kick", 0.0));
    }

    #[test]
    fn script_rejects_malformed_fields() {
        let missing = Script::from_json(r#"{"sampleRate": 44100, "events": []}"#);
        assert!(matches!(missing, Err(SynthError::Configuration(_))));

        let negative = Script::from_json(
            r#"{"songDurationSeconds": 1.0, "sampleRate": 44100,
                "events": [{"instrument": "drum", "soundName": "kick", "startTimeSeconds": -0.5}]}"#,
        );
        assert!(matches!(negative, Err(SynthError::Configuration(_))));
    }
}
