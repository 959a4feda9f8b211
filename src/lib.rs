pub mod bank;
pub mod config;
pub mod dsp;
pub mod error;
pub mod instruments;
pub mod live;
pub mod waveform;

use crate::bank::build_bank;
use crate::config::{InstrumentConfig, Script, SynthSettings};
use crate::error::Result;
use crate::waveform::WaveformBuffer;
use wasm_bindgen::prelude::*;

pub use crate::error::SynthError;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the open_synth_core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// Build a bank for `config` at the script's sample rate and render the
/// script against it.
pub fn render_song(
    config: &InstrumentConfig,
    settings: &SynthSettings,
    script: &Script,
) -> Result<WaveformBuffer> {
    script.validate()?;
    let settings = SynthSettings {
        sample_rate: script.sample_rate,
        ..settings.clone()
    };
    let bank = build_bank(config, &settings)?;
    dsp::renderer::render(script, &bank)
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse_inputs(
    config_json: &str,
    script_json: &str,
    settings_json: Option<String>,
) -> Result<(InstrumentConfig, Script, SynthSettings)> {
    let config = InstrumentConfig::from_json(config_json)?;
    let script = Script::from_json(script_json)?;
    let settings = match settings_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| SynthError::Configuration(format!("malformed settings: {e}")))?,
        None => SynthSettings::default(),
    };
    settings.validate()?;
    Ok((config, script, settings))
}

/// WASM-exposed: synthesize the configured sounds and render a script to a
/// 16-bit PCM WAV byte array.
#[wasm_bindgen]
pub fn render_script_wav(
    config_json: &str,
    script_json: &str,
    settings_json: Option<String>,
) -> std::result::Result<Vec<u8>, JsValue> {
    let (config, script, settings) =
        parse_inputs(config_json, script_json, settings_json).map_err(to_js)?;
    let song = render_song(&config, &settings, &script).map_err(to_js)?;
    dsp::renderer::encode_wav(&song).map_err(to_js)
}

/// WASM-exposed: like [`render_script_wav`] but returns mono f32 samples
/// for AudioWorklet playback.
#[wasm_bindgen]
pub fn render_script_samples(
    config_json: &str,
    script_json: &str,
    settings_json: Option<String>,
) -> std::result::Result<Vec<f32>, JsValue> {
    let (config, script, settings) =
        parse_inputs(config_json, script_json, settings_json).map_err(to_js)?;
    let song = render_song(&config, &settings, &script).map_err(to_js)?;
    Ok(song.to_f32())
}

/// WASM-exposed: instrument → sound names declared by a configuration,
/// without synthesizing anything.
#[wasm_bindgen]
pub fn config_catalog(config_json: &str) -> std::result::Result<JsValue, JsValue> {
    let config = InstrumentConfig::from_json(config_json).map_err(to_js)?;
    let catalog = std::collections::BTreeMap::from([
        ("bass", config.bass.keys().collect::<Vec<_>>()),
        ("drum", config.drum.keys().collect()),
        ("guitar", config.guitar.keys().collect()),
        ("piano", config.piano.keys().collect()),
    ]);
    serde_wasm_bindgen::to_value(&catalog).map_err(to_js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_song_follows_script_rate() {
        let config = InstrumentConfig::from_json(r#"{"drum": {"kick": null}}"#).unwrap();
        let script = Script::from_json(
            r#"{"songDurationSeconds": 0.5, "sampleRate": 8000,
                "events": [{"instrument": "drum", "soundName": "kick", "startTimeSeconds": 0.1}]}"#,
        )
        .unwrap();
        let settings = SynthSettings {
            drum_duration: 0.2,
            ..SynthSettings::default()
        }
        .with_seed(5);
        let song = render_song(&config, &settings, &script).unwrap();
        assert_eq!(song.sample_rate(), 8000);
        assert_eq!(song.len(), 4000);
        assert_eq!(song.peak(), 1.0);
        assert!(song.samples()[..800].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn malformed_settings_are_configuration_errors() {
        let script = r#"{"songDurationSeconds": 1, "sampleRate": 8000, "events": []}"#;
        let err = parse_inputs("{}", script, Some(r#"{"damping": "x"}"#.into())).unwrap_err();
        assert!(matches!(err, SynthError::Configuration(_)));

        let err = parse_inputs("{}", script, Some(r#"{"damping": 1.5}"#.into())).unwrap_err();
        assert!(matches!(err, SynthError::Configuration(_)));
    }
}
