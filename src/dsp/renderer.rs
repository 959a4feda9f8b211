//! Timeline renderer: mixes a script's events from the sound bank into one
//! normalized buffer and encodes it as 16-bit PCM WAV.

use std::io::{Cursor, Seek, Write};
use std::path::Path;

use tracing::{debug, info};

use super::{normalize, sample_count};
use crate::bank::SoundBank;
use crate::config::Script;
use crate::error::{Result, SynthError};
use crate::instruments::bank_key;
use crate::waveform::{WaveformBuffer, to_pcm16};

/// The accumulation buffer is this many times the nominal song length.
pub const HEADROOM_FACTOR: usize = 5;

/// Additively place every event of `script`, then cut to the song length.
/// The result is not normalized.
pub fn mix(script: &Script, bank: &SoundBank) -> Result<Vec<f64>> {
    script.validate()?;
    if script.sample_rate != bank.sample_rate() {
        return Err(SynthError::config(format!(
            "script is at {} Hz but the sound bank is at {} Hz",
            script.sample_rate,
            bank.sample_rate()
        )));
    }

    let song_len = sample_count(script.song_duration_seconds, script.sample_rate);
    let capacity = song_len * HEADROOM_FACTOR;
    let mut buffer = vec![0.0; capacity];

    for (i, event) in script.events.iter().enumerate() {
        let waveform = bank
            .get(bank_key(&event.instrument), &event.sound_name)
            .ok_or_else(|| SynthError::Lookup {
                event: i,
                instrument: event.instrument.clone(),
                sound: event.sound_name.clone(),
            })?;

        let start = sample_count(event.start_time_seconds, script.sample_rate);
        // saturates for absurd start times so they land in the overflow check
        let end = start.saturating_add(waveform.len());
        if end > capacity {
            return Err(SynthError::Overflow {
                event: i,
                instrument: event.instrument.clone(),
                sound: event.sound_name.clone(),
                end_sample: end,
                capacity,
            });
        }
        debug!(
            "Placing {}/{} at sample {start}",
            event.instrument, event.sound_name
        );
        for (out, &s) in buffer[start..end].iter_mut().zip(waveform.samples()) {
            *out += s;
        }
    }

    buffer.truncate(song_len);
    Ok(buffer)
}

/// Render `script` against `bank`: exactly `songDuration · sampleRate`
/// samples normalized to unit peak (silence stays silent).
pub fn render(script: &Script, bank: &SoundBank) -> Result<WaveformBuffer> {
    let mut samples = mix(script, bank)?;
    let peak = normalize(&mut samples);
    info!(
        "Rendered {} events into {} samples (pre-normalization peak {peak:.3})",
        script.events.len(),
        samples.len()
    );
    Ok(WaveformBuffer::new(samples, script.sample_rate))
}

fn write_pcm16<W: Write + Seek>(waveform: &WaveformBuffer, writer: W) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut wav = hound::WavWriter::new(writer, spec)?;
    for &s in waveform.samples() {
        wav.write_sample(to_pcm16(s))?;
    }
    wav.finalize()?;
    Ok(())
}

/// Encode a buffer as a mono 16-bit PCM WAV file in memory.
pub fn encode_wav(waveform: &WaveformBuffer) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    write_pcm16(waveform, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Write a buffer as a mono 16-bit PCM WAV file. The file is only replaced
/// once encoding has succeeded.
pub fn write_wav(waveform: &WaveformBuffer, path: impl AsRef<Path>) -> Result<()> {
    let bytes = encode_wav(waveform)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
