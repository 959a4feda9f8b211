//! Instrument synthesizers.
//!
//! Each instrument is a pure function from its generation parameters to a
//! [`WaveformBuffer`](crate::waveform::WaveformBuffer) normalized to unit peak.
//! Stochastic instruments (drum, guitar) take the random generator explicitly.

pub mod bass;
pub mod drum;
pub mod guitar;
pub mod piano;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

pub use bass::bass_note;
pub use drum::{DrumKind, drum_sound};
pub use guitar::strum_chord;
pub use piano::piano_note;

/// The four instrument families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Bass,
    Drum,
    Guitar,
    Piano,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Bass,
        Instrument::Drum,
        Instrument::Guitar,
        Instrument::Piano,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Bass => "bass",
            Instrument::Drum => "drum",
            Instrument::Guitar => "guitar",
            Instrument::Piano => "piano",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bass" => Ok(Instrument::Bass),
            "drum" => Ok(Instrument::Drum),
            "guitar" => Ok(Instrument::Guitar),
            "piano" | "keyboard" => Ok(Instrument::Piano),
            other => Err(SynthError::config(format!("unknown instrument '{other}'"))),
        }
    }
}

/// The bank key for an instrument name, so aliases such as `keyboard` find
/// the `piano` sounds. Names outside the four families pass through.
pub fn bank_key(name: &str) -> &str {
    name.parse::<Instrument>().map_or(name, |i| i.as_str())
}

/// Reject zero, negative and non-finite frequencies.
pub(crate) fn check_frequency(frequency: f64) -> Result<()> {
    if frequency.is_finite() && frequency > 0.0 {
        Ok(())
    } else {
        Err(SynthError::config(format!(
            "frequency must be positive, got {frequency}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for inst in Instrument::ALL {
            assert_eq!(inst.as_str().parse::<Instrument>().unwrap(), inst);
        }
        assert_eq!("keyboard".parse::<Instrument>().unwrap(), Instrument::Piano);
        assert!("kazoo".parse::<Instrument>().is_err());
    }

    #[test]
    fn bank_key_resolves_aliases() {
        assert_eq!(bank_key("keyboard"), "piano");
        assert_eq!(bank_key("drum"), "drum");
        assert_eq!(bank_key("kazoo"), "kazoo");
    }
}
