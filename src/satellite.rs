//! Satellite profile inference from capture file names.
//!
//! Recorders such as gqrx embed the satellite in the file name
//! (`gqrx_20230101_noaa_18_137100kHz.wav`), so the profile handed to the
//! decode tool is picked by looking for a known identifier in the name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Satellite profile understood by the decode tool's `--sat` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Satellite {
    Noaa15,
    Noaa18,
    Noaa19,
}

impl Satellite {
    /// Known satellites in match priority order
    pub const ALL: [Satellite; 3] = [Satellite::Noaa15, Satellite::Noaa18, Satellite::Noaa19];

    /// Fallback when a name carries no known identifier (the newest satellite)
    pub const DEFAULT: Satellite = Satellite::Noaa19;

    /// Canonical identifier, as passed to `--sat`
    pub fn id(self) -> &'static str {
        match self {
            Satellite::Noaa15 => "noaa_15",
            Satellite::Noaa18 => "noaa_18",
            Satellite::Noaa19 => "noaa_19",
        }
    }

    /// Infer the satellite from a capture's base name.
    ///
    /// Matching is case-sensitive substring containment, checked in
    /// [`Satellite::ALL`] order. Never fails: unrecognized names fall back to
    /// [`Satellite::DEFAULT`].
    ///
    /// # Example
    /// ```
    /// use apt_batch::satellite::Satellite;
    /// assert_eq!(Satellite::infer("gqrx_20230101_noaa_18_137100kHz"), Satellite::Noaa18);
    /// assert_eq!(Satellite::infer("capture1"), Satellite::Noaa19);
    /// ```
    pub fn infer(base_name: &str) -> Satellite {
        Self::ALL
            .into_iter()
            .find(|sat| base_name.contains(sat.id()))
            .unwrap_or(Self::DEFAULT)
    }
}

impl fmt::Display for Satellite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
