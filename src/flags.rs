//! Operator feature toggles and their decode tool flag fragments.

use serde::{Deserialize, Serialize};

/// Flags appended when false color rendering is enabled
pub const FALSE_COLOR_FLAGS: &str = "-F --contrast telemetry";

/// Flags appended when the map overlay is enabled
pub const OVERLAY_FLAGS: &str = "-m yes";

/// Feature toggles applied uniformly to every capture in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Render false color images
    pub false_color: bool,
    /// Draw the map overlay
    pub overlay: bool,
}

impl DecodeOptions {
    /// Enabled fragments in fixed order: false color first, then overlay.
    pub fn fragments(&self) -> Vec<&'static str> {
        let mut fragments = Vec::with_capacity(2);
        if self.false_color {
            fragments.push(FALSE_COLOR_FLAGS);
        }
        if self.overlay {
            fragments.push(OVERLAY_FLAGS);
        }
        fragments
    }

    /// Extra flag text, each enabled fragment preceded by a single space.
    ///
    /// Empty when nothing is enabled.
    pub fn compose(&self) -> String {
        self.fragments()
            .into_iter()
            .map(|fragment| format!(" {fragment}"))
            .collect()
    }

    /// The composed flags split into individual arguments
    pub fn args(&self) -> impl Iterator<Item = &'static str> {
        self.fragments()
            .into_iter()
            .flat_map(|fragment| fragment.split_whitespace())
    }
}
