use crate::{mn_error::MnError, types::TRANSITION_SECONDS};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Tuning for an `Animator`. Missing fields take their default values when
/// read from YAML.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Debug)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Length of the crossfade when switching clips, in seconds. Zero gives
    /// a single blended frame at the destination pose.
    pub transition_seconds: f32,
    /// Reset bone slots the new clip does not use to identity whenever the
    /// active clip changes
    pub reset_unused_slots: bool,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            transition_seconds: TRANSITION_SECONDS,
            reset_unused_slots: true,
        }
    }
}

impl AnimatorConfig {
    /// # Errors
    /// May return `MnError`
    pub fn from_yaml(text: &str) -> Result<Self, MnError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// # Errors
    /// May return `MnError`
    pub fn load(path: &Path) -> Result<Self, MnError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// # Errors
    /// May return `MnError`
    pub fn to_yaml(&self) -> Result<String, MnError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
