use crate::animation::{KeyPosition, KeyRotation, KeyScale};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Scene graph node as handed over by an importer
#[derive(Clone, Debug)]
pub struct ImportNode {
    pub name: String,
    pub transform: glm::Mat4,
    pub children: Vec<ImportNode>,
}

impl Default for ImportNode {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: glm::Mat4::identity(),
            children: Vec::new(),
        }
    }
}

/// Keyframes for one node, addressed by node name. Times are in ticks.
#[derive(Clone, Debug, Default)]
pub struct ImportChannel {
    pub name: String,
    pub positions: Vec<KeyPosition>,
    pub rotations: Vec<KeyRotation>,
    pub scales: Vec<KeyScale>,
}

/// One animation track of an imported file
#[derive(Clone, Debug, Default)]
pub struct ImportAnimation {
    pub name: String,
    pub duration: f32,
    pub ticks_per_second: f32,
    pub channels: Vec<ImportChannel>,
}

/// Everything an importer provides for building clips
#[derive(Clone, Debug, Default)]
pub struct ImportScene {
    pub root: ImportNode,
    pub animations: Vec<ImportAnimation>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(default)]
pub struct ImportOptions {
    /// Convert from +Y up to +Z up
    pub swizzle: bool,
    /// Tick rate to use when the file reports zero ticks per second
    pub default_ticks_per_second: f32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            swizzle: false,
            default_ticks_per_second: crate::types::DEFAULT_TICKS_PER_SECOND,
        }
    }
}

/// Errors specific to importing data. `MnError` has a `From` trait to
/// handle these.
#[derive(Debug)]
pub enum ImportError {
    NoAnimation,
    NoAnimationIndex(usize),
    EmptyAnimation(String),
    InvalidTiming(String),
    NoScene,
    NoInverseBind(usize),
    SparseAnimation,
    Morphing,
    MissingBuffer(usize),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NoAnimation => write!(f, "no animation found in file"),
            Self::NoAnimationIndex(a) => {
                write!(f, "animation {a} not found in file")
            }
            Self::EmptyAnimation(a) => {
                write!(f, "animation {a} has no channels")
            }
            Self::InvalidTiming(a) => {
                write!(f, "animation {a} has invalid duration or tick rate")
            }
            Self::NoScene => write!(f, "file contains no scene nodes"),
            Self::NoInverseBind(a) => {
                write!(f, "skin {a} has no inverse bind matrices")
            }
            Self::SparseAnimation => {
                write!(f, "sparse animation data is not supported")
            }
            Self::Morphing => {
                write!(f, "morphing animation is not supported")
            }
            Self::MissingBuffer(a) => write!(f, "buffer {a} is missing"),
        }
    }
}
