use std::{error, fmt};

/// Unified error type
///
/// Errors only come out of construction and loading. Evaluating a pose or
/// advancing an `Animator` never fails; bad runtime data falls back to the
/// bind pose or to identity matrices instead.
///
/// Some third party error types are very large so are boxed.
#[derive(Debug)]
pub enum MnError {
    InvalidFile,
    UnsupportedFormat,
    StdIoError(std::io::Error),
    GltfError(Box<gltf::Error>),
    SerdeYamlError(Box<serde_yaml::Error>),
    ImportError(crate::clip_import::ImportError),
}

impl error::Error for MnError {}

impl fmt::Display for MnError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidFile => write!(f, "invalid file"),
            Self::UnsupportedFormat => write!(f, "format is not supported"),
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
            Self::GltfError(e) => write!(f, "gltf Error: {e}"),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::ImportError(e) => write!(f, "import error: {e}"),
        }
    }
}

impl From<std::io::Error> for MnError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<gltf::Error> for MnError {
    fn from(e: gltf::Error) -> Self {
        Self::GltfError(Box::new(e))
    }
}

impl From<serde_yaml::Error> for MnError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<crate::clip_import::ImportError> for MnError {
    fn from(e: crate::clip_import::ImportError) -> Self {
        Self::ImportError(e)
    }
}
