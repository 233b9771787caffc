pub mod gltf_file;
mod types;

// Re-exports
pub use types::{
    ImportAnimation, ImportChannel, ImportError, ImportNode, ImportOptions,
    ImportScene,
};
