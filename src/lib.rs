//! Skeletal animation core for GPU skinned models.
//!
//! Clips are built from an imported scene graph and animation tracks, then
//! played by an [`animator::Animator`] which crossfades between them and
//! produces [`types::MAX_BONES`] bone matrices ready for upload.

pub mod animation;
pub mod animator;
pub mod clip_import;
pub mod mn_error;
pub mod types;
