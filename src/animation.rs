mod bone_channel;
mod bone_table;
mod clip;
pub mod interpolation;
mod keyframe;
mod skeleton;
pub mod util;

// Re-exports
pub use {
    bone_channel::{BoneChannel, LocalPose},
    bone_table::{BoneInfo, BoneOffsetTable, SharedBoneTable},
    clip::AnimationClip,
    keyframe::{
        KeyPosition, KeyRotation, KeyScale, Keyframe, KeyframeTrack, Lookup,
    },
    skeleton::{Skeleton, SkeletonBuilder, SkeletonNode},
    util::{animate, animate_transition},
};
