use super::{
    bone_channel::BoneChannel,
    bone_table::{BoneOffsetTable, SharedBoneTable},
    skeleton::Skeleton,
};
use crate::{
    clip_import::{ImportAnimation, ImportError, ImportOptions, ImportScene},
    mn_error::MnError,
};
use ahash::AHashMap;
use log::{debug, info, warn};
use std::sync::Arc;

/// One animation track loaded against a model. Immutable once built.
///
/// The clip keeps a snapshot of the model's bone table taken after its own
/// bones were added, so playback never needs to lock the shared table.
#[derive(Debug)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    ticks_per_second: f32,
    skeleton: Arc<Skeleton>,
    channels: Vec<BoneChannel>,
    by_name: AHashMap<String, usize>,
    bones: Arc<BoneOffsetTable>,
}

impl AnimationClip {
    /// Builds a clip from an imported animation track. Channel names not yet
    /// in the model's bone table are added to it with fresh ids.
    ///
    /// # Errors
    /// Returns `ImportError::EmptyAnimation` if the track has no channels and
    /// `ImportError::InvalidTiming` for a negative or non-finite duration or
    /// tick rate, or any non-finite key time stamp.
    pub fn new(
        animation: &ImportAnimation,
        skeleton: Arc<Skeleton>,
        bones: &SharedBoneTable,
        options: &ImportOptions,
    ) -> Result<Self, MnError> {
        let name = animation.name.clone();
        if animation.channels.is_empty() {
            return Err(ImportError::EmptyAnimation(name).into());
        }
        let valid = |x: f32| x.is_finite() && x >= 0.0;
        if !valid(animation.duration) || !valid(animation.ticks_per_second) {
            return Err(ImportError::InvalidTiming(name).into());
        }
        let finite_keys = animation.channels.iter().all(|ch| {
            ch.positions.iter().all(|k| k.time_stamp.is_finite())
                && ch.rotations.iter().all(|k| k.time_stamp.is_finite())
                && ch.scales.iter().all(|k| k.time_stamp.is_finite())
        });
        if !finite_keys {
            return Err(ImportError::InvalidTiming(name).into());
        }
        let ticks_per_second = if animation.ticks_per_second > 0.0 {
            animation.ticks_per_second
        } else {
            warn!(
                "animation {} has no tick rate, using {}",
                name, options.default_ticks_per_second
            );
            options.default_ticks_per_second
        };

        // Hold the write lock for the whole pass so the snapshot contains
        // exactly the bones seen by this clip
        let mut table = bones.write();
        let mut channels = Vec::with_capacity(animation.channels.len());
        let mut by_name = AHashMap::with_capacity(animation.channels.len());
        for ch in &animation.channels {
            if by_name.contains_key(&ch.name) {
                warn!("animation {} repeats channel {}", name, ch.name);
                continue;
            }
            if skeleton.find(&ch.name).is_none() {
                debug!("channel {} has no node in skeleton", ch.name);
            }
            let id = table.id_or_insert(&ch.name);
            by_name.insert(ch.name.clone(), channels.len());
            channels.push(BoneChannel::new(
                id,
                &ch.name,
                ch.positions.clone(),
                ch.rotations.clone(),
                ch.scales.clone(),
            ));
        }
        let snapshot = Arc::new(table.clone());
        drop(table);

        info!(
            "clip {}: duration={} ticks, {} ticks/s, {} channels, {} bones",
            name,
            animation.duration,
            ticks_per_second,
            channels.len(),
            snapshot.len()
        );

        Ok(Self {
            name,
            duration: animation.duration,
            ticks_per_second,
            skeleton,
            channels,
            by_name,
            bones: snapshot,
        })
    }

    /// Builds the clip for one animation of an imported scene, with its own
    /// copy of the scene's skeleton
    ///
    /// # Errors
    /// Returns `ImportError::NoAnimation` if the scene has no animations,
    /// `ImportError::NoAnimationIndex` if `index` is out of range, or any
    /// error from `new`.
    pub fn from_scene(
        scene: &ImportScene,
        index: usize,
        bones: &SharedBoneTable,
        options: &ImportOptions,
    ) -> Result<Self, MnError> {
        if scene.animations.is_empty() {
            return Err(ImportError::NoAnimation.into());
        }
        let animation = scene
            .animations
            .get(index)
            .ok_or(ImportError::NoAnimationIndex(index))?;
        let skeleton = Arc::new(Skeleton::from_import(&scene.root));
        Self::new(animation, skeleton, bones, options)
    }

    /// Builds every animation of an imported scene. The clips share one
    /// skeleton.
    ///
    /// # Errors
    /// Returns `ImportError::NoAnimation` if the scene has no animations, or
    /// the first error from `new`.
    pub fn all_from_scene(
        scene: &ImportScene,
        bones: &SharedBoneTable,
        options: &ImportOptions,
    ) -> Result<Vec<Arc<Self>>, MnError> {
        if scene.animations.is_empty() {
            return Err(ImportError::NoAnimation.into());
        }
        let skeleton = Arc::new(Skeleton::from_import(&scene.root));
        scene
            .animations
            .iter()
            .map(|a| {
                Self::new(a, skeleton.clone(), bones, options).map(Arc::new)
            })
            .collect()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length in ticks
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    #[must_use]
    pub const fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    /// Length in seconds
    #[must_use]
    pub fn seconds(&self) -> f32 {
        self.duration / self.ticks_per_second
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub const fn shared_skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    #[must_use]
    pub fn channels(&self) -> &[BoneChannel] {
        &self.channels
    }

    #[must_use]
    pub fn bones(&self) -> &BoneOffsetTable {
        &self.bones
    }

    /// Channel animating the node of this name, if there is one
    #[must_use]
    pub fn find_channel(&self, name: &str) -> Option<&BoneChannel> {
        self.by_name.get(name).map(|&i| &self.channels[i])
    }
}
