use super::config::AnimatorConfig;
use crate::{
    animation::{animate, animate_transition, AnimationClip},
    types::{Animatable, BoneMatrices, MAX_BONES},
};
use log::{debug, info, warn};
use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Where the animator is in its playback cycle
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    /// No clip set
    #[default]
    Idle,
    /// Looping a single clip
    Playing,
    /// Crossfading from the current clip to the next one
    Transitioning,
}

/// All of the animator's mutable timing state. Times are in ticks of the
/// current clip.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimatorState {
    pub phase: Phase,
    /// Playback position, wrapped to the current clip's duration
    pub current_time: f32,
    /// Position in the outgoing clip where its pose was frozen for blending
    pub halt_time: f32,
    /// Time spent in the current transition
    pub inter_time: f32,
}

impl AnimatorState {
    const fn reset(phase: Phase) -> Self {
        Self {
            phase,
            current_time: 0.0,
            halt_time: 0.0,
            inter_time: 0.0,
        }
    }
}

/// Wraps a time into [0, duration). A zero length clip is a static pose.
fn wrap(time: f32, duration: f32) -> f32 {
    if duration > 0.0 && time.is_finite() {
        time.rem_euclid(duration)
    } else {
        0.0
    }
}

fn is_same(
    held: Option<&Arc<AnimationClip>>,
    clip: &Arc<AnimationClip>,
) -> bool {
    held.map_or(false, |h| Arc::ptr_eq(h, clip))
}

/// Plays clips on one skeleton and produces its final bone matrices.
///
/// Switching clips with `play` crossfades from the pose the old clip was in
/// to the first pose of the new one. A clip requested during a crossfade is
/// queued and started as soon as the crossfade ends. Only the latest request
/// is kept in the queue.
#[derive(Clone, Debug)]
pub struct Animator {
    config: AnimatorConfig,
    state: AnimatorState,
    current: Option<Arc<AnimationClip>>,
    next: Option<Arc<AnimationClip>>,
    queued: Option<Arc<AnimationClip>>,
    matrices: BoneMatrices,
    overflow_warned: bool,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new(AnimatorConfig::default())
    }
}

impl Animator {
    #[must_use]
    pub fn new(config: AnimatorConfig) -> Self {
        Self {
            config,
            state: AnimatorState::default(),
            current: None,
            next: None,
            queued: None,
            matrices: BoneMatrices::default(),
            overflow_warned: false,
        }
    }

    /// Requests a clip. Starts it immediately if nothing is playing,
    /// otherwise crossfades to it or queues it behind a running crossfade.
    pub fn play(&mut self, clip: Arc<AnimationClip>) {
        match self.state.phase {
            Phase::Idle => {
                info!("playing clip {}", clip.name());
                self.current = Some(clip);
                self.state = AnimatorState::reset(Phase::Playing);
                self.clip_changed();
            }
            Phase::Playing => {
                let Some(current) = &self.current else {
                    // Unreachable in practice, treat as idle
                    self.state.phase = Phase::Idle;
                    self.play(clip);
                    return;
                };
                if Arc::ptr_eq(current, &clip) {
                    return;
                }
                info!(
                    "transition from clip {} to {}",
                    current.name(),
                    clip.name()
                );
                let halt_time =
                    wrap(self.state.current_time, current.duration());
                self.next = Some(clip);
                self.state = AnimatorState {
                    halt_time,
                    ..AnimatorState::reset(Phase::Transitioning)
                };
                self.clip_changed();
            }
            Phase::Transitioning => {
                if is_same(self.next.as_ref(), &clip) {
                    return;
                }
                debug!("queueing clip {}", clip.name());
                self.queued = Some(clip);
            }
        }
    }

    /// Stops playback and returns every bone to identity
    pub fn stop(&mut self) {
        self.current = None;
        self.next = None;
        self.queued = None;
        self.state = AnimatorState::default();
        self.matrices = BoneMatrices::default();
        self.overflow_warned = false;
    }

    /// Advances playback by `dt` seconds and recalculates the bone matrices
    pub fn update(&mut self, dt: f32) {
        let Some(current) = self.current.clone() else {
            return;
        };
        let tps = current.ticks_per_second();
        self.state.current_time =
            wrap(self.state.current_time + tps * dt, current.duration());

        if self.state.phase == Phase::Transitioning {
            let Some(next) = self.next.clone() else {
                self.state.phase = Phase::Playing;
                self.evaluate();
                return;
            };
            let window = tps * self.config.transition_seconds;
            if self.state.inter_time <= window {
                self.state.inter_time += tps * dt;
                let fraction = if window > 0.0 {
                    self.state.inter_time / window
                } else {
                    1.0
                };
                let skipped = animate_transition(
                    &current,
                    &next,
                    self.state.halt_time,
                    fraction,
                    &mut self.matrices,
                );
                self.report_skipped(skipped);
                return;
            }

            if let Some(queued) = self.queued.take() {
                // Hard cut to the queued transition, nothing is evaluated
                // this frame
                debug!(
                    "transition to {} done, starting queued {}",
                    next.name(),
                    queued.name()
                );
                self.current = Some(next);
                self.next = Some(queued);
                self.state = AnimatorState::reset(Phase::Transitioning);
                self.clip_changed();
                return;
            }

            debug!("transition to {} done", next.name());
            self.current = Some(next);
            self.next = None;
            self.state = AnimatorState::reset(Phase::Playing);
            self.clip_changed();
        }

        self.evaluate();
    }

    /// Poses the current clip at the current time
    fn evaluate(&mut self) {
        let skipped = self.current.as_ref().map_or(0, |clip| {
            animate(clip, self.state.current_time, &mut self.matrices)
        });
        self.report_skipped(skipped);
    }

    fn report_skipped(&mut self, skipped: usize) {
        if skipped > 0 && !self.overflow_warned {
            warn!(
                "{} bones have indices past the {} available slots, skipped",
                skipped, MAX_BONES
            );
            self.overflow_warned = true;
        }
    }

    /// Called whenever the clip writing the bone matrices changes
    fn clip_changed(&mut self) {
        self.overflow_warned = false;
        if !self.config.reset_unused_slots {
            return;
        }
        let writer = if self.state.phase == Phase::Transitioning {
            self.next.as_ref()
        } else {
            self.current.as_ref()
        };
        if let Some(clip) = writer {
            self.matrices.reset_from(clip.bones().len());
        }
    }

    #[must_use]
    pub const fn state(&self) -> AnimatorState {
        self.state
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.state.phase
    }

    #[must_use]
    pub const fn current_time(&self) -> f32 {
        self.state.current_time
    }

    #[must_use]
    pub const fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    #[must_use]
    pub const fn current_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn next_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.next.as_ref()
    }

    #[must_use]
    pub const fn queued_clip(&self) -> Option<&Arc<AnimationClip>> {
        self.queued.as_ref()
    }

    /// The matrices to upload for skinning, always `MAX_BONES` long
    #[must_use]
    pub const fn final_bone_matrices(&self) -> &BoneMatrices {
        &self.matrices
    }
}

impl Animatable for Animator {
    fn update(&mut self, dt: f32) {
        Self::update(self, dt);
    }

    fn bone_matrices(&self) -> &BoneMatrices {
        &self.matrices
    }
}

/// Advances a group of independent animators by the same time step
pub fn update_all(animators: &mut [Animator], dt: f32) {
    #[cfg(feature = "rayon")]
    animators.par_iter_mut().for_each(|a| a.update(dt));
    #[cfg(not(feature = "rayon"))]
    animators.iter_mut().for_each(|a| a.update(dt));
}
