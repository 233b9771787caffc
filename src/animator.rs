mod config;
mod player;

// Re-exports
pub use {
    config::AnimatorConfig,
    player::{update_all, Animator, AnimatorState, Phase},
};
