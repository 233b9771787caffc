use super::{bone_table::BoneOffsetTable, clip::AnimationClip};
use crate::types::BoneMatrices;
use log::trace;
use nalgebra_glm as glm;

/// Combines a node's global transform with its inverse binding and writes it
/// to the output, if the node is a bone. Returns false only when the bone's
/// index does not fit in the output.
fn write_bone(
    bones: &BoneOffsetTable,
    name: &str,
    global: &glm::Mat4,
    output: &mut BoneMatrices,
) -> bool {
    bones.get(name).map_or(true, |info| {
        let written = output.set(info.id, global * info.offset);
        if !written {
            trace!("bone {} index {} out of range", name, info.id);
        }
        written
    })
}

/// Calculates the bone matrices for a clip at an arbitrary time in ticks.
/// Only slots belonging to bones of the clip are written. Returns the number
/// of bones skipped because their index did not fit in `output`.
pub fn animate(
    clip: &AnimationClip,
    current_time: f32,
    output: &mut BoneMatrices,
) -> usize {
    let bones = clip.bones();
    let mut skipped = 0;
    clip.skeleton()
        .traverse(glm::Mat4::identity(), |_, node, parent| {
            // Nodes without a channel are rigidly attached in bind pose
            let local = clip
                .find_channel(&node.name)
                .map_or(node.bind, |channel| channel.evaluate(current_time));
            let global = parent * local;
            if !write_bone(bones, &node.name, &global, output) {
                skipped += 1;
            }
            global
        });
    skipped
}

/// Calculates the bone matrices part way through a crossfade. The pose of
/// `from` frozen at `halt_time` is blended towards the first pose of `to` by
/// `fraction`, which is clamped to [0, 1]. Nodes missing a channel in
/// either clip use their bind transform. Bone slots and offsets come from
/// `to`. Returns the number of bones skipped as for `animate`.
pub fn animate_transition(
    from: &AnimationClip,
    to: &AnimationClip,
    halt_time: f32,
    fraction: f32,
    output: &mut BoneMatrices,
) -> usize {
    let fraction = fraction.clamp(0.0, 1.0);
    let bones = to.bones();
    let mut skipped = 0;
    from.skeleton()
        .traverse(glm::Mat4::identity(), |_, node, parent| {
            let local = match (
                from.find_channel(&node.name),
                to.find_channel(&node.name),
            ) {
                (Some(prev), Some(next)) => prev
                    .sample(halt_time)
                    .blend(&next.sample(0.0), fraction)
                    .to_mat4(),
                _ => node.bind,
            };
            let global = parent * local;
            if !write_bone(bones, &node.name, &global, output) {
                skipped += 1;
            }
            global
        });
    skipped
}
