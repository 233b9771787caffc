use super::{
    interpolation::{self, compose},
    keyframe::{KeyPosition, KeyRotation, KeyScale, KeyframeTrack, Lookup},
};
use nalgebra_glm as glm;

/// Local transform of a bone before being combined into a matrix
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalPose {
    pub translation: glm::Vec3,
    pub rotation: glm::Quat,
    pub scale: glm::Vec3,
}

impl Default for LocalPose {
    fn default() -> Self {
        Self {
            translation: glm::Vec3::zeros(),
            rotation: glm::quat_identity(),
            scale: glm::vec3(1.0, 1.0, 1.0),
        }
    }
}

impl LocalPose {
    /// Blends between two poses component by component
    #[must_use]
    pub fn blend(&self, other: &Self, fraction: f32) -> Self {
        Self {
            translation: interpolation::mix(
                &self.translation,
                &other.translation,
                fraction,
            ),
            rotation: interpolation::slerp(
                &self.rotation,
                &other.rotation,
                fraction,
            ),
            scale: interpolation::mix(&self.scale, &other.scale, fraction),
        }
    }

    #[must_use]
    pub fn to_mat4(&self) -> glm::Mat4 {
        compose(&self.translation, &self.rotation, &self.scale)
    }
}

/// Keyframes for one named bone. Built once when a clip is loaded and never
/// changed afterwards.
#[derive(Clone, Debug)]
pub struct BoneChannel {
    id: usize,
    name: String,
    positions: KeyframeTrack<glm::Vec3>,
    rotations: KeyframeTrack<glm::Quat>,
    scales: KeyframeTrack<glm::Vec3>,
}

impl BoneChannel {
    #[must_use]
    pub fn new(
        id: usize,
        name: &str,
        positions: Vec<KeyPosition>,
        rotations: Vec<KeyRotation>,
        scales: Vec<KeyScale>,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            positions: KeyframeTrack::new(positions),
            rotations: KeyframeTrack::new(rotations),
            scales: KeyframeTrack::new(scales),
        }
    }

    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn positions(&self) -> &KeyframeTrack<glm::Vec3> {
        &self.positions
    }

    #[must_use]
    pub const fn rotations(&self) -> &KeyframeTrack<glm::Quat> {
        &self.rotations
    }

    #[must_use]
    pub const fn scales(&self) -> &KeyframeTrack<glm::Vec3> {
        &self.scales
    }

    /// Time stamp of the latest key of any kind
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.positions
            .end_time()
            .max(self.rotations.end_time())
            .max(self.scales.end_time())
    }

    #[must_use]
    pub fn sample_position(&self, animation_time: f32) -> glm::Vec3 {
        match self.positions.lookup(animation_time) {
            Lookup::Empty => glm::Vec3::zeros(),
            Lookup::Single(v) => *v,
            Lookup::Between { from, to, fraction } => {
                interpolation::mix(from, to, fraction)
            }
        }
    }

    #[must_use]
    pub fn sample_rotation(&self, animation_time: f32) -> glm::Quat {
        match self.rotations.lookup(animation_time) {
            Lookup::Empty => glm::quat_identity(),
            Lookup::Single(q) => glm::quat_normalize(q),
            Lookup::Between { from, to, fraction } => {
                interpolation::slerp(from, to, fraction)
            }
        }
    }

    #[must_use]
    pub fn sample_scale(&self, animation_time: f32) -> glm::Vec3 {
        match self.scales.lookup(animation_time) {
            Lookup::Empty => glm::vec3(1.0, 1.0, 1.0),
            Lookup::Single(v) => *v,
            Lookup::Between { from, to, fraction } => {
                interpolation::mix(from, to, fraction)
            }
        }
    }

    /// Interpolated components at a time in clip ticks
    #[must_use]
    pub fn sample(&self, animation_time: f32) -> LocalPose {
        LocalPose {
            translation: self.sample_position(animation_time),
            rotation: self.sample_rotation(animation_time),
            scale: self.sample_scale(animation_time),
        }
    }

    /// Local transform at a time in clip ticks
    #[must_use]
    pub fn evaluate(&self, animation_time: f32) -> glm::Mat4 {
        self.sample(animation_time).to_mat4()
    }
}

#[cfg(test)]
mod tests {
    use super::{BoneChannel, LocalPose};
    use crate::animation::keyframe::{KeyPosition, KeyRotation, KeyScale};
    use nalgebra_glm as glm;
    use std::f32::consts::PI;

    const EPSILON: f32 = 0.0001_f32;

    fn translation_of(m: &glm::Mat4) -> glm::Vec3 {
        glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)])
    }

    #[test]
    fn midpoint() {
        let channel = BoneChannel::new(
            0,
            "test",
            vec![
                KeyPosition {
                    value: glm::vec3(0.0, 0.0, 0.0),
                    time_stamp: 0.0,
                },
                KeyPosition {
                    value: glm::vec3(10.0, 10.0, 10.0),
                    time_stamp: 1.0,
                },
            ],
            Vec::new(),
            Vec::new(),
        );
        let m = channel.evaluate(0.5);
        let c = glm::equal_eps(
            &translation_of(&m),
            &glm::vec3(5.0, 5.0, 5.0),
            EPSILON,
        );
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn single_keys_are_static() {
        let rot = glm::quat_angle_axis(0.7, &glm::vec3(0.0, 0.0, 1.0));
        let channel = BoneChannel::new(
            3,
            "static",
            vec![KeyPosition {
                value: glm::vec3(1.0, 2.0, 3.0),
                time_stamp: 5.0,
            }],
            vec![KeyRotation {
                value: rot,
                time_stamp: 5.0,
            }],
            vec![KeyScale {
                value: glm::vec3(2.0, 2.0, 2.0),
                time_stamp: 5.0,
            }],
        );
        let expected = glm::translation(&glm::vec3(1.0, 2.0, 3.0))
            * glm::quat_to_mat4(&rot)
            * glm::scaling(&glm::vec3(2.0, 2.0, 2.0));
        for t in [-10.0_f32, 0.0, 5.0, 1000.0] {
            let c = glm::equal_columns_eps(
                &channel.evaluate(t),
                &expected,
                EPSILON,
            );
            assert!(c.x && c.y && c.z && c.w);
        }
    }

    #[test]
    fn empty_channel_is_identity() {
        let channel =
            BoneChannel::new(0, "empty", Vec::new(), Vec::new(), Vec::new());
        assert_eq!(channel.sample(3.0), LocalPose::default());
        let c = glm::equal_columns_eps(
            &channel.evaluate(3.0),
            &glm::Mat4::identity(),
            EPSILON,
        );
        assert!(c.x && c.y && c.z && c.w);
    }

    #[test]
    fn scale_interpolation() {
        let channel = BoneChannel::new(
            0,
            "scale",
            Vec::new(),
            Vec::new(),
            vec![
                KeyScale {
                    value: glm::vec3(1.0, 1.0, 1.0),
                    time_stamp: 0.0,
                },
                KeyScale {
                    value: glm::vec3(2.0, 2.0, 2.0),
                    time_stamp: 1.0,
                },
            ],
        );
        let m = channel.evaluate(0.5);
        let s = glm::vec3(m[(0, 0)], m[(1, 1)], m[(2, 2)]);
        let c = glm::equal_eps(&s, &glm::vec3(1.5, 1.5, 1.5), EPSILON);
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn quarter_turn_halfway() {
        let y = glm::vec3(0.0, 1.0, 0.0);
        let channel = BoneChannel::new(
            0,
            "Spine",
            Vec::new(),
            vec![
                KeyRotation {
                    value: glm::quat_identity(),
                    time_stamp: 0.0,
                },
                KeyRotation {
                    value: glm::quat_angle_axis(PI / 2.0, &y),
                    time_stamp: 50.0,
                },
            ],
            Vec::new(),
        );
        let q = channel.sample_rotation(25.0);
        assert!((glm::quat_angle(&q) - PI / 4.0).abs() < 0.001);
        let axis = glm::quat_axis(&q);
        let c = glm::equal_eps(&axis, &y, 0.001);
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn blend_poses() {
        let a = LocalPose::default();
        let b = LocalPose {
            translation: glm::vec3(4.0, 0.0, 0.0),
            rotation: glm::quat_angle_axis(PI / 2.0, &glm::vec3(1.0, 0.0, 0.0)),
            scale: glm::vec3(3.0, 3.0, 3.0),
        };
        let mid = a.blend(&b, 0.5);
        assert!((mid.translation.x - 2.0).abs() < EPSILON);
        assert!((mid.scale.y - 2.0).abs() < EPSILON);
        assert!((glm::quat_angle(&mid.rotation) - PI / 4.0).abs() < 0.001);
    }
}
