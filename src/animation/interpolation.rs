use nalgebra::UnitQuaternion;
use nalgebra_glm as glm;

/// Helper to calculate the parameter used for interpolation. Result is
/// clamped to [0, 1]. A zero or negative span gives 0 so the earlier key is
/// used when two keys share a time stamp.
#[must_use]
pub fn weight(start: f32, end: f32, current: f32) -> f32 {
    let span = end - start;
    if span <= 0.0 {
        return 0.0;
    }
    ((current - start) / span).clamp(0.0f32, 1.0f32)
}

/// Linear interpolation of two vectors
#[must_use]
pub fn mix(from: &glm::Vec3, to: &glm::Vec3, fraction: f32) -> glm::Vec3 {
    glm::mix(from, to, fraction)
}

/// Spherical linear interpolation of two rotations. Inputs need not be
/// normalized and the result always is. Takes the shortest path.
#[must_use]
pub fn slerp(from: &glm::Quat, to: &glm::Quat, fraction: f32) -> glm::Quat {
    let a = UnitQuaternion::new_normalize(*from);
    let b = UnitQuaternion::new_normalize(*to);
    // `try_slerp` gives up on nearly identical rotations, where normalized
    // lerp is just as good. Flip the sign first to stay on the short path.
    a.try_slerp(&b, fraction, f32::EPSILON).map_or_else(
        || {
            let to = if glm::quat_dot(from, to) < 0.0 { -*to } else { *to };
            glm::quat_normalize(&glm::quat_lerp(from, &to, fraction))
        },
        |q| glm::quat_normalize(&q.into_inner()),
    )
}

#[must_use]
pub fn translation_matrix(v: &glm::Vec3) -> glm::Mat4 {
    glm::translation(v)
}

#[must_use]
pub fn rotation_matrix(q: &glm::Quat) -> glm::Mat4 {
    glm::quat_to_mat4(&glm::quat_normalize(q))
}

#[must_use]
pub fn scale_matrix(v: &glm::Vec3) -> glm::Mat4 {
    glm::scaling(v)
}

/// Composes translation, rotation and scale as `T * R * S`, so a column
/// vector is scaled first, then rotated, then translated
#[must_use]
pub fn compose(
    translation: &glm::Vec3,
    rotation: &glm::Quat,
    scale: &glm::Vec3,
) -> glm::Mat4 {
    translation_matrix(translation)
        * rotation_matrix(rotation)
        * scale_matrix(scale)
}

#[cfg(test)]
mod tests {
    use nalgebra_glm as glm;
    use std::f32::consts::PI;

    const EPSILON: f32 = 0.0005_f32;

    fn approx_eq(a: f32, b: f32) {
        assert!((b - a).abs() < EPSILON, "{a} != {b}");
    }

    /// This does NOT do interpolation, just checks the weight function
    #[test]
    fn weight() {
        let x = super::weight(0.0, 10.0, 7.0);
        approx_eq(x, 0.7_f32);
        let x = super::weight(0.0, 10.0, 12.0);
        approx_eq(x, 1.0_f32);
        let x = super::weight(0.0, 10.0, -2.0);
        approx_eq(x, 0.0_f32);
        let x = super::weight(-2.0, 8.0, 3.0);
        approx_eq(x, 0.5_f32);
        let x = super::weight(1.0, 1.0, 5.0);
        approx_eq(x, 0.0_f32);
    }

    #[test]
    fn mix() {
        let v = super::mix(
            &glm::vec3(1.0, 1.0, 1.0),
            &glm::vec3(2.0, 2.0, 2.0),
            0.5,
        );
        let c = glm::equal_eps(&v, &glm::vec3(1.5, 1.5, 1.5), EPSILON);
        assert!(c.x && c.y && c.z);
    }

    #[test]
    fn slerp_halfway() {
        let from = glm::quat_identity();
        let to = glm::quat_angle_axis(PI, &glm::vec3(0.0, 1.0, 0.0));
        let q = super::slerp(&from, &to, 0.5);
        approx_eq(glm::quat_angle(&q), PI / 2.0);
        approx_eq(glm::quat_length(&q), 1.0);
    }

    #[test]
    fn slerp_unit_norm() {
        let from = glm::quat_angle_axis(0.3, &glm::vec3(1.0, 0.0, 0.0));
        let to = glm::quat_angle_axis(-2.1, &glm::vec3(0.0, 0.6, 0.8));
        // Deliberately unnormalized input
        let to = to * 3.0;
        for i in 0..=10u8 {
            let q = super::slerp(&from, &to, f32::from(i) / 10.0);
            approx_eq(glm::quat_length(&q), 1.0);
        }
    }

    #[test]
    fn compose_order() {
        // Scale first, then rotate 90 degrees about Z, then translate
        let m = super::compose(
            &glm::vec3(10.0, 0.0, 0.0),
            &glm::quat_angle_axis(PI / 2.0, &glm::vec3(0.0, 0.0, 1.0)),
            &glm::vec3(2.0, 2.0, 2.0),
        );
        let p = m * glm::vec4(1.0, 0.0, 0.0, 1.0);
        approx_eq(p.x, 10.0);
        approx_eq(p.y, 2.0);
        approx_eq(p.z, 0.0);
    }
}
