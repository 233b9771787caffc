use nalgebra_glm as glm;

/// Maximum bones for a skinned mesh. You can't actually change this constant
/// without also changing the size of the bone array in the skinning shader.
pub const MAX_BONES: usize = 100;

/// Length of the crossfade between two clips, in seconds
pub const TRANSITION_SECONDS: f32 = 0.2;

/// Tick rate used when an importer reports zero ticks per second
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// Final bone matrices for one animated entity, ready for upload as a shader
/// uniform array. Always holds exactly `MAX_BONES` entries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneMatrices([glm::Mat4; MAX_BONES]);

impl Default for BoneMatrices {
    fn default() -> Self {
        Self(std::array::from_fn(|_| glm::Mat4::identity()))
    }
}

impl BoneMatrices {
    /// Writes a matrix to a bone slot. Returns false, writing nothing, if the
    /// index does not fit in the array.
    pub fn set(&mut self, index: usize, matrix: glm::Mat4) -> bool {
        self.0.get_mut(index).map_or(false, |slot| {
            *slot = matrix;
            true
        })
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&glm::Mat4> {
        self.0.get(index)
    }

    #[must_use]
    pub const fn as_slice(&self) -> &[glm::Mat4] {
        &self.0
    }

    /// Sets every slot from `start` onwards back to identity
    pub fn reset_from(&mut self, start: usize) {
        for m in self.0.iter_mut().skip(start) {
            *m = glm::Mat4::identity();
        }
    }

    /// Column major `f32` bytes for a direct buffer upload
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.0)
    }
}

/// Conversion to GLSL shader ready mat4 array
impl From<BoneMatrices> for [[[f32; 4]; 4]; MAX_BONES] {
    fn from(bm: BoneMatrices) -> [[[f32; 4]; 4]; MAX_BONES] {
        std::array::from_fn(|i| bm.0[i].into())
    }
}

/// Trait for something that produces bone matrices each frame, so scene
/// objects can drive skinning without knowing about clips or transitions
pub trait Animatable {
    fn update(&mut self, dt: f32);
    fn bone_matrices(&self) -> &BoneMatrices;
}
