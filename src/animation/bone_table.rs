use ahash::AHashMap;
use log::debug;
use nalgebra_glm as glm;
use parking_lot::RwLock;
use std::sync::Arc;

/// Index and inverse bind offset of one bone
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneInfo {
    pub id: usize,
    pub offset: glm::Mat4,
}

/// Maps bone names to their slot in the final bone matrix array and to the
/// matrix taking a vertex from bind pose mesh space into bone space.
///
/// Ids are handed out sequentially from 0, so `len` is also one past the
/// largest id.
#[derive(Clone, Debug, Default)]
pub struct BoneOffsetTable {
    map: AHashMap<String, BoneInfo>,
}

/// The table owned by a model while its clips are being loaded. Each clip
/// may add bones it finds, then takes a frozen snapshot for playback.
pub type SharedBoneTable = Arc<RwLock<BoneOffsetTable>>;

impl BoneOffsetTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the table for sharing between clip loaders
    #[must_use]
    pub fn into_shared(self) -> SharedBoneTable {
        Arc::new(RwLock::new(self))
    }

    /// Adds a bone with a known offset, as a model loader would. Returns the
    /// existing id, leaving the offset alone, if the name is already present.
    pub fn insert(&mut self, name: &str, offset: glm::Mat4) -> usize {
        if let Some(info) = self.map.get(name) {
            return info.id;
        }
        let id = self.map.len();
        self.map.insert(name.to_string(), BoneInfo { id, offset });
        id
    }

    /// Returns the id for a bone, appending it with an identity offset if it
    /// is not yet known
    pub fn id_or_insert(&mut self, name: &str) -> usize {
        if let Some(info) = self.map.get(name) {
            info.id
        } else {
            debug!("adding bone {} missing from model", name);
            self.insert(name, glm::Mat4::identity())
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoneInfo> {
        self.map.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoneInfo)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }
}
