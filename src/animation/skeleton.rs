use crate::clip_import::ImportNode;
use ahash::AHashMap;
use log::warn;
use nalgebra_glm as glm;
use smallvec::SmallVec;

/// One node of the scene graph a clip animates. Nodes without a channel keep
/// their bind transform, which covers helper bones and the mesh root.
#[derive(Clone, Debug)]
pub struct SkeletonNode {
    pub name: String,
    pub bind: glm::Mat4,
    pub parent: Option<usize>,
    pub children: SmallVec<[usize; 4]>,
}

/// Immutable tree of named nodes stored in an arena. Node 0 is always the
/// root. Shared between clips through `Arc`.
#[derive(Clone, Debug)]
pub struct Skeleton {
    nodes: Vec<SkeletonNode>,
    by_name: AHashMap<String, usize>,
}

impl Skeleton {
    /// Builds the arena from an imported node tree. Children keep their
    /// import order.
    #[must_use]
    pub fn from_import(root: &ImportNode) -> Self {
        let mut builder = SkeletonBuilder::new(&root.name, root.transform);
        // Explicit stack of (import node, arena index of its parent)
        let mut stack: Vec<(&ImportNode, usize)> =
            root.children.iter().rev().map(|c| (c, 0)).collect();
        while let Some((node, parent)) = stack.pop() {
            let index = builder.add_child(parent, &node.name, node.transform);
            stack.extend(node.children.iter().rev().map(|c| (c, index)));
        }
        builder.build()
    }

    #[must_use]
    pub fn root(&self) -> &SkeletonNode {
        &self.nodes[0]
    }

    #[must_use]
    pub fn nodes(&self) -> &[SkeletonNode] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false, a skeleton has at least a root
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SkeletonNode> {
        self.nodes.get(index)
    }

    /// Index of the first node with this name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Walks the tree depth first, parents before children and children in
    /// import order. `visit` gets each node with its parent's global
    /// transform and returns the node's own global transform, which is passed
    /// on to its children. The root's parent transform is `root_parent`.
    pub fn traverse<F>(&self, root_parent: glm::Mat4, mut visit: F)
    where
        F: FnMut(usize, &SkeletonNode, &glm::Mat4) -> glm::Mat4,
    {
        let mut stack: Vec<(usize, glm::Mat4)> = vec![(0, root_parent)];
        while let Some((index, parent_global)) = stack.pop() {
            let node = &self.nodes[index];
            let global = visit(index, node, &parent_global);
            // Reversed so the first child is popped first
            stack.extend(node.children.iter().rev().map(|&c| (c, global)));
        }
    }

    /// Global bind transforms of every node, indexed like `nodes`
    #[must_use]
    pub fn bind_globals(&self) -> Vec<glm::Mat4> {
        let mut out = vec![glm::Mat4::identity(); self.nodes.len()];
        self.traverse(glm::Mat4::identity(), |index, node, parent| {
            let global = parent * node.bind;
            out[index] = global;
            global
        });
        out
    }
}

/// Incremental construction of a `Skeleton`, for importers and tests
pub struct SkeletonBuilder {
    nodes: Vec<SkeletonNode>,
}

impl SkeletonBuilder {
    #[must_use]
    pub fn new(root_name: &str, root_bind: glm::Mat4) -> Self {
        Self {
            nodes: vec![SkeletonNode {
                name: root_name.to_string(),
                bind: root_bind,
                parent: None,
                children: SmallVec::new(),
            }],
        }
    }

    /// Adds a node under `parent` and returns its index. An out of range
    /// parent attaches the node to the root.
    pub fn add_child(
        &mut self,
        parent: usize,
        name: &str,
        bind: glm::Mat4,
    ) -> usize {
        let parent = if parent < self.nodes.len() {
            parent
        } else {
            warn!(
                "parent {} not in skeleton, attaching {} to root",
                parent, name
            );
            0
        };
        let index = self.nodes.len();
        self.nodes.push(SkeletonNode {
            name: name.to_string(),
            bind,
            parent: Some(parent),
            children: SmallVec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    #[must_use]
    pub fn build(self) -> Skeleton {
        let mut by_name = AHashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if by_name.contains_key(&node.name) {
                warn!("duplicate node name {}, keeping the first", node.name);
            } else {
                by_name.insert(node.name.clone(), i);
            }
        }
        Skeleton {
            nodes: self.nodes,
            by_name,
        }
    }
}
