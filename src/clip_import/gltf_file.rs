// Some code inspired by
// https://github.com/KhronosGroup/glTF-Tutorials/

use super::types::{
    ImportAnimation, ImportChannel, ImportError, ImportNode, ImportOptions,
    ImportScene,
};
use crate::{
    animation::{
        BoneOffsetTable, KeyPosition, KeyRotation, KeyScale, Keyframe,
        LocalPose,
    },
    mn_error::MnError,
};
use ahash::AHashMap;
use gltf::{
    accessor::Iter,
    animation::{util::ReadOutputs, Interpolation},
    buffer::Data,
    Document, Gltf, Node,
};
use log::{debug, info, warn};
use nalgebra_glm as glm;
use std::{fs, io, path::Path};

/// Skeleton, animations and bone table read from a glTF file
#[derive(Debug)]
pub struct GltfImport {
    pub scene: ImportScene,
    pub bones: BoneOffsetTable,
}

/// Load a glTF file's skins and animations. Only the data needed for
/// skeletal clips is read, mesh data is ignored. glTF times are in seconds so
/// animations are given a rate of 1 tick per second.
///
/// # Errors
/// May return `MnError`
pub fn load(
    path: &Path,
    options: &ImportOptions,
) -> Result<GltfImport, MnError> {
    let base = path.parent().unwrap_or_else(|| Path::new("./"));
    let file = fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let gltf = Gltf::from_reader(reader)?;
    let buffers = gltf::import_buffers(&gltf.document, Some(base), gltf.blob)?;
    info!(
        "{:?}, base path={:?}, buffer count={}",
        path,
        base,
        buffers.len()
    );
    from_document(&gltf.document, &buffers, options)
}

/// Same as `load` for a glTF or GLB already in memory. External buffer files
/// can't be resolved so must be embedded.
///
/// # Errors
/// May return `MnError`
pub fn from_slice(
    bytes: &[u8],
    options: &ImportOptions,
) -> Result<GltfImport, MnError> {
    let gltf = Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&gltf.document, None, gltf.blob)?;
    from_document(&gltf.document, &buffers, options)
}

fn from_document(
    document: &Document,
    buffers: &[Data],
    options: &ImportOptions,
) -> Result<GltfImport, MnError> {
    if let Some(b) = document.buffers().find(|b| b.index() >= buffers.len()) {
        return Err(ImportError::MissingBuffer(b.index()).into());
    }
    let names: Vec<String> = document.nodes().map(|n| node_name(&n)).collect();
    let binds: Vec<LocalPose> = document
        .nodes()
        .map(|n| bind_pose(&n, options.swizzle))
        .collect();
    let root = load_tree(document, &names, options.swizzle)?;
    let bones = load_bones(document, buffers, &names, options.swizzle)?;
    let animations =
        load_animations(document, buffers, &names, &binds, options.swizzle)?;
    info!(
        "imported {} bones and {} animations",
        bones.len(),
        animations.len()
    );
    Ok(GltfImport {
        scene: ImportScene { root, animations },
        bones,
    })
}

fn node_name(node: &Node) -> String {
    node.name()
        .map_or_else(|| format!("node.{}", node.index()), ToString::to_string)
}

/// Conjugates a matrix from Y axis up to Z axis up
fn mat_swizzle(m: &glm::Mat4) -> glm::Mat4 {
    #[rustfmt::skip]
    let s = glm::mat4(
        1.0, 0.0, 0.0, 0.0,
        0.0, 0.0, -1.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );
    s * m * s.transpose()
}

/// Swizzles a quaternion from Y axis up to Z axis up
fn quat_swizzle(q: &glm::Quat) -> glm::Quat {
    glm::quat(q.i, -q.k, q.j, q.w)
}

/// Swizzles a vector from Y axis up to Z axis up
fn vec_swizzle(v: &glm::Vec3) -> glm::Vec3 {
    glm::vec3(v.x, -v.z, v.y)
}

/// Swizzles a scale from Y axis up to Z axis up. Scales have no sign.
fn scale_swizzle(v: &glm::Vec3) -> glm::Vec3 {
    glm::vec3(v.x, v.z, v.y)
}

/// Node's rest transform split into translation, rotation and scale
fn bind_pose(node: &Node, swizzle: bool) -> LocalPose {
    let (t, r, s) = node.transform().decomposed();
    let pose = LocalPose {
        translation: t.into(),
        rotation: r.into(),
        scale: s.into(),
    };
    if swizzle {
        LocalPose {
            translation: vec_swizzle(&pose.translation),
            rotation: quat_swizzle(&pose.rotation),
            scale: scale_swizzle(&pose.scale),
        }
    } else {
        pose
    }
}

/// Node tree traversal. Children are built before their parent using an
/// explicit stack, so deep hierarchies can't overflow. A node reached a
/// second time is skipped.
fn import_tree(root: &Node, names: &[String], swizzle: bool) -> ImportNode {
    let mut seen = vec![false; names.len()];
    let mut built = AHashMap::<usize, ImportNode>::new();
    let mut stack = vec![(root.clone(), false)];
    while let Some((node, expanded)) = stack.pop() {
        let index = node.index();
        if expanded {
            let transform: glm::Mat4 = node.transform().matrix().into();
            let children = node
                .children()
                .filter_map(|c| built.remove(&c.index()))
                .collect();
            built.insert(
                index,
                ImportNode {
                    name: names[index].clone(),
                    transform: if swizzle {
                        mat_swizzle(&transform)
                    } else {
                        transform
                    },
                    children,
                },
            );
        } else if seen[index] {
            warn!("node {} appears twice in the tree, skipped", index);
        } else {
            seen[index] = true;
            stack.push((node.clone(), true));
            stack.extend(node.children().map(|c| (c, false)));
        }
    }
    built.remove(&root.index()).unwrap_or_default()
}

/// Reads the node tree of the default scene. Scenes with several root nodes
/// get an identity root named after the scene to hold them.
fn load_tree(
    document: &Document,
    names: &[String],
    swizzle: bool,
) -> Result<ImportNode, MnError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ImportError::NoScene)?;
    let mut roots: Vec<ImportNode> = scene
        .nodes()
        .map(|n| import_tree(&n, names, swizzle))
        .collect();
    match roots.len() {
        0 => Err(ImportError::NoScene.into()),
        1 => Ok(roots.remove(0)),
        _ => {
            debug!("scene {} has {} root nodes", scene.index(), roots.len());
            Ok(ImportNode {
                name: scene.name().map_or_else(
                    || format!("scene.{}", scene.index()),
                    ToString::to_string,
                ),
                transform: glm::Mat4::identity(),
                children: roots,
            })
        }
    }
}

/// Builds the bone table from every skin's joints. A joint used by several
/// skins keeps the offset from the first.
fn load_bones(
    document: &Document,
    buffers: &[Data],
    names: &[String],
    swizzle: bool,
) -> Result<BoneOffsetTable, MnError> {
    let mut table = BoneOffsetTable::new();
    for skin in document.skins() {
        let reader = skin.reader(|x| buffers.get(x.index()).map(|d| &d.0[..]));
        let Some(iter) = reader.read_inverse_bind_matrices() else {
            return Err(ImportError::NoInverseBind(skin.index()).into());
        };
        for (ibm, joint) in iter.zip(skin.joints()) {
            let offset: glm::Mat4 = ibm.into();
            let offset = if swizzle { mat_swizzle(&offset) } else { offset };
            table.insert(&names[joint.index()], offset);
        }
    }
    Ok(table)
}

/// Pairs sampler times with output values.
///
/// Cubic spline samplers store an in tangent, value and out tangent per key,
/// only the values are kept. Step samplers get an extra key at each time
/// holding the previous value, so interpolating between keys holds each
/// value until the next one. Their last key is repeated so times at or past
/// it land on its value.
fn make_keys<T: Copy>(
    times: &[f32],
    values: Vec<T>,
    interpolation: Interpolation,
) -> Vec<Keyframe<T>> {
    let values: Vec<T> = if interpolation == Interpolation::CubicSpline {
        values.into_iter().skip(1).step_by(3).collect()
    } else {
        values
    };
    let mut keys = Vec::with_capacity(values.len() * 2);
    let mut previous = None;
    for (&time_stamp, value) in times.iter().zip(values) {
        if interpolation == Interpolation::Step {
            if let Some(held) = previous {
                keys.push(Keyframe {
                    value: held,
                    time_stamp,
                });
            }
            previous = Some(value);
        }
        keys.push(Keyframe { value, time_stamp });
    }
    if interpolation == Interpolation::Step {
        if let Some(&last) = keys.last() {
            keys.push(last);
        }
    }
    keys
}

/// Paths a clip doesn't animate keep the node's rest value
fn fill_from_bind(channel: &mut ImportChannel, bind: &LocalPose) {
    if channel.positions.is_empty() {
        channel.positions.push(KeyPosition {
            value: bind.translation,
            time_stamp: 0.0,
        });
    }
    if channel.rotations.is_empty() {
        channel.rotations.push(KeyRotation {
            value: bind.rotation,
            time_stamp: 0.0,
        });
    }
    if channel.scales.is_empty() {
        channel.scales.push(KeyScale {
            value: bind.scale,
            time_stamp: 0.0,
        });
    }
}

fn load_animations(
    document: &Document,
    buffers: &[Data],
    names: &[String],
    binds: &[LocalPose],
    swizzle: bool,
) -> Result<Vec<ImportAnimation>, MnError> {
    let mut ret = Vec::new();
    for animation in document.animations() {
        let name = animation.name().map_or_else(
            || format!("animation.{}", animation.index()),
            ToString::to_string,
        );
        debug!("animation name={}", name);

        // One import channel per target node, in order of first appearance
        let mut channels: Vec<ImportChannel> = Vec::new();
        let mut by_node = AHashMap::<usize, usize>::new();
        let mut duration = 0.0_f32;

        for channel in animation.channels() {
            let node_index = channel.target().node().index();
            let interpolation = channel.sampler().interpolation();
            if interpolation == Interpolation::CubicSpline {
                warn!("animation {} cubic spline tangents ignored", name);
            }

            let reader =
                channel.reader(|x| buffers.get(x.index()).map(|d| &d.0[..]));
            let times: Vec<f32> = match reader.read_inputs() {
                Some(Iter::Standard(times)) => times.collect(),
                Some(Iter::Sparse(_)) => {
                    return Err(ImportError::SparseAnimation.into());
                }
                None => return Err(MnError::UnsupportedFormat),
            };
            duration = times.iter().copied().fold(duration, f32::max);

            let slot = *by_node.entry(node_index).or_insert_with(|| {
                channels.push(ImportChannel {
                    name: names[node_index].clone(),
                    ..Default::default()
                });
                channels.len() - 1
            });
            let target = &mut channels[slot];

            match reader.read_outputs() {
                Some(ReadOutputs::Translations(x)) => {
                    let v = x
                        .map(|p| {
                            let p = glm::Vec3::from(p);
                            if swizzle {
                                vec_swizzle(&p)
                            } else {
                                p
                            }
                        })
                        .collect();
                    target.positions = make_keys(&times, v, interpolation);
                }
                Some(ReadOutputs::Rotations(x)) => {
                    let q = x
                        .into_f32()
                        .map(|r| {
                            let r = glm::Quat::from(r);
                            if swizzle {
                                quat_swizzle(&r)
                            } else {
                                r
                            }
                        })
                        .collect();
                    target.rotations = make_keys(&times, q, interpolation);
                }
                Some(ReadOutputs::Scales(x)) => {
                    let v = x
                        .map(|p| {
                            let p = glm::Vec3::from(p);
                            if swizzle {
                                scale_swizzle(&p)
                            } else {
                                p
                            }
                        })
                        .collect();
                    target.scales = make_keys(&times, v, interpolation);
                }
                Some(ReadOutputs::MorphTargetWeights(_)) => {
                    return Err(ImportError::Morphing.into());
                }
                None => return Err(MnError::UnsupportedFormat),
            }
        }

        for (&node_index, &slot) in &by_node {
            fill_from_bind(&mut channels[slot], &binds[node_index]);
        }

        ret.push(ImportAnimation {
            name,
            duration,
            ticks_per_second: 1.0,
            channels,
        });
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::{
        from_slice, make_keys, mat_swizzle, quat_swizzle, vec_swizzle,
    };
    use crate::{
        animation::{BoneChannel, Skeleton},
        clip_import::ImportOptions,
    };
    use gltf::animation::Interpolation;
    use nalgebra_glm as glm;

    const EPSILON: f32 = 0.0001;

    #[test]
    fn nodes_only() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0, 2]}],
            "nodes": [
                {"name": "Hips", "children": [1]},
                {"translation": [0.0, 1.0, 0.0]},
                {"name": "Camera"}
            ]
        }"#;
        let import =
            from_slice(json.as_bytes(), &ImportOptions::default()).unwrap();
        assert!(import.scene.animations.is_empty());
        assert!(import.bones.is_empty());

        let root = &import.scene.root;
        assert_eq!(root.name, "scene.0");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].name, "Hips");
        assert_eq!(root.children[1].name, "Camera");
        let unnamed = &root.children[0].children[0];
        assert_eq!(unnamed.name, "node.1");
        assert!((unnamed.transform[(1, 3)] - 1.0).abs() < EPSILON);
    }

    #[test]
    fn not_gltf() {
        assert!(from_slice(b"hello", &ImportOptions::default()).is_err());
    }

    #[test]
    fn swizzles_agree() {
        // Swizzling a transform must match swizzling its parts
        let r = glm::quat_angle_axis(0.8, &glm::vec3(0.0, 0.6, 0.8));
        let t = glm::vec3(1.0, 2.0, 3.0);
        let m = glm::translation(&t) * glm::quat_to_mat4(&r);
        let a = mat_swizzle(&m);
        let b = glm::translation(&vec_swizzle(&t))
            * glm::quat_to_mat4(&quat_swizzle(&r));
        let c = glm::equal_columns_eps(&a, &b, EPSILON);
        assert!(c.x && c.y && c.z && c.w);
    }

    #[test]
    fn step_keys_hold_values() {
        let v = vec![
            glm::vec3(1.0, 0.0, 0.0),
            glm::vec3(5.0, 0.0, 0.0),
            glm::vec3(9.0, 0.0, 0.0),
        ];
        let keys = make_keys(&[0.0, 1.0, 2.0], v, Interpolation::Step);
        assert_eq!(keys.len(), 6);
        let channel =
            BoneChannel::new(0, "step", keys, Vec::new(), Vec::new());
        for (t, x) in [(0.0, 1.0), (0.5, 1.0), (0.99, 1.0), (1.0, 5.0)] {
            assert!((channel.sample_position(t).x - x).abs() < EPSILON);
        }
        assert!((channel.sample_position(1.7).x - 5.0).abs() < EPSILON);
        assert!((channel.sample_position(2.0).x - 9.0).abs() < EPSILON);
        assert!((channel.sample_position(2.5).x - 9.0).abs() < EPSILON);
    }

    #[test]
    fn cubic_spline_keeps_values() {
        // In tangent, value, out tangent for each of two keys
        let v: Vec<f32> = vec![-1.0, 3.0, -1.0, -1.0, 7.0, -1.0];
        let keys = make_keys(&[0.0, 1.0], v, Interpolation::CubicSpline);
        let values: Vec<f32> = keys.iter().map(|k| k.value).collect();
        assert_eq!(values, vec![3.0, 7.0]);
    }

    #[test]
    fn deep_hierarchy() {
        const DEPTH: usize = 1000;
        let nodes: Vec<String> = (0..DEPTH)
            .map(|i| {
                if i + 1 < DEPTH {
                    format!(r#"{{"name": "n{i}", "children": [{}]}}"#, i + 1)
                } else {
                    format!(r#"{{"name": "n{i}"}}"#)
                }
            })
            .collect();
        let json = format!(
            r#"{{"asset": {{"version": "2.0"}}, "scene": 0,
                "scenes": [{{"nodes": [0]}}], "nodes": [{}]}}"#,
            nodes.join(",")
        );
        let import =
            from_slice(json.as_bytes(), &ImportOptions::default()).unwrap();

        let mut depth = 1;
        let mut node = &import.scene.root;
        while let Some(child) = node.children.first() {
            depth += 1;
            node = child;
        }
        assert_eq!(depth, DEPTH);
        assert_eq!(node.name, format!("n{}", DEPTH - 1));
        assert_eq!(Skeleton::from_import(&import.scene.root).len(), DEPTH);
    }
}
