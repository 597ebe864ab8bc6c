use anyhow::Result;

use crate::data_structures::{
    geometry::Geometry,
    mesh::{Material, Mesh, MeshKind, Skeleton},
    scene_graph::{ContainerNode, MeshNode, SceneNode},
    transform::Transform,
};

/**
 * Converts a glTF node and its subtree into scene nodes.
 *
 * A node with a single primitive becomes a [`MeshNode`]; a node with several
 * primitives becomes a [`ContainerNode`] holding one mesh per primitive so every
 * primitive is validated on its own. Primitives that cannot be read are logged
 * and skipped.
 */
pub fn gltf_to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    mats: &[Material],
) -> Box<dyn SceneNode> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));
    let skeleton = node.skin().map(|skin| {
        Skeleton::new(
            skin.joints()
                .map(|joint| {
                    joint
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("joint_{}", joint.index()))
                })
                .collect(),
        )
    });

    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let primitive_count = mesh.primitives().len();
            let mut meshes: Vec<Mesh> = mesh
                .primitives()
                .enumerate()
                .filter_map(|(idx, primitive)| {
                    let mesh_name = if primitive_count == 1 {
                        name.clone()
                    } else {
                        format!("{name}.{idx}")
                    };
                    match gltf_primitive_to_mesh(&mesh_name, &primitive, buf, mats, skeleton.as_ref()) {
                        Ok(mesh) => Some(mesh),
                        Err(e) => {
                            log::warn!("Primitive {idx} of mesh '{name}' could not be read: {e:#}");
                            None
                        }
                    }
                })
                .collect();
            if meshes.len() == 1 {
                Box::new(MeshNode::new(meshes.remove(0)))
            } else {
                let children = meshes
                    .into_iter()
                    .map(|mesh| Box::new(MeshNode::new(mesh)) as Box<dyn SceneNode>)
                    .collect();
                Box::new(ContainerNode::with_children(&name, children))
            }
        }
        None => Box::new(ContainerNode::new(&name)),
    };

    let (translation, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Transform {
        position: translation.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    });

    for child in node.children() {
        scene_node.add_child(gltf_to_scene_node(child, buf, mats));
    }
    scene_node
}

fn gltf_primitive_to_mesh(
    name: &str,
    primitive: &gltf::Primitive,
    buf: &[Vec<u8>],
    mats: &[Material],
    skeleton: Option<&Skeleton>,
) -> Result<Mesh> {
    let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(Vec::as_slice));

    let Some(positions) = reader.read_positions() else {
        log::warn!("Primitive of mesh '{name}' has no POSITION attribute");
        return Ok(Mesh::without_geometry(name));
    };
    let mut geometry = Geometry::new(positions.flatten().collect())?;
    if let Some(normals) = reader.read_normals() {
        geometry = geometry.with_normals(normals.flatten().collect())?;
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|v| v.into_f32()) {
        geometry = geometry.with_uvs(tex_coords.flatten().collect())?;
    }
    if let Some(indices) = reader.read_indices() {
        geometry = geometry.with_index(indices.into_u32().collect());
    }

    let kind = match skeleton {
        Some(skeleton) => MeshKind::Skinned {
            skeleton: Some(skeleton.clone()),
        },
        // Joint weights without a skin: skinned, but nothing to bind to.
        None if reader.read_joints(0).is_some() => MeshKind::Skinned { skeleton: None },
        None => MeshKind::Static,
    };

    let mut mesh = Mesh::new(name, geometry).with_kind(kind);
    if let Some(material) = primitive.material().index().and_then(|idx| mats.get(idx)) {
        mesh = mesh.with_material(material.clone());
    }
    Ok(mesh)
}

/// Material description of a glTF material. A base color texture marks the
/// material as textured and binds it under `<file>#image<index>`.
pub fn gltf_material(material: &gltf::Material, file_name: &str) -> Material {
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{file_name}#material{}", material.index().unwrap_or(0)));
    match material.pbr_metallic_roughness().base_color_texture() {
        Some(info) => Material::new(&name)
            .expecting_texture()
            .with_map(&format!("{file_name}#image{}", info.texture().source().index())),
        None => Material::new(&name),
    }
}

/**
 * Converts a model loaded by tobj into a mesh.
 *
 * Models are loaded with `single_index`, so positions, normals and texture
 * coordinates share one index buffer. A material that names a diffuse texture
 * expects one, but nothing is bound yet; the texture is loaded separately.
 */
pub fn obj_to_mesh(model: &tobj::Model, mats: &[tobj::Material]) -> Result<Mesh> {
    let m = &model.mesh;
    let mut geometry = Geometry::new(m.positions.clone())?;
    if !m.normals.is_empty() {
        geometry = geometry.with_normals(m.normals.clone())?;
    }
    if !m.texcoords.is_empty() {
        geometry = geometry.with_uvs(m.texcoords.clone())?;
    }
    if !m.indices.is_empty() {
        geometry = geometry.with_index(m.indices.clone());
    }

    let mut mesh = Mesh::new(&model.name, geometry);
    if let Some(material) = m.material_id.and_then(|idx| mats.get(idx)) {
        let description = if material.diffuse_texture.is_some() {
            Material::new(&material.name).expecting_texture()
        } else {
            Material::new(&material.name)
        };
        mesh = mesh.with_material(description);
    }
    Ok(mesh)
}
