//! Scene graph as seen by the validators.
//!
//! The editor's renderer owns the real hierarchy; this module describes the
//! minimal contract the integrity core needs from it: enumerable children,
//! a local transform per node and a way to tell renderable meshes apart.
//! [`ContainerNode`] and [`MeshNode`] are the two concrete node types the
//! importers produce.

use crate::data_structures::{
    mesh::{Identity, Mesh, next_id},
    transform::Transform,
};

pub trait SceneNode {
    fn name(&self) -> &str;

    fn id(&self) -> u32;

    fn identity(&self) -> Identity {
        Identity {
            name: self.name().to_string(),
            id: self.id(),
        }
    }

    /// `Some` for renderable mesh nodes.
    fn as_mesh(&self) -> Option<&Mesh>;

    fn as_mesh_mut(&mut self) -> Option<&mut Mesh>;

    fn get_local_transform(&self) -> &Transform;

    fn set_local_transform(&mut self, transform: Transform);

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);
}

/// A grouping node without geometry of its own.
pub struct ContainerNode {
    name: String,
    id: u32,
    pub local: Transform,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl ContainerNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: next_id(),
            local: Transform::default(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: &str, children: Vec<Box<dyn SceneNode>>) -> Self {
        Self {
            children,
            ..Self::new(name)
        }
    }
}

impl SceneNode for ContainerNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn as_mesh(&self) -> Option<&Mesh> {
        None
    }

    fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        None
    }

    fn get_local_transform(&self) -> &Transform {
        &self.local
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }
}

/// A renderable mesh placed in the scene. Shares the mesh's name and id.
pub struct MeshNode {
    pub mesh: Mesh,
    pub local: Transform,
    pub children: Vec<Box<dyn SceneNode>>,
}

impl MeshNode {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            local: Transform::default(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }
}

impl SceneNode for MeshNode {
    fn name(&self) -> &str {
        &self.mesh.name
    }

    fn id(&self) -> u32 {
        self.mesh.id()
    }

    fn as_mesh(&self) -> Option<&Mesh> {
        Some(&self.mesh)
    }

    fn as_mesh_mut(&mut self) -> Option<&mut Mesh> {
        Some(&mut self.mesh)
    }

    fn get_local_transform(&self) -> &Transform {
        &self.local
    }

    fn set_local_transform(&mut self, transform: Transform) {
        self.local = transform;
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }
}

/**
 * Depth-first search for the mesh with the given unique id, the node itself included.
 *
 * Reports only carry identities, so this is how a report entry gets turned back
 * into something an autofix can mutate.
 */
pub fn find_mesh_mut(node: &mut dyn SceneNode, id: u32) -> Option<&mut Mesh> {
    if node.as_mesh().is_some_and(|mesh| mesh.id() == id) {
        return node.as_mesh_mut();
    }
    node.get_children_mut()
        .iter_mut()
        .find_map(|child| find_mesh_mut(child.as_mut(), id))
}

/// Visits `node` and all descendants depth-first in child order, passing the
/// world matrix of each node (`parent_world * local`).
pub fn walk(
    node: &dyn SceneNode,
    parent_world: &cgmath::Matrix4<f32>,
    visit: &mut dyn FnMut(&dyn SceneNode, &cgmath::Matrix4<f32>),
) {
    let world = *parent_world * node.get_local_transform().to_matrix();
    visit(node, &world);
    for child in node.get_children() {
        walk(child.as_ref(), &world, visit);
    }
}
