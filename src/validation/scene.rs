use crate::{
    data_structures::scene_graph::{SceneNode, walk},
    validation::{
        issue::{MeshReport, ObjectReport, SceneReport},
        mesh::MeshValidator,
    },
};

/// Validates every mesh below a scene root.
///
/// The root's children are the top-level objects of the report. Each object's
/// subtree is walked depth-first in child order, so report order mirrors the
/// scene. Geometry is only read, never written; validating twice yields the
/// same report.
#[derive(Clone, Debug, Default)]
pub struct SceneValidator {
    pub mesh_validator: MeshValidator,
}

impl SceneValidator {
    pub fn new(mesh_validator: MeshValidator) -> Self {
        Self { mesh_validator }
    }

    pub fn validate(&self, root: &dyn SceneNode) -> SceneReport {
        let root_world = root.get_local_transform().to_matrix();
        let objects = root
            .get_children()
            .iter()
            .filter_map(|object| self.validate_object(object.as_ref(), &root_world))
            .collect::<Vec<_>>();
        log::debug!(
            "validated {} top-level objects, {} with issues",
            root.get_children().len(),
            objects.len()
        );
        SceneReport { objects }
    }

    /// `None` when no mesh in the subtree has an issue.
    fn validate_object(
        &self,
        object: &dyn SceneNode,
        parent_world: &cgmath::Matrix4<f32>,
    ) -> Option<ObjectReport> {
        let mut meshes: Vec<MeshReport> = Vec::new();
        walk(object, parent_world, &mut |node: &dyn SceneNode, world: &cgmath::Matrix4<f32>| {
            if let Some(mesh) = node.as_mesh() {
                let report = self.mesh_validator.report(mesh, world);
                if !report.issues.is_empty() {
                    meshes.push(report);
                }
            }
        });
        (!meshes.is_empty()).then(|| ObjectReport {
            object: object.identity(),
            meshes,
        })
    }
}
