use cgmath::SquareMatrix;

use crate::{
    config::ValidationLimits,
    data_structures::mesh::Mesh,
    validation::{
        analyzers,
        issue::{Issue, IssueCode, MeshReport},
    },
};

/// Runs every analyzer over a single mesh.
///
/// The output order is fixed (triangle count, zero-area faces, duplicate
/// vertices, manifoldness, attributes, material, scale, skinning) so two runs
/// over the same input produce identical, diffable sequences.
#[derive(Clone, Debug, Default)]
pub struct MeshValidator {
    pub limits: ValidationLimits,
}

impl MeshValidator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    /// Analyzes `mesh` with its geometry placed at the origin.
    pub fn analyze(&self, mesh: &Mesh) -> Vec<Issue> {
        self.analyze_in_world(mesh, &cgmath::Matrix4::identity())
    }

    /// Analyzes `mesh` as placed in the scene by `world`, which only affects
    /// the bounding box check.
    pub fn analyze_in_world(&self, mesh: &Mesh, world: &cgmath::Matrix4<f32>) -> Vec<Issue> {
        let geometry = match &mesh.geometry {
            Some(geometry) if !geometry.is_empty() => geometry,
            _ => {
                return vec![Issue::new(
                    IssueCode::NoGeometry,
                    "Mesh has no geometry".to_string(),
                )];
            }
        };
        let limits = &self.limits;

        let mut issues = Vec::new();
        issues.extend(analyzers::check_triangle_count(geometry, limits));
        issues.extend(analyzers::check_zero_area_faces(geometry, limits));
        issues.extend(analyzers::check_duplicate_vertices(geometry, limits));
        issues.extend(analyzers::check_manifold(geometry));
        issues.extend(analyzers::check_attributes(geometry));
        issues.extend(analyzers::check_material(mesh.material.as_ref()));
        issues.extend(analyzers::check_scale(geometry, world, limits));
        issues.extend(analyzers::check_skinning(&mesh.kind, limits));
        log::debug!("mesh {} ({}): {} issues", mesh.name, mesh.id(), issues.len());
        issues
    }

    pub fn report(&self, mesh: &Mesh, world: &cgmath::Matrix4<f32>) -> MeshReport {
        MeshReport {
            mesh: mesh.identity(),
            issues: self.analyze_in_world(mesh, world),
        }
    }
}
