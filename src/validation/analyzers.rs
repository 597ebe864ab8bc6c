//! Defect analyzers.
//!
//! Each analyzer is a pure function over a geometry (plus the bits of mesh
//! metadata it needs) and shares no state with the others. The `measure_*`
//! functions return raw findings; the `check_*` functions turn them into
//! [`Issue`]s. Absent optional data never fails an analyzer, the check is
//! simply skipped.

use std::collections::{HashMap, HashSet};

use crate::{
    config::ValidationLimits,
    data_structures::{
        geometry::{Geometry, IndexBuffer},
        mesh::{Material, MeshKind},
    },
    validation::issue::{Issue, IssueCode, IssueDetail},
};

/// Occurrence count of every undirected edge of an indexed triangle list.
#[derive(Clone, Debug, Default)]
pub struct EdgeCensus {
    counts: HashMap<(u32, u32), usize>,
}

impl EdgeCensus {
    /// Number of triangles referencing `(a, b)` in either direction.
    pub fn occurrences(&self, a: u32, b: u32) -> usize {
        self.counts.get(&normalize_edge(a, b)).copied().unwrap_or(0)
    }

    /// Sum of all occurrence counts; `3 * triangle_count` by construction.
    pub fn total_occurrences(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn distinct_edges(&self) -> usize {
        self.counts.len()
    }

    /// Edges belonging to exactly one triangle.
    pub fn boundary_edges(&self) -> usize {
        self.counts.values().filter(|&&n| n == 1).count()
    }

    /// Edges shared by exactly two triangles.
    pub fn manifold_edges(&self) -> usize {
        self.counts.values().filter(|&&n| n == 2).count()
    }

    /// Edges shared by three or more triangles.
    pub fn non_manifold_edges(&self) -> usize {
        self.counts.values().filter(|&&n| n >= 3).count()
    }
}

#[inline]
fn normalize_edge(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

pub fn measure_edges(index: &IndexBuffer) -> EdgeCensus {
    let mut counts: HashMap<(u32, u32), usize> = HashMap::new();
    for tri in index.indices().chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            *counts.entry(normalize_edge(a, b)).or_default() += 1;
        }
    }
    EdgeCensus { counts }
}

/// Face ordinals of all triangles whose area is at or below `epsilon`.
///
/// Triangles referencing a missing vertex cannot be measured and are skipped.
pub fn measure_zero_area_faces(geometry: &Geometry, epsilon: f64) -> Vec<usize> {
    let mut skipped = 0;
    let faces: Vec<usize> = geometry
        .triangles()
        .enumerate()
        .filter_map(|(face, tri)| match geometry.triangle_area(tri) {
            Some(area) => (area <= epsilon).then_some(face),
            None => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        log::warn!("{skipped} triangles reference missing vertices and were not measured");
    }
    faces
}

/// Approximate duplicate count: positions are rounded to `precision` decimal
/// digits per axis and every repeat of an already seen key is counted once.
/// The first occurrence of a key is never counted.
pub fn measure_duplicate_vertices(geometry: &Geometry, precision: i32) -> usize {
    let scale = 10f64.powi(precision);
    let mut seen: HashSet<[i64; 3]> = HashSet::with_capacity(geometry.vertex_count());
    geometry
        .positions()
        .array()
        .chunks_exact(3)
        .filter(|p| {
            let key = [
                (p[0] as f64 * scale).round() as i64,
                (p[1] as f64 * scale).round() as i64,
                (p[2] as f64 * scale).round() as i64,
            ];
            !seen.insert(key)
        })
        .count()
}

pub fn check_triangle_count(geometry: &Geometry, limits: &ValidationLimits) -> Vec<Issue> {
    let count = geometry.triangle_count();
    if count <= limits.max_triangles {
        return Vec::new();
    }
    vec![
        Issue::new(
            IssueCode::LargeTriangleCount,
            format!(
                "Mesh has {count} triangles (more than {})",
                limits.max_triangles
            ),
        )
        .with_detail(IssueDetail::Count(count)),
    ]
}

pub fn check_zero_area_faces(geometry: &Geometry, limits: &ValidationLimits) -> Vec<Issue> {
    let faces = measure_zero_area_faces(geometry, limits.zero_area_epsilon);
    if faces.is_empty() {
        return Vec::new();
    }
    let count = faces.len();
    let sample_faces = faces.into_iter().take(limits.sample_faces).collect();
    vec![
        Issue::new(
            IssueCode::ZeroAreaFaces,
            format!("{count} zero-area faces"),
        )
        .with_detail(IssueDetail::SampleFaces {
            count,
            sample_faces,
        }),
    ]
}

pub fn check_duplicate_vertices(geometry: &Geometry, limits: &ValidationLimits) -> Vec<Issue> {
    let count = measure_duplicate_vertices(geometry, limits.duplicate_precision);
    if count == 0 {
        return Vec::new();
    }
    vec![
        Issue::new(
            IssueCode::DuplicateVertices,
            format!("~{count} duplicate vertices (approximate)"),
        )
        .with_detail(IssueDetail::Count(count)),
    ]
}

/// Only indexed geometry is inspected. Boundary edges are reported before
/// non-manifold edges.
pub fn check_manifold(geometry: &Geometry) -> Vec<Issue> {
    let Some(index) = geometry.index() else {
        return Vec::new();
    };
    let census = measure_edges(index);
    let mut issues = Vec::new();
    let boundary = census.boundary_edges();
    if boundary > 0 {
        issues.push(
            Issue::new(
                IssueCode::BoundaryEdges,
                format!("{boundary} boundary edges (open surface)"),
            )
            .with_detail(IssueDetail::Count(boundary)),
        );
    }
    let non_manifold = census.non_manifold_edges();
    if non_manifold > 0 {
        issues.push(
            Issue::new(
                IssueCode::NonManifoldEdges,
                format!("{non_manifold} non-manifold edges (shared by 3+ faces)"),
            )
            .with_detail(IssueDetail::Count(non_manifold)),
        );
    }
    issues
}

pub fn check_attributes(geometry: &Geometry) -> Vec<Issue> {
    let mut issues = Vec::new();
    if geometry.normals().is_none() {
        issues.push(Issue::new(
            IssueCode::MissingNormals,
            "Geometry has no normals".to_string(),
        ));
    }
    if geometry.uvs().is_none() {
        issues.push(Issue::new(
            IssueCode::MissingUvs,
            "Geometry has no UVs".to_string(),
        ));
    }
    issues
}

pub fn check_material(material: Option<&Material>) -> Vec<Issue> {
    match material {
        None => vec![Issue::new(
            IssueCode::MissingMaterial,
            "No material assigned".to_string(),
        )],
        Some(material) if material.expects_texture && material.map.is_none() => {
            vec![Issue::new(
                IssueCode::MissingTexture,
                format!("Material '{}' expects a texture but none is bound", material.name),
            )]
        }
        Some(_) => Vec::new(),
    }
}

/// Compares the largest world-space extent against the scale limits.
pub fn check_scale(
    geometry: &Geometry,
    world: &cgmath::Matrix4<f32>,
    limits: &ValidationLimits,
) -> Vec<Issue> {
    let Some(bbox) = geometry.world_bounding_box(world) else {
        return Vec::new();
    };
    let size = bbox.size();
    let max_dimension = bbox.max_dimension();
    let detail = IssueDetail::BoundingBox {
        size: [size.x, size.y, size.z],
        max_dimension,
    };
    if max_dimension > limits.large_bbox {
        vec![
            Issue::new(
                IssueCode::LargeBbox,
                format!("Bounding box is very large ({max_dimension:.3} units); check import scale"),
            )
            .with_detail(detail),
        ]
    } else if max_dimension > 0.0 && max_dimension < limits.small_bbox {
        vec![
            Issue::new(
                IssueCode::SmallBbox,
                format!("Bounding box is very small ({max_dimension:e} units); check import scale"),
            )
            .with_detail(detail),
        ]
    } else {
        Vec::new()
    }
}

/// Static meshes are never inspected.
pub fn check_skinning(kind: &MeshKind, limits: &ValidationLimits) -> Vec<Issue> {
    match kind {
        MeshKind::Static => Vec::new(),
        MeshKind::Skinned { skeleton: None } => vec![Issue::new(
            IssueCode::SkinnedMissingSkeleton,
            "Skinned mesh has no skeleton bound".to_string(),
        )],
        MeshKind::Skinned {
            skeleton: Some(skeleton),
        } if skeleton.bone_count() > limits.max_bones => vec![
            Issue::new(
                IssueCode::SkinnedManyBones,
                format!(
                    "Skeleton has {} bones (more than {})",
                    skeleton.bone_count(),
                    limits.max_bones
                ),
            )
            .with_detail(IssueDetail::Count(skeleton.bone_count())),
        ],
        MeshKind::Skinned { .. } => Vec::new(),
    }
}
