//! Issues and reports produced by a validation pass.

use std::{fmt, str::FromStr};

use crate::data_structures::mesh::Identity;

/// How serious an issue is. Ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        })
    }
}

/// Every defect the analyzers know how to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    NoGeometry,
    LargeTriangleCount,
    ZeroAreaFaces,
    DuplicateVertices,
    NonManifoldEdges,
    BoundaryEdges,
    MissingNormals,
    MissingUvs,
    MissingMaterial,
    MissingTexture,
    LargeBbox,
    SmallBbox,
    SkinnedMissingSkeleton,
    SkinnedManyBones,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::NoGeometry => "no-geometry",
            IssueCode::LargeTriangleCount => "large-triangle-count",
            IssueCode::ZeroAreaFaces => "zero-area-faces",
            IssueCode::DuplicateVertices => "duplicate-vertices",
            IssueCode::NonManifoldEdges => "non-manifold-edges",
            IssueCode::BoundaryEdges => "boundary-edges",
            IssueCode::MissingNormals => "missing-normals",
            IssueCode::MissingUvs => "missing-uvs",
            IssueCode::MissingMaterial => "missing-material",
            IssueCode::MissingTexture => "missing-texture",
            IssueCode::LargeBbox => "large-bbox",
            IssueCode::SmallBbox => "small-bbox",
            IssueCode::SkinnedMissingSkeleton => "skinned-missing-skeleton",
            IssueCode::SkinnedManyBones => "skinned-many-bones",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IssueCode::NoGeometry
            | IssueCode::ZeroAreaFaces
            | IssueCode::NonManifoldEdges
            | IssueCode::SkinnedMissingSkeleton => Severity::Error,
            IssueCode::BoundaryEdges | IssueCode::MissingTexture => Severity::Info,
            _ => Severity::Warn,
        }
    }

    /// The repair family that addresses this code, if any.
    pub fn fix_kind(&self) -> Option<FixKind> {
        match self {
            IssueCode::ZeroAreaFaces => Some(FixKind::RemoveZeroAreaFaces),
            IssueCode::DuplicateVertices => Some(FixKind::MergeVertices),
            IssueCode::MissingNormals => Some(FixKind::RecomputeNormals),
            _ => None,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repair families known to the autofix registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FixKind {
    RecomputeNormals,
    MergeVertices,
    RemoveZeroAreaFaces,
}

impl FixKind {
    pub const ALL: [FixKind; 3] = [
        FixKind::RecomputeNormals,
        FixKind::MergeVertices,
        FixKind::RemoveZeroAreaFaces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FixKind::RecomputeNormals => "recompute-normals",
            FixKind::MergeVertices => "merge-vertices",
            FixKind::RemoveZeroAreaFaces => "remove-zero-area-faces",
        }
    }
}

impl fmt::Display for FixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FixKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown autofix '{s}'"))
    }
}

/// Structured payload attached to an issue.
#[derive(Clone, Debug, PartialEq)]
pub enum IssueDetail {
    /// A plain count (triangles, duplicates, edges, bones).
    Count(usize),
    /// Degenerate faces: total count plus the first few face ordinals.
    SampleFaces { count: usize, sample_faces: Vec<usize> },
    /// World-space bounding box extent.
    BoundingBox { size: [f64; 3], max_dimension: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Issue {
    pub code: IssueCode,
    pub severity: Severity,
    pub message: String,
    pub fix_available: bool,
    pub detail: Option<IssueDetail>,
}

impl Issue {
    /// Severity and fix availability follow from the code.
    pub fn new(code: IssueCode, message: String) -> Self {
        Self {
            code,
            severity: code.severity(),
            message,
            fix_available: code.fix_kind().is_some(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: IssueDetail) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Issues found on one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshReport {
    pub mesh: Identity,
    pub issues: Vec<Issue>,
}

/// Mesh reports found below one top-level object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectReport {
    pub object: Identity,
    pub meshes: Vec<MeshReport>,
}

/// Result of validating a whole scene. Objects without issues are omitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneReport {
    pub objects: Vec<ObjectReport>,
}

impl SceneReport {
    pub fn is_clean(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn issues(&self) -> impl Iterator<Item = (&Identity, &Issue)> {
        self.objects
            .iter()
            .flat_map(|object| object.meshes.iter())
            .flat_map(|mesh| mesh.issues.iter().map(move |issue| (&mesh.mesh, issue)))
    }

    pub fn issue_count(&self) -> usize {
        self.issues().count()
    }

    pub fn has_errors(&self) -> bool {
        self.issues()
            .any(|(_, issue)| issue.severity == Severity::Error)
    }
}
