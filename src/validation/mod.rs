//! Mesh and scene validation.
//!
//! - `analyzers` contains the independent defect checks
//! - `issue` holds issue codes, severities and report structures
//! - `mesh` orchestrates the analyzers over one mesh
//! - `scene` walks a scene graph and collects per-object reports

pub mod analyzers;
pub mod issue;
pub mod mesh;
pub mod scene;

pub use issue::{FixKind, Issue, IssueCode, IssueDetail, MeshReport, ObjectReport, SceneReport, Severity};
pub use mesh::MeshValidator;
pub use scene::SceneValidator;
