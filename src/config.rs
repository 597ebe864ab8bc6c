//! Thresholds used by the analyzers and the autofix operations.
//!
//! Both structs are plain data with public fields so an editor can tune them
//! at runtime. The defaults are the values the editor ships with.

/// Limits applied by the defect analyzers.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationLimits {
    /// Triangle count above which `large-triangle-count` is reported.
    pub max_triangles: usize,
    /// A triangle whose area is at or below this value is degenerate.
    pub zero_area_epsilon: f64,
    /// Decimal digits kept per axis when quantizing positions for the
    /// duplicate vertex heuristic.
    pub duplicate_precision: i32,
    /// Maximum number of face indices attached to a `zero-area-faces` issue.
    pub sample_faces: usize,
    /// Largest bounding box dimension still considered sane.
    pub large_bbox: f64,
    /// Smallest positive bounding box dimension still considered sane.
    pub small_bbox: f64,
    /// Bone count above which `skinned-many-bones` is reported.
    pub max_bones: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_triangles: 200_000,
            zero_area_epsilon: 1e-8,
            duplicate_precision: 6,
            sample_faces: 5,
            large_bbox: 1000.0,
            small_bbox: 1e-3,
            max_bones: 128,
        }
    }
}

/// Tolerances used by the repair operations.
#[derive(Clone, Debug, PartialEq)]
pub struct AutofixTolerances {
    /// Attribute values closer than this are welded by `merge-vertices`.
    pub weld_tolerance: f64,
    /// Triangles at or below this area are dropped by `remove-zero-area-faces`.
    pub zero_area_epsilon: f64,
}

impl Default for AutofixTolerances {
    fn default() -> Self {
        Self {
            weld_tolerance: 1e-6,
            zero_area_epsilon: ValidationLimits::default().zero_area_epsilon,
        }
    }
}

impl From<&ValidationLimits> for AutofixTolerances {
    /// Keeps the repair predicate identical to the analyzer predicate.
    fn from(limits: &ValidationLimits) -> Self {
        Self {
            zero_area_epsilon: limits.zero_area_epsilon,
            ..Default::default()
        }
    }
}
