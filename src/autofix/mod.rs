//! Automated repairs keyed by issue family.
//!
//! A repair is planned against an immutable [`Geometry`] and yields a
//! [`FixPlan`]: an optional [`GeometryEdit`] plus a human readable message. The
//! registry applies the edit to the mesh in one step, so a repair either
//! rewrites its buffers completely or leaves the mesh untouched.
//!
//! Repairs never fail past the registry boundary. Malformed buffers, missing or
//! empty geometry and unknown fix names all come back as `FixOutcome { ok: false, .. }`.
//! Callers are responsible for not running a repair concurrently with a
//! validation pass or another repair on the same mesh.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};

use crate::{
    config::AutofixTolerances,
    data_structures::{
        geometry::Geometry,
        mesh::{GeometryEdit, Mesh},
    },
    validation::issue::{FixKind, Issue},
};

mod fixes;

pub use fixes::{MergeVertices, RecomputeNormals, RemoveZeroAreaFaces};

/// What a repair intends to do. `edit` is `None` when there is nothing to change.
#[derive(Clone, Debug, PartialEq)]
pub struct FixPlan {
    pub edit: Option<GeometryEdit>,
    pub message: String,
}

/// Result reported back to the caller of [`AutofixRegistry::fix`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixOutcome {
    pub ok: bool,
    pub message: String,
}

impl FixOutcome {
    fn failed(message: String) -> Self {
        Self { ok: false, message }
    }
}

pub trait Autofix {
    fn kind(&self) -> FixKind;

    /// Computes the repair without touching `geometry`.
    fn plan(&self, geometry: &Geometry) -> Result<FixPlan>;
}

pub struct AutofixRegistry {
    fixes: HashMap<FixKind, Box<dyn Autofix>>,
}

impl AutofixRegistry {
    /// A registry without any repairs.
    pub fn empty() -> Self {
        Self {
            fixes: HashMap::new(),
        }
    }

    /// A registry holding the three built-in repairs.
    pub fn new(tolerances: &AutofixTolerances) -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(RecomputeNormals));
        registry.register(Box::new(MergeVertices::new(tolerances.weld_tolerance)));
        registry.register(Box::new(RemoveZeroAreaFaces::new(
            tolerances.zero_area_epsilon,
        )));
        registry
    }

    /// Registers `fix`, replacing any previous entry of the same kind.
    pub fn register(&mut self, fix: Box<dyn Autofix>) {
        self.fixes.insert(fix.kind(), fix);
    }

    pub fn has_fix(&self, kind: FixKind) -> bool {
        self.fixes.contains_key(&kind)
    }

    /// Plans the repair `kind` for `mesh` without applying it.
    pub fn plan(&self, kind: FixKind, mesh: &Mesh) -> Result<FixPlan> {
        let fix = self
            .fixes
            .get(&kind)
            .with_context(|| format!("no autofix registered for '{kind}'"))?;
        let geometry = match mesh.geometry.as_ref() {
            Some(geometry) if !geometry.is_empty() => geometry,
            _ => bail!("mesh '{}' has no geometry", mesh.name),
        };
        geometry
            .check_topology()
            .with_context(|| format!("cannot {kind} on mesh '{}'", mesh.name))?;
        fix.plan(geometry)
    }

    pub fn fix(&self, kind: FixKind, mesh: &mut Mesh) -> FixOutcome {
        let plan = match self.plan(kind, mesh) {
            Ok(plan) => plan,
            Err(e) => {
                log::warn!("{kind} failed on mesh '{}': {e:#}", mesh.name);
                return FixOutcome::failed(format!("{e:#}"));
            }
        };
        if let Some(edit) = plan.edit {
            if let Err(e) = mesh.apply(edit) {
                log::warn!("{kind} could not be applied to mesh '{}': {e:#}", mesh.name);
                return FixOutcome::failed(format!("{e:#}"));
            }
        }
        log::info!("{kind} on mesh '{}': {}", mesh.name, plan.message);
        FixOutcome {
            ok: true,
            message: plan.message,
        }
    }

    /// Resolves a textual fix family such as `"merge-vertices"`.
    pub fn fix_by_name(&self, name: &str, mesh: &mut Mesh) -> FixOutcome {
        match name.parse::<FixKind>() {
            Ok(kind) => self.fix(kind, mesh),
            Err(e) => FixOutcome::failed(e.to_string()),
        }
    }

    /// Runs the repair advertised by `issue`.
    pub fn fix_issue(&self, issue: &Issue, mesh: &mut Mesh) -> FixOutcome {
        match issue.code.fix_kind() {
            Some(kind) => self.fix(kind, mesh),
            None => FixOutcome::failed(format!("no autofix available for '{}'", issue.code)),
        }
    }
}

impl Default for AutofixRegistry {
    fn default() -> Self {
        Self::new(&AutofixTolerances::default())
    }
}
