//! asset-integrity
//!
//! The asset integrity core of a browser-hosted 3D editor. It inspects mesh
//! geometry for structural defects, repairs the common ones and manages the
//! lifetime of shared textures loaded from user files. Rendering is left to
//! the host engine; this crate only reads and rewrites geometry buffers and
//! owns decoded textures. Works natively and on WASM.
//!
//! High-level modules
//! - `config`: thresholds for the analyzers and tolerances for the repairs
//! - `context`: logger setup and the per-editor bundle of validator, repairs and textures
//! - `data_structures`: geometry buffers, meshes, transforms, scene graph and textures
//! - `validation`: defect analyzers, mesh and scene validators, issue reports
//! - `autofix`: repair operations keyed by issue family
//! - `resources`: file loading, glTF/OBJ import and the reference-counted texture store
//! - `web`: JavaScript bindings (wasm32 only)
//!

pub mod autofix;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod resources;
pub mod validation;
#[cfg(target_arch = "wasm32")]
pub mod web;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use context::{IntegrityContext, init_logging};
