//! Data structures the integrity core reads and rewrites.
//!
//! - `geometry` holds vertex attribute and index buffers plus triangle queries
//! - `mesh` contains meshes, materials, skeletons and geometry edits
//! - `scene_graph` enables hierarchical scene organization and traversal
//! - `texture` contains decoded images and GPU texture wrappers
//! - `transform` holds local transforms and their composition

pub mod geometry;
pub mod mesh;
pub mod scene_graph;
pub mod texture;
pub mod transform;
