//! JavaScript entry points for the browser build.

use wasm_bindgen::prelude::*;

use crate::{
    data_structures::{geometry::Geometry, mesh::Mesh},
    validation::mesh::MeshValidator,
};

fn geometry_from_buffers(
    positions: Vec<f32>,
    normals: Option<Vec<f32>>,
    uvs: Option<Vec<f32>>,
    indices: Option<Vec<u32>>,
) -> anyhow::Result<Geometry> {
    let mut geometry = Geometry::new(positions)?;
    if let Some(normals) = normals {
        geometry = geometry.with_normals(normals)?;
    }
    if let Some(uvs) = uvs {
        geometry = geometry.with_uvs(uvs)?;
    }
    if let Some(indices) = indices {
        geometry = geometry.with_index(indices);
    }
    Ok(geometry)
}

#[wasm_bindgen(start)]
pub fn start() {
    crate::context::init_logging();
}

/// Validates flat vertex buffers with the default limits and returns one
/// `"<severity> <code>: <message>"` line per issue.
#[wasm_bindgen]
pub fn analyze_buffers(
    name: &str,
    positions: Vec<f32>,
    normals: Option<Vec<f32>>,
    uvs: Option<Vec<f32>>,
    indices: Option<Vec<u32>>,
) -> Result<Vec<String>, JsError> {
    let geometry = geometry_from_buffers(positions, normals, uvs, indices)
        .map_err(|e| JsError::new(&format!("{e:#}")))?;
    let mesh = Mesh::new(name, geometry);
    Ok(MeshValidator::default()
        .analyze(&mesh)
        .into_iter()
        .map(|issue| format!("{} {}: {}", issue.severity, issue.code, issue.message))
        .collect())
}
