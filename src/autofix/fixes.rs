use std::collections::HashMap;

use anyhow::{Result, bail};
use cgmath::{InnerSpace, Vector3, Zero};

use crate::{
    autofix::{Autofix, FixPlan},
    data_structures::{
        geometry::{AttributeKind, BufferAttribute, Geometry, IndexBuffer},
        mesh::GeometryEdit,
    },
    validation::issue::FixKind,
};

/**
 * Regenerates vertex normals from positions and topology.
 *
 * Indexed geometry accumulates the area-weighted face normal of every adjacent
 * triangle per vertex, so shared vertices come out smooth. Non-indexed geometry
 * gets flat shading. Vertices without any measurable face keep a zero normal.
 */
pub struct RecomputeNormals;

impl Autofix for RecomputeNormals {
    fn kind(&self) -> FixKind {
        FixKind::RecomputeNormals
    }

    fn plan(&self, geometry: &Geometry) -> Result<FixPlan> {
        let mut normals = vec![Vector3::<f64>::zero(); geometry.vertex_count()];
        for tri in geometry.triangles() {
            let (Some(a), Some(b), Some(c)) = (
                geometry.position(tri[0]),
                geometry.position(tri[1]),
                geometry.position(tri[2]),
            ) else {
                continue;
            };
            // Unnormalized, so larger faces weigh more.
            let face_normal = (b - a).cross(c - a);
            for v in tri {
                normals[v as usize] += face_normal;
            }
        }

        let array = normals
            .into_iter()
            .flat_map(|n| {
                let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect();
        let normals = BufferAttribute::new(array, AttributeKind::Normal.item_size())?;

        Ok(FixPlan {
            edit: Some(GeometryEdit::Normals(normals)),
            message: format!("Recomputed normals for {} vertices", geometry.vertex_count()),
        })
    }
}

/**
 * Welds vertices whose attributes all agree within a tolerance.
 *
 * Every attribute value is quantized to the tolerance; vertices with identical
 * quantized position, normal and uv collapse into one. The result is a new,
 * always indexed geometry whose index buffer is remapped onto the survivors.
 * Indexed geometry without anything to weld is left as is.
 */
pub struct MergeVertices {
    tolerance: f64,
}

impl MergeVertices {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    fn quantize(&self, value: f32) -> i64 {
        (value as f64 / self.tolerance).round() as i64
    }
}

impl Autofix for MergeVertices {
    fn kind(&self) -> FixKind {
        FixKind::MergeVertices
    }

    fn plan(&self, geometry: &Geometry) -> Result<FixPlan> {
        if !(self.tolerance > 0.0) {
            bail!("weld tolerance must be positive, got {}", self.tolerance);
        }
        let attributes: Vec<(AttributeKind, &BufferAttribute)> = [
            AttributeKind::Position,
            AttributeKind::Normal,
            AttributeKind::Uv,
        ]
        .into_iter()
        .filter_map(|kind| geometry.attribute(kind).map(|attr| (kind, attr)))
        .collect();

        let source_indices: Vec<u32> = match geometry.index() {
            Some(index) => index.indices().to_vec(),
            None => (0..geometry.vertex_count() as u32).collect(),
        };

        let mut merged: HashMap<Vec<i64>, u32> = HashMap::new();
        let mut remapped: HashMap<u32, u32> = HashMap::new();
        let mut new_arrays: Vec<Vec<f32>> = vec![Vec::new(); attributes.len()];
        let mut new_indices = Vec::with_capacity(source_indices.len());

        for &vertex in &source_indices {
            if let Some(&target) = remapped.get(&vertex) {
                new_indices.push(target);
                continue;
            }
            let key: Vec<i64> = attributes
                .iter()
                .filter_map(|(_, attr)| attr.get(vertex as usize))
                .flatten()
                .map(|&v| self.quantize(v))
                .collect();
            let next = merged.len() as u32;
            let target = *merged.entry(key).or_insert_with(|| {
                for ((_, attr), array) in attributes.iter().zip(new_arrays.iter_mut()) {
                    if let Some(values) = attr.get(vertex as usize) {
                        array.extend_from_slice(values);
                    }
                }
                next
            });
            remapped.insert(vertex, target);
            new_indices.push(target);
        }

        let before = geometry.vertex_count();
        let after = merged.len();
        // Unreferenced vertices are dropped but not counted as welds.
        let welds = remapped.len() - after;
        if welds == 0 && geometry.index().is_some() {
            return Ok(FixPlan {
                edit: None,
                message: "No vertices to merge".to_string(),
            });
        }

        let mut rebuilt: HashMap<AttributeKind, Vec<f32>> = attributes
            .iter()
            .map(|(kind, _)| *kind)
            .zip(new_arrays)
            .collect();
        let mut welded =
            Geometry::new(rebuilt.remove(&AttributeKind::Position).unwrap_or_default())?;
        if let Some(normals) = rebuilt.remove(&AttributeKind::Normal) {
            welded = welded.with_normals(normals)?;
        }
        if let Some(uvs) = rebuilt.remove(&AttributeKind::Uv) {
            welded = welded.with_uvs(uvs)?;
        }
        let welded = welded.with_index(new_indices);

        Ok(FixPlan {
            edit: Some(GeometryEdit::Replace(welded)),
            message: format!("Merged {welds} vertices ({before} -> {after})"),
        })
    }
}

/**
 * Drops every triangle whose area is at or below the epsilon.
 *
 * Uses the same predicate as the zero-area analyzer, so re-running the analyzer
 * afterwards finds nothing. Non-indexed geometry receives an index buffer over
 * the surviving triangles.
 */
pub struct RemoveZeroAreaFaces {
    epsilon: f64,
}

impl RemoveZeroAreaFaces {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }
}

impl Autofix for RemoveZeroAreaFaces {
    fn kind(&self) -> FixKind {
        FixKind::RemoveZeroAreaFaces
    }

    fn plan(&self, geometry: &Geometry) -> Result<FixPlan> {
        let mut kept = Vec::with_capacity(geometry.triangle_count() * 3);
        let mut removed = 0;
        for tri in geometry.triangles() {
            match geometry.triangle_area(tri) {
                Some(area) if area > self.epsilon => kept.extend_from_slice(&tri),
                _ => removed += 1,
            }
        }

        if removed == 0 {
            return Ok(FixPlan {
                edit: None,
                message: "No zero-area faces found".to_string(),
            });
        }
        Ok(FixPlan {
            edit: Some(GeometryEdit::Index(IndexBuffer::new(kept))),
            message: format!("Removed {removed} zero-area faces"),
        })
    }
}
