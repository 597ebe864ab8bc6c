//! Vertex and index buffers of a mesh.
//!
//! [`Geometry`] is the read/write view the analyzers and repair operations work
//! against. Attributes are flat `f32` arrays with a fixed stride, exactly as the
//! rendering engine uploads them; the optional index buffer is a flat `u32`
//! array with stride 3.

use anyhow::{Result, bail};
use cgmath::{InnerSpace, Vector3, Vector4};

/// The attribute buffers a geometry may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Position,
    Normal,
    Uv,
}

impl AttributeKind {
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::Position => "position",
            AttributeKind::Normal => "normal",
            AttributeKind::Uv => "uv",
        }
    }

    /// Number of components per element.
    pub fn item_size(&self) -> usize {
        match self {
            AttributeKind::Position | AttributeKind::Normal => 3,
            AttributeKind::Uv => 2,
        }
    }
}

/// A flat attribute array with a per-element stride.
///
/// `needs_upload` is raised whenever the contents were produced on the CPU
/// and the renderer has to push them to the GPU again.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferAttribute {
    array: Vec<f32>,
    item_size: usize,
    needs_upload: bool,
}

impl BufferAttribute {
    pub fn new(array: Vec<f32>, item_size: usize) -> Result<Self> {
        if item_size == 0 {
            bail!("attribute stride must be positive");
        }
        if array.len() % item_size != 0 {
            bail!(
                "attribute length {} is not a multiple of its stride {}",
                array.len(),
                item_size
            );
        }
        Ok(Self {
            array,
            item_size,
            needs_upload: false,
        })
    }

    pub fn count(&self) -> usize {
        self.array.len() / self.item_size
    }

    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn array(&self) -> &[f32] {
        &self.array
    }

    /// The components of element `idx`, if it exists.
    pub fn get(&self, idx: usize) -> Option<&[f32]> {
        let start = idx.checked_mul(self.item_size)?;
        self.array.get(start..start + self.item_size)
    }

    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    pub fn mark_needs_upload(&mut self) {
        self.needs_upload = true;
    }

    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }
}

/// Triangle list indices into the attribute buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexBuffer {
    indices: Vec<u32>,
    needs_upload: bool,
}

impl IndexBuffer {
    pub fn new(indices: Vec<u32>) -> Self {
        Self {
            indices,
            needs_upload: false,
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn needs_upload(&self) -> bool {
        self.needs_upload
    }

    pub fn mark_needs_upload(&mut self) {
        self.needs_upload = true;
    }

    pub fn mark_uploaded(&mut self) {
        self.needs_upload = false;
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl BoundingBox {
    fn from_point(p: Vector3<f64>) -> Self {
        Self { min: p, max: p }
    }

    fn expand(&mut self, p: Vector3<f64>) {
        self.min = Vector3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Vector3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f64 {
        let size = self.size();
        size.x.max(size.y).max(size.z)
    }
}

/// Vertex buffers plus the optional index buffer of one mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    positions: BufferAttribute,
    normals: Option<BufferAttribute>,
    uvs: Option<BufferAttribute>,
    index: Option<IndexBuffer>,
}

impl Geometry {
    pub fn new(positions: Vec<f32>) -> Result<Self> {
        Ok(Self {
            positions: BufferAttribute::new(positions, AttributeKind::Position.item_size())?,
            normals: None,
            uvs: None,
            index: None,
        })
    }

    /// A geometry without any vertex data.
    pub fn empty() -> Self {
        Self {
            positions: BufferAttribute {
                array: Vec::new(),
                item_size: AttributeKind::Position.item_size(),
                needs_upload: false,
            },
            normals: None,
            uvs: None,
            index: None,
        }
    }

    pub fn with_normals(mut self, normals: Vec<f32>) -> Result<Self> {
        self.normals = Some(BufferAttribute::new(
            normals,
            AttributeKind::Normal.item_size(),
        )?);
        Ok(self)
    }

    pub fn with_uvs(mut self, uvs: Vec<f32>) -> Result<Self> {
        self.uvs = Some(BufferAttribute::new(uvs, AttributeKind::Uv.item_size())?);
        Ok(self)
    }

    /// Indices are not range-checked here; see [`Geometry::check_topology`].
    pub fn with_index(mut self, indices: Vec<u32>) -> Self {
        self.index = Some(IndexBuffer::new(indices));
        self
    }

    pub fn attribute(&self, kind: AttributeKind) -> Option<&BufferAttribute> {
        match kind {
            AttributeKind::Position => Some(&self.positions),
            AttributeKind::Normal => self.normals.as_ref(),
            AttributeKind::Uv => self.uvs.as_ref(),
        }
    }

    pub fn positions(&self) -> &BufferAttribute {
        &self.positions
    }

    pub fn normals(&self) -> Option<&BufferAttribute> {
        self.normals.as_ref()
    }

    pub fn uvs(&self) -> Option<&BufferAttribute> {
        self.uvs.as_ref()
    }

    pub fn index(&self) -> Option<&IndexBuffer> {
        self.index.as_ref()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.count()
    }

    /// True when there is neither vertex nor index data.
    pub fn is_empty(&self) -> bool {
        self.positions.count() == 0 && self.index.is_none()
    }

    /// Replaces the normal buffer and flags it for re-upload.
    pub fn set_normals(&mut self, mut normals: BufferAttribute) {
        normals.mark_needs_upload();
        self.normals = Some(normals);
    }

    /// Replaces the whole index buffer and flags it for re-upload.
    pub fn set_index(&mut self, mut index: IndexBuffer) {
        index.mark_needs_upload();
        self.index = Some(index);
    }

    /// `index.count / 3` when indexed, `position.count / 3` otherwise.
    pub fn triangle_count(&self) -> usize {
        match &self.index {
            Some(index) => index.count() / 3,
            None => self.positions.count() / 3,
        }
    }

    /// Vertex indices of every complete triangle, in face order.
    ///
    /// Non-indexed geometry is read as consecutive vertex triples. A trailing
    /// partial triangle is ignored.
    pub fn triangles(&self) -> Box<dyn Iterator<Item = [u32; 3]> + '_> {
        match &self.index {
            Some(index) => Box::new(
                index
                    .indices()
                    .chunks_exact(3)
                    .map(|c| [c[0], c[1], c[2]]),
            ),
            None => Box::new((0..self.positions.count() as u32 / 3).map(|f| {
                let base = f * 3;
                [base, base + 1, base + 2]
            })),
        }
    }

    /// Position of vertex `idx` in object space.
    pub fn position(&self, idx: u32) -> Option<Vector3<f64>> {
        self.positions
            .get(idx as usize)
            .map(|p| Vector3::new(p[0] as f64, p[1] as f64, p[2] as f64))
    }

    /// Area of a triangle, `None` when one of its vertices does not exist.
    pub fn triangle_area(&self, tri: [u32; 3]) -> Option<f64> {
        let a = self.position(tri[0])?;
        let b = self.position(tri[1])?;
        let c = self.position(tri[2])?;
        Some(0.5 * (b - a).cross(c - a).magnitude())
    }

    /// Fails when the buffers cannot be interpreted as a triangle list:
    /// a dangling index, an index length that is not a multiple of 3, or an
    /// attribute whose element count differs from the position count.
    pub fn check_topology(&self) -> Result<()> {
        let vertex_count = self.vertex_count();
        for kind in [AttributeKind::Normal, AttributeKind::Uv] {
            if let Some(attribute) = self.attribute(kind) {
                if attribute.count() != vertex_count {
                    bail!(
                        "{} buffer has {} elements but there are {} positions",
                        kind.name(),
                        attribute.count(),
                        vertex_count
                    );
                }
            }
        }
        match &self.index {
            Some(index) => {
                if index.count() % 3 != 0 {
                    bail!("index buffer length {} is not a multiple of 3", index.count());
                }
                if let Some(bad) = index
                    .indices()
                    .iter()
                    .find(|&&i| i as usize >= vertex_count)
                {
                    bail!(
                        "index {} is out of range for {} vertices",
                        bad,
                        vertex_count
                    );
                }
            }
            None => {
                if vertex_count % 3 != 0 {
                    bail!(
                        "non-indexed geometry has {} vertices, not a multiple of 3",
                        vertex_count
                    );
                }
            }
        }
        Ok(())
    }

    /// Bounding box of all positions after applying `world`.
    ///
    /// `None` when the geometry has no positions.
    pub fn world_bounding_box(&self, world: &cgmath::Matrix4<f32>) -> Option<BoundingBox> {
        let mut points = self.positions.array().chunks_exact(3).map(|p| {
            let v = world * Vector4::new(p[0], p[1], p[2], 1.0);
            Vector3::new(v.x as f64, v.y as f64, v.z as f64)
        });
        let mut bbox = BoundingBox::from_point(points.next()?);
        points.for_each(|p| bbox.expand(p));
        Some(bbox)
    }
}
