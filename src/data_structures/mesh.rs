//! Renderable meshes and the metadata the validators read from them.

use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::{Result, bail};

use crate::data_structures::geometry::{BufferAttribute, Geometry, IndexBuffer};

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// Hands out process-unique ids for meshes and scene nodes.
pub fn next_id() -> u32 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Bones a skinned mesh is bound to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<String>,
}

impl Skeleton {
    pub fn new(bones: Vec<String>) -> Self {
        Self { bones }
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }
}

/// Deformation model of a mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum MeshKind {
    #[default]
    Static,
    Skinned { skeleton: Option<Skeleton> },
}

/// Surface description of a mesh as far as validation is concerned.
///
/// `expects_texture` is set by importers when the source material referenced
/// a color map; `map` is the texture store key once one is bound.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub expects_texture: bool,
    pub map: Option<String>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn expecting_texture(mut self) -> Self {
        self.expects_texture = true;
        self
    }

    pub fn with_map(mut self, key: &str) -> Self {
        self.map = Some(key.to_string());
        self
    }
}

/// Name and unique id of a mesh or node, as they appear in reports.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    pub name: String,
    pub id: u32,
}

/// A buffer swap produced by a repair operation.
///
/// Repairs never touch the mesh they inspect; they hand back one of these and
/// [`Mesh::apply`] performs the swap in a single step.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryEdit {
    Normals(BufferAttribute),
    Index(IndexBuffer),
    Replace(Geometry),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: String,
    id: u32,
    pub geometry: Option<Geometry>,
    pub material: Option<Material>,
    pub kind: MeshKind,
}

impl Mesh {
    pub fn new(name: &str, geometry: Geometry) -> Self {
        Self {
            name: name.to_string(),
            id: next_id(),
            geometry: Some(geometry),
            material: None,
            kind: MeshKind::Static,
        }
    }

    /// A mesh whose geometry was never loaded.
    pub fn without_geometry(name: &str) -> Self {
        Self {
            geometry: None,
            ..Self::new(name, Geometry::empty())
        }
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_kind(mut self, kind: MeshKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn identity(&self) -> Identity {
        Identity {
            name: self.name.clone(),
            id: self.id,
        }
    }

    pub fn apply(&mut self, edit: GeometryEdit) -> Result<()> {
        match edit {
            GeometryEdit::Replace(geometry) => self.geometry = Some(geometry),
            GeometryEdit::Normals(normals) => match self.geometry.as_mut() {
                Some(geometry) => geometry.set_normals(normals),
                None => bail!("mesh {} has no geometry to receive normals", self.name),
            },
            GeometryEdit::Index(index) => match self.geometry.as_mut() {
                Some(geometry) => geometry.set_index(index),
                None => bail!("mesh {} has no geometry to receive an index", self.name),
            },
        }
        Ok(())
    }
}
