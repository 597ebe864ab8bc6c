use std::{
    cell::Cell,
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};

use anyhow::{Result, bail};
use asset_integrity::{
    data_structures::{
        geometry::Geometry,
        mesh::{Material, Mesh},
    },
    resources::texture::{ObjectUrl, TextureBackend, TextureFile},
};

/// A single triangle in the XY plane, not indexed.
pub(crate) fn triangle() -> Geometry {
    Geometry::new(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]).unwrap()
}

/// Two coincident vertices: the triangle has no area.
pub(crate) fn degenerate_triangle() -> Geometry {
    Geometry::new(vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap()
}

/// Unit quad made of two indexed triangles sharing the diagonal.
pub(crate) fn quad() -> Geometry {
    Geometry::new(vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0,
    ])
    .unwrap()
    .with_index(vec![0, 1, 2, 0, 2, 3])
}

/// The same quad as six loose vertices, two of them repeated.
pub(crate) fn quad_soup() -> Geometry {
    Geometry::new(vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, //
        1.0, 1.0, 0.0, //
        0.0, 1.0, 0.0,
    ])
    .unwrap()
}

/// Three fins hanging off the edge 0-1.
pub(crate) fn three_fins() -> Geometry {
    Geometry::new(vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, -1.0, 0.0, //
        0.0, 0.0, 1.0,
    ])
    .unwrap()
    .with_index(vec![0, 1, 2, 1, 0, 3, 0, 1, 4])
}

/// Closed tetrahedron with normals and uvs: every edge is shared by two faces.
pub(crate) fn tetrahedron() -> Geometry {
    let positions = vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0,
    ];
    let normals = vec![
        -1.0, -1.0, -1.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0,
    ];
    let uvs = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
    Geometry::new(positions)
        .unwrap()
        .with_normals(normals)
        .unwrap()
        .with_uvs(uvs)
        .unwrap()
        .with_index(vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3])
}

/// A mesh that passes every check.
pub(crate) fn clean_mesh(name: &str) -> Mesh {
    Mesh::new(name, tetrahedron()).with_material(Material::new("clay"))
}

pub(crate) fn codes(issues: &[asset_integrity::validation::Issue]) -> Vec<&'static str> {
    issues.iter().map(|issue| issue.code.as_str()).collect()
}

/// Resolves to `Pending` once so other futures get polled in between.
pub(crate) struct YieldOnce(bool);

impl YieldOnce {
    pub(crate) fn new() -> Self {
        Self(false)
    }
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FakeTexture {
    pub(crate) label: String,
}

/// Texture backend that records every call. Files with empty bytes fail to decode.
#[derive(Default)]
pub(crate) struct CountingBackend {
    pub(crate) urls_created: Cell<usize>,
    pub(crate) decodes: Cell<usize>,
    pub(crate) disposals: Cell<usize>,
    pub(crate) revocations: Cell<usize>,
    pub(crate) fail_dispose: Cell<bool>,
    pub(crate) fail_revoke: Cell<bool>,
}

impl CountingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

fn bump(counter: &Cell<usize>) {
    counter.set(counter.get() + 1);
}

impl TextureBackend for CountingBackend {
    type Handle = Rc<FakeTexture>;

    fn create_object_url(&self, file: &TextureFile) -> ObjectUrl {
        bump(&self.urls_created);
        ObjectUrl(format!("blob:test/{}/{}", self.urls_created.get(), file.label()))
    }

    async fn decode(&self, file: &TextureFile, _url: &ObjectUrl) -> Result<Self::Handle> {
        bump(&self.decodes);
        YieldOnce::new().await;
        if file.bytes.is_empty() {
            bail!("{} is not an image", file.label());
        }
        Ok(Rc::new(FakeTexture {
            label: file.label().to_string(),
        }))
    }

    fn dispose(&self, _handle: &Self::Handle) -> Result<()> {
        bump(&self.disposals);
        if self.fail_dispose.get() {
            bail!("dispose failed");
        }
        Ok(())
    }

    fn revoke_object_url(&self, _url: &ObjectUrl) -> Result<()> {
        bump(&self.revocations);
        if self.fail_revoke.get() {
            bail!("revoke failed");
        }
        Ok(())
    }
}

pub(crate) fn texture_file(name: &str) -> TextureFile {
    TextureFile::new(Some(name), vec![1, 2, 3])
}

/// Encodes a small checkerboard as PNG.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    });
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Packs a glTF JSON document and its binary buffer into a GLB container.
pub(crate) fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json_chunk = json.as_bytes().to_vec();
    while json_chunk.len() % 4 != 0 {
        json_chunk.push(b' ');
    }
    let mut bin_chunk = bin.to_vec();
    while bin_chunk.len() % 4 != 0 {
        bin_chunk.push(0);
    }
    let total = 12 + 8 + json_chunk.len() + 8 + bin_chunk.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json_chunk);
    out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin_chunk);
    out
}
