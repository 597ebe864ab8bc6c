use std::io::{BufReader, Cursor};

use anyhow::{Context, Result};

use crate::data_structures::{
    mesh::Material,
    scene_graph::{ContainerNode, MeshNode, SceneNode},
};

/**
 * This module contains all logic for loading scenes and textures from external files.
 *
 * On native targets relative file names are resolved against `./assets`; in the
 * browser they are fetched relative to the page origin.
 */
pub mod mesh;
pub mod texture;
pub mod texture_store;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> Result<reqwest::Url> {
    let window = web_sys::window().context("no global window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("cannot read page origin: {e:?}"))?;
    let base = reqwest::Url::parse(&format!("{origin}/assets/"))?;
    Ok(base.join(file_name)?)
}

#[cfg(not(target_arch = "wasm32"))]
fn asset_path(file_name: &str) -> std::path::PathBuf {
    // Absolute paths replace the asset root.
    std::path::Path::new("./").join("assets").join(file_name)
}

pub async fn load_string(file_name: &str) -> Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = tokio::fs::read_to_string(asset_path(file_name))
        .await
        .with_context(|| format!("failed to read '{file_name}'"))?;

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = tokio::fs::read(asset_path(file_name))
        .await
        .with_context(|| format!("failed to read '{file_name}'"))?;

    Ok(data)
}

fn obj_load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

fn obj_scene(
    file_name: &str,
    models: Vec<tobj::Model>,
    materials: Result<Vec<tobj::Material>, tobj::LoadError>,
) -> ContainerNode {
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("Materials of {file_name} could not be loaded: {e}");
        Vec::new()
    });
    let mut root = ContainerNode::new(file_name);
    for (idx, model) in models.iter().enumerate() {
        match mesh::obj_to_mesh(model, &materials) {
            Ok(mesh) => root.add_child(Box::new(MeshNode::new(mesh))),
            Err(e) => log::warn!("Mesh at index {idx} in file {file_name} could not be loaded: {e:#}"),
        }
    }
    log::info!("Loaded {} meshes from {file_name}", root.children.len());
    root
}

/// Parses an OBJ document held in memory, with the text of its MTL library if any.
pub fn scene_from_obj_str(obj: &str, file_name: &str, mtl: Option<&str>) -> Result<ContainerNode> {
    let mut reader = BufReader::new(Cursor::new(obj));
    let (models, materials) = tobj::load_obj_buf(&mut reader, &obj_load_options(), |_| match mtl {
        Some(text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(text))),
        None => Err(tobj::LoadError::OpenFileFailed),
    })
    .with_context(|| format!("failed to parse OBJ '{file_name}'"))?;
    Ok(obj_scene(file_name, models, materials))
}

/// Loads an OBJ file and the material libraries it references.
pub async fn load_scene_obj(file_name: &str) -> Result<ContainerNode> {
    let obj_text = load_string(file_name).await?;
    let mut obj_reader = BufReader::new(Cursor::new(obj_text));
    let (models, materials) =
        tobj::load_obj_buf_async(&mut obj_reader, &obj_load_options(), |p| async move {
            match load_string(&p).await {
                Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                Err(e) => {
                    log::warn!("Material library {p} could not be read: {e:#}");
                    Err(tobj::LoadError::OpenFileFailed)
                }
            }
        })
        .await
        .with_context(|| format!("failed to parse OBJ '{file_name}'"))?;
    Ok(obj_scene(file_name, models, materials))
}

/**
 * Builds a scene from glTF or GLB data.
 *
 * Embedded buffers are taken from the GLB binary chunk; buffers referenced by
 * URI are fetched with [`load_binary`]. Each root node of the default scene
 * (or the first scene) becomes a child of the returned container.
 */
pub async fn scene_from_gltf_bytes(bytes: &[u8], file_name: &str) -> Result<ContainerNode> {
    let gltf = gltf::Gltf::from_slice(bytes)
        .with_context(|| format!("failed to parse glTF '{file_name}'"))?;

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .with_context(|| format!("'{file_name}' references a missing binary chunk"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(uri).await?);
            }
        }
    }

    let materials: Vec<Material> = gltf
        .materials()
        .map(|material| mesh::gltf_material(&material, file_name))
        .collect();

    let mut root = ContainerNode::new(file_name);
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("'{file_name}' contains no scene"))?;
    for node in scene.nodes() {
        root.add_child(mesh::gltf_to_scene_node(node, &buffer_data, &materials));
    }
    log::info!("Loaded {} root nodes from {file_name}", root.children.len());
    Ok(root)
}

pub async fn load_scene_gltf(file_name: &str) -> Result<ContainerNode> {
    let bytes = load_binary(file_name).await?;
    scene_from_gltf_bytes(&bytes, file_name).await
}
