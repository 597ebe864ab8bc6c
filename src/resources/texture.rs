//! Texture files and the decode backends the texture store drives.
//!
//! A [`TextureBackend`] turns a raw [`TextureFile`] into an opaque resource
//! handle and knows how to free that handle again. The transient
//! [`ObjectUrl`] mirrors the browser's `URL.createObjectURL` life cycle: one is
//! minted per decode attempt and must be revoked exactly once.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use anyhow::Result;

use crate::{
    data_structures::texture::{DecodedTexture, Texture},
    resources::load_binary,
};

/// A user supplied image file.
#[derive(Clone, Debug, Default)]
pub struct TextureFile {
    pub name: Option<String>,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl TextureFile {
    pub fn new(name: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.map(str::to_string),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.to_string());
        self
    }

    /// Reads `file_name` through the asset loader.
    pub async fn load(file_name: &str) -> Result<Self> {
        let bytes = load_binary(file_name).await?;
        Ok(Self::new(Some(file_name), bytes))
    }

    /// Format hint for the decoder: the mime subtype, else the file extension.
    pub fn format_hint(&self) -> Option<&str> {
        self.mime_type
            .as_deref()
            .and_then(|mt| mt.split('/').last())
            .or_else(|| {
                self.name
                    .as_deref()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext)
            })
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed texture")
    }
}

/// A transient URL handed to the decoder for the duration of a load.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectUrl(pub String);

#[allow(async_fn_in_trait)]
pub trait TextureBackend {
    type Handle: Clone;

    fn create_object_url(&self, file: &TextureFile) -> ObjectUrl;

    /// Decodes `file`, which is reachable under `url` while this runs.
    async fn decode(&self, file: &TextureFile, url: &ObjectUrl) -> Result<Self::Handle>;

    fn dispose(&self, handle: &Self::Handle) -> Result<()>;

    fn revoke_object_url(&self, url: &ObjectUrl) -> Result<()>;
}

/// Mints `blob:` style URLs that are unique for the lifetime of the process.
#[derive(Debug, Default)]
struct UrlMinter {
    next: AtomicU64,
}

impl UrlMinter {
    fn mint(&self, file: &TextureFile) -> ObjectUrl {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        ObjectUrl(format!("blob:asset-integrity/{n}/{}", file.label()))
    }
}

/// Decodes into CPU memory with the `image` crate.
#[derive(Debug, Default)]
pub struct ImageBackend {
    urls: UrlMinter,
}

impl ImageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TextureBackend for ImageBackend {
    type Handle = Arc<DecodedTexture>;

    fn create_object_url(&self, file: &TextureFile) -> ObjectUrl {
        self.urls.mint(file)
    }

    async fn decode(&self, file: &TextureFile, url: &ObjectUrl) -> Result<Self::Handle> {
        log::debug!("decoding {} from {}", file.label(), url.0);
        let decoded = DecodedTexture::from_bytes(&file.bytes, file.label(), file.format_hint())?;
        Ok(Arc::new(decoded))
    }

    fn dispose(&self, handle: &Self::Handle) -> Result<()> {
        // The pixels are freed once the last clone of the handle drops.
        log::debug!("disposing {}", handle.label);
        Ok(())
    }

    fn revoke_object_url(&self, url: &ObjectUrl) -> Result<()> {
        log::debug!("revoking {}", url.0);
        Ok(())
    }
}

/// Decodes on the CPU and uploads the pixels into a WGPU texture.
#[derive(Debug)]
pub struct GpuTextureBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    urls: UrlMinter,
}

impl GpuTextureBackend {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            urls: UrlMinter::default(),
        }
    }
}

impl TextureBackend for GpuTextureBackend {
    type Handle = Arc<Texture>;

    fn create_object_url(&self, file: &TextureFile) -> ObjectUrl {
        self.urls.mint(file)
    }

    async fn decode(&self, file: &TextureFile, url: &ObjectUrl) -> Result<Self::Handle> {
        log::debug!("uploading {} from {}", file.label(), url.0);
        let decoded = DecodedTexture::from_bytes(&file.bytes, file.label(), file.format_hint())?;
        Ok(Arc::new(Texture::from_decoded(
            &self.device,
            &self.queue,
            &decoded,
        )))
    }

    fn dispose(&self, handle: &Self::Handle) -> Result<()> {
        handle.destroy();
        Ok(())
    }

    fn revoke_object_url(&self, url: &ObjectUrl) -> Result<()> {
        log::debug!("revoking {}", url.0);
        Ok(())
    }
}
