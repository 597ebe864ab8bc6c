//! Texture resources held by the texture store.
//!
//! [`DecodedTexture`] is the CPU-side result of decoding an image file.
//! [`Texture`] wraps the WGPU resources created from it when textures live on
//! the GPU.

use anyhow::{Context, Result};
use image::{ImageFormat, load_from_memory_with_format};

/// RGBA8 pixels decoded from an image file.
#[derive(Clone, Debug)]
pub struct DecodedTexture {
    pub label: String,
    pub image: image::RgbaImage,
}

impl DecodedTexture {
    /// Decode raw image file data (PNG, JPEG, etc.).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data
    /// * `label` is used as a debug name for the resource
    /// * `format` is an optional file extension hint (e.g., "png"). If None or
    ///   unknown, the format is guessed from the data.
    pub fn from_bytes(bytes: &[u8], label: &str, format: Option<&str>) -> Result<Self> {
        let img = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes),
            Some(fmt) => load_from_memory_with_format(bytes, fmt),
        }
        .with_context(|| format!("failed to decode texture '{label}'"))?;
        Ok(Self {
            label: label.to_string(),
            image: img.to_rgba8(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// A GPU texture with a view and sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    pub label: String,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Upload decoded pixels into a new sRGB texture.
    pub fn from_decoded(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        decoded: &DecodedTexture,
    ) -> Self {
        let dimensions = decoded.image.dimensions();
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&decoded.label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &decoded.image,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_default_sampler(device);

        Self {
            label: decoded.label.clone(),
            texture,
            view,
            sampler,
        }
    }

    /// Frees the GPU memory right away instead of waiting for the last handle to drop.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}
