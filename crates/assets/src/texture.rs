use std::path::Path;

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::AssetError;

/// Cube map face file suffixes, in +X, -X, +Y, -Y, +Z, -Z layer order.
pub const CUBE_FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "front", "back"];

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    /// A 1x1 image of a single colour.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            rgba: image.into_raw(),
        }
    }

    fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
    }

    /// The full mip chain, level 0 first, each level half the previous size.
    pub fn mip_chain(&self) -> Vec<ImageData> {
        let mut levels = vec![self.clone()];
        let Some(mut current) = self.to_rgba_image() else {
            return levels;
        };
        while current.width() > 1 || current.height() > 1 {
            let width = (current.width() / 2).max(1);
            let height = (current.height() / 2).max(1);
            current = imageops::resize(&current, width, height, FilterType::Triangle);
            levels.push(ImageData::from_rgba_image(current.clone()));
        }
        levels
    }

    /// Normalized luminance of the pixel nearest to `(u, v)` in `[0, 1]`.
    pub fn luminance_at(&self, u: f32, v: f32) -> f32 {
        if self.width == 0 || self.height == 0 {
            return 0.0;
        }
        let x = ((u.clamp(0.0, 1.0) * (self.width - 1) as f32).round()) as usize;
        let y = ((v.clamp(0.0, 1.0) * (self.height - 1) as f32).round()) as usize;
        let i = (y * self.width as usize + x) * 4;
        let [r, g, b] = [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2]];
        (0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32) / 255.0
    }
}

/// Decode an image file into RGBA8, whatever its source format.
pub fn load_image(path: impl AsRef<Path>) -> Result<ImageData, AssetError> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba8();
    tracing::debug!(
        "loaded image {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(ImageData::from_rgba_image(image))
}

/// Load the six faces of a cube map from `<prefix><face>.<extension>`.
///
/// Faces must be square and all the same size.
pub fn load_cube_faces(prefix: &str, extension: &str) -> Result<[ImageData; 6], AssetError> {
    let mut faces = Vec::with_capacity(6);
    for face in CUBE_FACE_NAMES {
        let path = format!("{prefix}{face}.{extension}");
        let image = load_image(&path)?;
        let expected = faces.first().map_or(image.width, |f: &ImageData| f.width);
        if image.width != expected || image.height != expected {
            return Err(AssetError::CubeFaceMismatch {
                face,
                width: image.width,
                height: image.height,
                expected,
            });
        }
        faces.push(image);
    }
    faces.try_into().map_err(|_| {
        AssetError::Io(std::io::Error::other("cube map did not load six faces"))
    })
}
