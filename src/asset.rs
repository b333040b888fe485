use std::path::Path;

use crate::error::Error;

/// Somewhere the decorative image bytes can be fetched from.
pub trait AssetSource {
    fn fetch(&self) -> Result<Vec<u8>, Error>;
}

impl AssetSource for Path {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        std::fs::read(self).map_err(|e| Error::Asset(format!("{}: {e}", self.display())))
    }
}

impl AssetSource for [u8] {
    fn fetch(&self) -> Result<Vec<u8>, Error> {
        Ok(self.to_vec())
    }
}

/// A decoded PNG ready to be embedded as an image XObject.
#[derive(Clone, Debug, PartialEq)]
pub struct DecorativeImage {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub(crate) rgb: Vec<u8>,
    /// Present only when some pixel is not fully opaque.
    pub(crate) alpha: Option<Vec<u8>>,
}

impl DecorativeImage {
    pub fn from_png_bytes(data: &[u8]) -> Result<Self, Error> {
        let reader = image::ImageReader::with_format(
            std::io::BufReader::new(std::io::Cursor::new(data)),
            image::ImageFormat::Png,
        );
        let decoded = reader.decode().map_err(|e| Error::Asset(e.to_string()))?;
        let rgba: image::RgbaImage = decoded.to_rgba8();
        let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
        let rgb = rgba
            .pixels()
            .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
            .collect();
        let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
        Ok(Self {
            pixel_width: rgba.width(),
            pixel_height: rgba.height(),
            rgb,
            alpha,
        })
    }

    /// Fetch and decode. Any failure is logged and treated as "no image".
    pub fn load<S: AssetSource + ?Sized>(source: &S) -> Option<Self> {
        match source.fetch().and_then(|data| Self::from_png_bytes(&data)) {
            Ok(image) => Some(image),
            Err(e) => {
                log::warn!("Error loading decorative image: {e}; continuing without it");
                None
            }
        }
    }
}
