//! Decoded image frames.

use image::RgbImage;

use super::LandmarkError;

/// Channel order of a 3-byte-per-pixel frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
    Rgb,
    Bgr,
}

/// A packed 8-bit, 3-channel image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    order: ColorOrder,
}

impl Frame {
    /// Wrap raw pixels. `data.len()` must equal `width * height * 3`.
    pub fn new(width: u32, height: u32, data: Vec<u8>, order: ColorOrder) -> Result<Self, LandmarkError> {
        if width == 0 || height == 0 {
            return Err(LandmarkError::InvalidFrame(format!(
                "empty frame {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(LandmarkError::InvalidFrame(format!(
                "{width}x{height} frame needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            order,
        })
    }

    /// Decode an encoded image (PNG, JPEG, WebP) into an RGB frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, LandmarkError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| LandmarkError::InvalidFrame(format!("undecodable image: {e}")))?;
        Self::from_rgb_image(img.to_rgb8())
    }

    pub fn from_rgb_image(img: RgbImage) -> Result<Self, LandmarkError> {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw(), ColorOrder::Rgb)
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn order(&self) -> ColorOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Same frame in RGB order. Borrowing is not possible for BGR input, so
    /// this always returns an owned copy.
    pub fn to_rgb(&self) -> Self {
        match self.order {
            ColorOrder::Rgb => self.clone(),
            ColorOrder::Bgr => {
                let mut data = self.data.clone();
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                Self {
                    width: self.width,
                    height: self.height,
                    data,
                    order: ColorOrder::Rgb,
                }
            }
        }
    }

    /// Convert into an `image` buffer (RGB) for encoding to disk.
    pub fn into_rgb_image(self) -> Result<RgbImage, LandmarkError> {
        let rgb = self.to_rgb();
        RgbImage::from_raw(rgb.width, rgb.height, rgb.data)
            .ok_or_else(|| LandmarkError::InvalidFrame("pixel buffer does not match dimensions".into()))
    }
}
