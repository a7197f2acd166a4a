use std::io::Cursor;

use image::{ImageBuffer, ImageFormat, Luma, imageops};
use qrcode::QrCode;
use qrcode::render::svg;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("cannot encode payload as QR: {0}")]
    Encode(String),
    #[error("cannot write QR image: {0}")]
    Image(String),
}

/// Turns an opaque string into a scannable code.
pub trait QrEncoder: Send + Sync {
    /// Render `data` as a standalone SVG document.
    fn encode_svg(&self, data: &str) -> Result<String, QrError>;
    /// Render `data` as PNG bytes.
    fn encode_png(&self, data: &str) -> Result<Vec<u8>, QrError>;
}

/// Encoder backed by the `qrcode` crate.
#[derive(Debug, Clone, Copy)]
pub struct QrCodeEncoder {
    /// Minimum edge length of the rendered image, in pixels.
    pub min_size: u32,
    /// Light border around the code, in modules.
    pub margin: u32,
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self {
            min_size: 512,
            margin: 1,
        }
    }
}

impl QrCodeEncoder {
    fn code(data: &str) -> Result<QrCode, QrError> {
        QrCode::new(data.as_bytes()).map_err(|e| QrError::Encode(e.to_string()))
    }
}

impl QrEncoder for QrCodeEncoder {
    fn encode_svg(&self, data: &str) -> Result<String, QrError> {
        Ok(Self::code(data)?
            .render::<svg::Color>()
            .min_dimensions(self.min_size, self.min_size)
            .quiet_zone(true)
            .build())
    }

    fn encode_png(&self, data: &str) -> Result<Vec<u8>, QrError> {
        let code = Self::code(data)?;
        // The built-in quiet zone is fixed at four modules; draw without it
        // and pad by `margin` modules instead.
        let bare = code
            .render::<Luma<u8>>()
            .min_dimensions(self.min_size, self.min_size)
            .quiet_zone(false)
            .build();
        let module = bare.width() / code.width() as u32;
        let pad = module * self.margin;
        let mut img = ImageBuffer::from_pixel(
            bare.width() + 2 * pad,
            bare.height() + 2 * pad,
            Luma([255u8]),
        );
        imageops::replace(&mut img, &bare, pad.into(), pad.into());

        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .map_err(|e| QrError::Image(e.to_string()))?;
        Ok(out)
    }
}
