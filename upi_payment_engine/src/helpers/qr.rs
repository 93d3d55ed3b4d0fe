use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

const MODULE_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum QrRenderError {
    #[error("Could not encode the payment link as a QR code. {0}")]
    Encoding(#[from] qrcode::types::QrError),
    #[error("Could not write the QR code image. {0}")]
    Image(#[from] image::ImageError),
}

/// Renders `payment_uri` as a PNG QR code with high error correction, so it still scans when partly covered.
pub fn render_qr_png(payment_uri: &str) -> Result<Vec<u8>, QrRenderError> {
    let code = QrCode::with_error_correction_level(payment_uri.as_bytes(), EcLevel::H)?;
    let image = code.render::<Luma<u8>>().quiet_zone(true).module_dimensions(MODULE_SIZE, MODULE_SIZE).build();
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(image).write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
