use std::path::Path;

use image::{GrayImage, Luma};
use qrcode::types::QrError;
use qrcode::{Color, QrCode};
use thiserror::Error;

const MODULE_PIXELS: u32 = 8;
const QUIET_ZONE_MODULES: u32 = 4;

#[derive(Debug, Error)]
pub enum PaymentCodeError {
    #[error("payload does not fit in a QR code: {0}")]
    Encode(#[from] QrError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Render `payload` as a black-on-white QR code with a standard quiet zone.
pub fn payment_code_image(payload: &str) -> Result<GrayImage, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE_MODULES) * MODULE_PIXELS;

    Ok(GrayImage::from_fn(side, side, |px, py| {
        let mx = (px / MODULE_PIXELS) as i64 - QUIET_ZONE_MODULES as i64;
        let my = (py / MODULE_PIXELS) as i64 - QUIET_ZONE_MODULES as i64;
        let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
        let dark = inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark;
        if dark {
            Luma([0])
        } else {
            Luma([255])
        }
    }))
}

pub fn write_payment_code(payload: &str, path: &Path) -> Result<(), PaymentCodeError> {
    payment_code_image(payload)?.save(path)?;
    Ok(())
}
