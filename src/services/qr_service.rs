use std::io::Cursor;

use base64::prelude::*;
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Identifying-code response: the raw token plus its QR rendering as a
/// base64 PNG, ready to embed or print.
#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub token: String,
    pub qr_base64: String,
}

/// Render an identifying token as a QR code PNG, base64-encoded
pub fn render_qr_base64(data: &str) -> Result<String> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::Internal(format!("QR encoding failed: {e}")))?;

    let image = code.render::<Luma<u8>>().build();

    let mut buffer = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| AppError::Internal(format!("QR rendering failed: {e}")))?;

    Ok(BASE64_STANDARD.encode(&buffer))
}
