use base64::Engine;
use qrcodegen::{QrCode, QrCodeEcc};

/// Pixels per QR module.
const MODULE_SIZE: u32 = 8;
/// Blank modules around the symbol, scanners need at least four.
const QUIET_ZONE: i32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("content of {0} bytes does not fit in a qr code")]
    TooLong(usize),
    #[error("failed to encode png: {0}")]
    Png(#[from] png::EncodingError),
}

/// Renders `content` as a QR code and returns it as a base64 encoded PNG.
pub fn encode_base64_png(content: &str) -> Result<String, EncodingError> {
    let qr = QrCode::encode_binary(content.as_bytes(), QrCodeEcc::Medium).map_err(|_| EncodingError::TooLong(content.len()))?;

    let png = render_png(&qr)?;

    Ok(base64::engine::general_purpose::STANDARD.encode(png))
}

fn render_png(qr: &QrCode) -> Result<Vec<u8>, EncodingError> {
    let modules = (qr.size() + QUIET_ZONE * 2).unsigned_abs();
    let side = modules * MODULE_SIZE;

    let mut pixels = Vec::with_capacity((side * side) as usize);
    for y in 0..side {
        let module_y = (y / MODULE_SIZE) as i32 - QUIET_ZONE;
        for x in 0..side {
            let module_x = (x / MODULE_SIZE) as i32 - QUIET_ZONE;
            // Out of range coordinates read as light, which draws the quiet zone.
            pixels.push(if qr.get_module(module_x, module_y) { 0x00 } else { 0xFF });
        }
    }

    let mut result = Vec::new();

    let mut encoder = png::Encoder::new(&mut result, side, side);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;

    Ok(result)
}
