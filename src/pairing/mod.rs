//! Terminal presentation of pairing QR codes.

use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};

/// Render `payload` as a compact QR code using Unicode half blocks (two module
/// rows per text line).
pub fn render_qr_terminal(payload: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::L)?;
    let width = code.width();
    let colors = code.into_colors();
    let dark = |row: usize, col: usize| row < width && colors[row * width + col] == Color::Dark;

    let mut out = String::with_capacity((width + 1) * width.div_ceil(2));
    for row in (0..width).step_by(2) {
        for col in 0..width {
            out.push(match (dark(row, col), dark(row + 1, col)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }
    Ok(out)
}
