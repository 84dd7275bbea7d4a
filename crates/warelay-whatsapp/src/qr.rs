//! Terminal rendering of WhatsApp pairing codes.

use qrcode::{Color, EcLevel, QrCode};

use warelay_core::{errors::Error, Result};

/// Light modules kept around the symbol so phones can lock on to it.
const QUIET_ZONE: usize = 2;

/// Render `data` as a QR code made of half-block characters, two module rows
/// per line of text.
pub fn render_half_blocks(data: &str) -> Result<String> {
    let code = QrCode::with_error_correction_level(data, EcLevel::L)
        .map_err(|e| Error::External(format!("QR encoding failed: {e}")))?;
    let width = code.width();
    let modules = code.to_colors();

    let dark = |row: usize, col: usize| -> bool {
        let (Some(r), Some(c)) = (row.checked_sub(QUIET_ZONE), col.checked_sub(QUIET_ZONE)) else {
            return false;
        };
        r < width && c < width && modules[r * width + c] == Color::Dark
    };

    let size = width + 2 * QUIET_ZONE;
    let mut out = String::new();
    for top in (0..size).step_by(2) {
        out.extend((0..size).map(|col| match (dark(top, col), dark(top + 1, col)) {
            (true, true) => '█',
            (true, false) => '▀',
            (false, true) => '▄',
            (false, false) => ' ',
        }));
        out.push('\n');
    }
    Ok(out)
}
