//! QR code rendering for payment URLs.
//!
//! Produces a self-contained `data:` URL holding an SVG image, ready to drop
//! into an `<img src>` attribute or to serve as `image/svg+xml`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use qrcode::QrCode;
use qrcode::render::svg;

/// Error returned when the payload cannot be encoded as a QR code.
#[derive(Debug, thiserror::Error)]
#[error("Can not encode QR code: {0}")]
pub struct QrError(#[from] pub qrcode::types::QrError);

/// Rendering options for [`generate_qr_code`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrOptions {
    /// Minimum width and height of the image in pixels.
    pub width: u32,
    /// Surround the code with the standard four-module quiet zone.
    pub quiet_zone: bool,
    /// Color of dark modules.
    pub dark: String,
    /// Color of light modules and the background.
    pub light: String,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            width: 200,
            quiet_zone: true,
            dark: "#000000".to_owned(),
            light: "#FFFFFF".to_owned(),
        }
    }
}

/// Renders `data` as an SVG QR code document.
///
/// # Errors
///
/// Returns [`QrError`] if `data` is too long to fit in a QR code.
pub fn render_qr_svg(data: &str, options: &QrOptions) -> Result<String, QrError> {
    let code = QrCode::new(data.as_bytes())?;
    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(options.width, options.width)
        .quiet_zone(options.quiet_zone)
        .dark_color(svg::Color(&options.dark))
        .light_color(svg::Color(&options.light))
        .build();
    Ok(image)
}

/// Renders `data` as a QR code and returns it as a base64 `data:` URL.
///
/// # Errors
///
/// Returns [`QrError`] if `data` is too long to fit in a QR code.
pub fn generate_qr_code(data: &str, options: &QrOptions) -> Result<String, QrError> {
    let svg = render_qr_svg(data, options)?;
    Ok(format!("data:image/svg+xml;base64,{}", b64.encode(svg)))
}
