//! Raster rendering of Code128 symbols.

use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};

use crate::code128;
use crate::constants::{DEFAULT_BAR_HEIGHT, DEFAULT_MODULE_WIDTH};
use crate::error::SymbolError;

const BAR: Luma<u8> = Luma([0]);
const SPACE: Luma<u8> = Luma([255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Pixels per module (narrowest bar).
    pub module_width: u32,
    /// Bar height in pixels.
    pub bar_height: u32,
    /// Blank rows above and below the bars.
    pub margin: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            module_width: DEFAULT_MODULE_WIDTH,
            bar_height: DEFAULT_BAR_HEIGHT,
            margin: 10,
        }
    }
}

/// Render `text` as a black-on-white Code128 raster.
pub fn render(text: &str, opts: &RenderOptions) -> Result<GrayImage, SymbolError> {
    let modules = code128::modules(text)?;
    let module_width = opts.module_width.max(1);

    let width = modules.len() as u32 * module_width;
    let height = opts.bar_height.max(1) + 2 * opts.margin;
    let mut img = GrayImage::from_pixel(width, height, SPACE);

    for (i, _) in modules.iter().enumerate().filter(|(_, bar)| **bar) {
        let x0 = i as u32 * module_width;
        for x in x0..x0 + module_width {
            for y in opts.margin..opts.margin + opts.bar_height.max(1) {
                img.put_pixel(x, y, BAR);
            }
        }
    }

    Ok(img)
}

/// Render `text` and write it as a PNG at `path`, replacing any existing file.
pub fn write_png(text: &str, opts: &RenderOptions, path: &Path) -> Result<(), SymbolError> {
    let img = render(text, opts)?;
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| match e {
            image::ImageError::IoError(io) => SymbolError::Io(io),
            other => SymbolError::Image(other),
        })
}
