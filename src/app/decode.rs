use image::{DynamicImage, RgbaImage};
use resvg::{tiny_skia, usvg};
use thiserror::Error;

/// Largest SVG canvas rasterized, in pixels.
const MAX_SVG_PIXELS: u64 = 8192 * 8192;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Raster(#[from] image::ImageError),

    #[error("invalid svg: {0}")]
    Svg(#[from] usvg::Error),

    #[error("svg canvas {width}x{height} cannot be rasterized")]
    Canvas { width: u32, height: u32 },
}

/// Decodes a buffered source image. SVG is rasterized at its intrinsic size;
/// every other format is sniffed from its content.
pub fn decode_source(data: &[u8], extension: Option<&str>) -> Result<DynamicImage, DecodeError> {
    match extension {
        Some(ext) if ext.eq_ignore_ascii_case("svg") => rasterize_svg(data),
        _ => Ok(image::load_from_memory(data)?),
    }
}

fn rasterize_svg(data: &[u8]) -> Result<DynamicImage, DecodeError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;
    let size = tree.size().to_int_size();
    let (width, height) = (size.width(), size.height());
    let canvas = DecodeError::Canvas { width, height };
    if u64::from(width) * u64::from(height) > MAX_SVG_PIXELS {
        return Err(canvas);
    }

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(canvas)?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha.
    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|pixel| {
            let color = pixel.demultiply();
            [color.red(), color.green(), color.blue(), color.alpha()]
        })
        .collect();

    RgbaImage::from_raw(width, height, rgba)
        .map(DynamicImage::ImageRgba8)
        .ok_or(DecodeError::Canvas { width, height })
}
