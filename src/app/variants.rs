use bytes::Bytes;
use image::imageops::FilterType;
use image::DynamicImage;
use image::GenericImageView;
use std::io::Cursor;

use crate::config::variants::{RESIZE_ENCODINGS, RESIZE_WIDTHS};
use crate::domain::media::ImageEncoding;

/// Parameters of one resize; holds no image state, so one descriptor can be
/// applied to any number of inputs concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeTransform {
    pub width: u32,
    pub encoding: ImageEncoding,
}

impl ResizeTransform {
    /// Resizes to the target width keeping the aspect ratio and encodes the result.
    pub fn apply(&self, source: &DynamicImage) -> Result<Bytes, image::ImageError> {
        let (src_width, src_height) = source.dimensions();
        let height = scaled_height(src_width, src_height, self.width);
        let resized = source.resize_exact(self.width, height, FilterType::Lanczos3);

        // JPEG has no alpha channel.
        let resized = match self.encoding {
            ImageEncoding::Jpeg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            ImageEncoding::Webp => resized,
        };

        let mut buffer = Vec::new();
        resized.write_to(&mut Cursor::new(&mut buffer), self.encoding.image_format())?;
        Ok(Bytes::from(buffer))
    }
}

fn scaled_height(src_width: u32, src_height: u32, target_width: u32) -> u32 {
    if src_width == 0 {
        return 1;
    }
    let height = (src_height as u64 * target_width as u64 + src_width as u64 / 2) / src_width as u64;
    height.clamp(1, u32::MAX as u64) as u32
}

/// One (width, encoding) cell of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub width: u32,
    pub encoding: ImageEncoding,
    pub transform: ResizeTransform,
}

/// The width × encoding cross product, built once per process and shared read-only.
#[derive(Debug, Clone)]
pub struct VariantMatrix {
    cells: Vec<VariantSpec>,
}

impl VariantMatrix {
    /// Width-major cross product; duplicate pairs are kept once.
    pub fn build(widths: &[u32], encodings: &[ImageEncoding]) -> Self {
        let mut cells: Vec<VariantSpec> = Vec::with_capacity(widths.len() * encodings.len());
        for &width in widths {
            for &encoding in encodings {
                if cells
                    .iter()
                    .any(|cell| cell.width == width && cell.encoding == encoding)
                {
                    continue;
                }
                cells.push(VariantSpec {
                    width,
                    encoding,
                    transform: ResizeTransform { width, encoding },
                });
            }
        }
        Self { cells }
    }

    pub fn standard() -> Self {
        Self::build(&RESIZE_WIDTHS, &RESIZE_ENCODINGS)
    }

    pub fn cells(&self) -> &[VariantSpec] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
