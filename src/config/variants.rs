use crate::domain::media::ImageEncoding;

/// Widths every uploaded image is resized to.
pub const RESIZE_WIDTHS: [u32; 3] = [1024, 768, 300];

/// Encodings produced for every resize width.
pub const RESIZE_ENCODINGS: [ImageEncoding; 2] = [ImageEncoding::Jpeg, ImageEncoding::Webp];

/// Extensions the resize pipeline accepts, compared case-insensitively.
pub const ACCEPTED_IMAGE_EXTENSIONS: [&str; 8] =
    ["jpeg", "webp", "jpg", "png", "gif", "avif", "tiff", "svg"];

pub const RESIZED_PREFIX: &str = "scaled";

pub const THUMBNAIL_PREFIX: &str = "media/media/thumbnails";
pub const THUMBNAIL_WIDTH: u32 = 480;
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

pub fn is_accepted_image_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    ACCEPTED_IMAGE_EXTENSIONS.contains(&ext.as_str())
}
