pub mod decode;
pub mod error;
pub mod resize;
pub mod sampler;
pub mod thumbnails;
pub mod variants;
