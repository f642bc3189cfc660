pub mod event;
pub mod media;
