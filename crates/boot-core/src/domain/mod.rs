//! Domain types with no I/O dependencies.

pub mod image;

pub use image::{Image, ImageError, MAX_IMAGE_LEN};
