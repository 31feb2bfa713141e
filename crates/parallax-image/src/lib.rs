#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Image error types.
pub mod error;

/// Image types and pixel containers.
pub mod image;

/// Reading images from disk.
pub mod io;

/// Pixel-wise operations on images.
pub mod ops;

pub use crate::error::{ImageError, IoError};
pub use crate::image::{Image, ImageSize};
