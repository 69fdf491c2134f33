//! Pixattr - Raster image attribute analysis and enforcement
//!
//! Derives attributes from the pixels of an image and enforces them:
//!
//! - Bounding box of the non-background content (flood and edge erosion)
//! - Minimal lossless channel depth, and rescaling to a depth
//! - Image type classification (bilevel, grayscale, palette, truecolor,
//!   color separation, each with or without matte)
//! - Type enforcement through colorspace transforms, thresholding, alpha
//!   materialization and quantization
//!
//! # Example
//!
//! ```
//! use pixattr::{Image, ImageType, Pixel, QuantumDepth, Session};
//! use pixattr::{analysis, color};
//!
//! let session = Session::default();
//! let mut image = Image::from_fn(32, 32, QuantumDepth::Q16, |x, y| {
//!     Pixel::rgb(u64::from(x) * 2000, u64::from(y) * 2000, 0)
//! })
//! .unwrap();
//! assert_eq!(
//!     analysis::identify_image_type(&image, &session).unwrap(),
//!     ImageType::TrueColor
//! );
//!
//! color::set_image_type(&mut image, ImageType::Grayscale, &session).unwrap();
//! assert_eq!(
//!     analysis::identify_image_gray(&image, &session).unwrap(),
//!     ImageType::Grayscale
//! );
//! ```

// Re-export core types (primary data structures used everywhere)
pub use pixattr_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use pixattr_analysis as analysis;
pub use pixattr_color as color;
