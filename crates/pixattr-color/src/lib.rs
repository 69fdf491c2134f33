//! Pixattr Color - Type enforcement and the color operations behind it
//!
//! [`set_image_type`] rewrites an image so that it matches a requested
//! [`ImageType`](pixattr_core::ImageType). The operations it is built from
//! are usable on their own:
//!
//! - **Colorspace** ([`colorspace`]): sRGB, linear RGB, gray and CMYK transforms
//! - **Storage** ([`storage`]): switching between direct and indexed storage
//! - **Alpha** ([`alpha`]): activating, deactivating and filling the alpha channel
//! - **Thresholding** ([`threshold`]): contrast normalization and bilevel
//! - **Quantization** ([`quantize`]): median cut with optional dithering
//!
//! # Examples
//!
//! ```
//! use pixattr_color::{QuantizeOptions, quantize_image};
//! use pixattr_core::{Image, Pixel, QuantumDepth, Session, StorageClass};
//!
//! let mut image = Image::from_fn(16, 16, QuantumDepth::Q8, |x, y| {
//!     Pixel::rgb(u64::from(x) * 16, u64::from(y) * 16, 128)
//! })
//! .unwrap();
//! let options = QuantizeOptions {
//!     number_colors: 8,
//!     ..Default::default()
//! };
//! quantize_image(&mut image, &options, &Session::default()).unwrap();
//! assert_eq!(image.storage_class(), StorageClass::Indexed);
//! assert!(image.palette().unwrap().len() <= 8);
//! ```

pub mod alpha;
pub mod colorspace;
pub mod enforce;
pub mod error;
mod pixels;
pub mod quantize;
pub mod storage;
pub mod threshold;

pub use pixattr_core;

pub use error::{ColorError, ColorResult};

pub use alpha::{AlphaChannel, set_image_alpha_channel};
pub use colorspace::{convert_pixel, luma, transform_colorspace};
pub use enforce::{ColorOps, StandardColorOps, set_image_type, set_image_type_with};
pub use quantize::{QuantizeOptions, quantize_image};
pub use storage::set_image_storage_class;
pub use threshold::{bilevel_image, normalize_image};
