//! Pixattr Analysis - Read-only image attribute analysis
//!
//! This crate inspects an [`Image`](pixattr_core::Image) without modifying
//! its pixels (except for explicit depth rescaling):
//!
//! - **Bounding box** ([`bounds`]): four-corner flood bound and
//!   percent-background edge erosion
//! - **Edge census** ([`census`]): background fraction along an edge strip
//! - **Channel depth** ([`depth`]): minimal lossless bit depth, rescaling
//! - **Classification** ([`classify`]): cached and pixel-derived image type

pub mod bounds;
pub mod census;
pub mod classify;
pub mod depth;
pub mod error;

pub use pixattr_core;

pub use error::{AnalysisError, AnalysisResult};

pub use bounds::{edge_bounding_box, flood_bounding_box, get_image_bounding_box};
pub use census::{CensusState, edge_background, edge_census};
pub use classify::{
    MAX_PALETTE_COLORS, get_image_type, identify_image_gray, identify_image_monochrome,
    identify_image_type, identify_palette_image, is_gray_image, is_monochrome_image,
    is_opaque_image, is_palette_image,
};
pub use depth::{
    get_image_channel_depth, get_image_depth, image_quantum_depth, set_image_channel_depth,
    set_image_depth,
};
