//! Pixattr Core - Image model and pixel access for attribute analysis
//!
//! This crate provides the data structures and collaborators the analysis
//! and enforcement crates build on:
//!
//! - [`Image`] - Raster container with storage class, colorspace, matte,
//!   depth, cached type, palette and artifacts
//! - [`Pixel`] / [`ChannelMask`] - Channel samples and channel selection
//! - [`Palette`] - Color table for indexed images
//! - [`Rect`] / [`Gravity`] - Canvas geometry
//! - [`CacheView`] / [`AuthenticView`] - Read and read/write pixel windows
//!   over a [`PixelStore`], with a [`VirtualPixelPolicy`]
//! - [`Comparator`] - Exact or fuzzy color matching
//! - [`Session`] - Resource limits, diagnostics sink, worker pools

pub mod artifact;
pub mod cache;
pub mod color;
pub mod colorspace;
pub mod compare;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod image;
pub mod palette;
pub mod pixel;
pub mod quantum;
pub mod session;

pub use artifact::Artifacts;
pub use cache::{AuthenticView, CacheView, MemoryStore, PixelStore, RowBuffer, VirtualPixelPolicy};
pub use color::parse_color;
pub use colorspace::Colorspace;
pub use compare::{Comparator, MIN_FUZZ, Tolerance, is_opaque};
pub use diagnostics::{
    CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, Severity, TracingSink,
    acquire_scratch, fatal_resource_error,
};
pub use error::{Error, Result};
pub use geometry::{Gravity, Rect, gravity_adjust};
pub use image::{Image, ImageType, StorageClass};
pub use palette::{MAX_PALETTE_SIZE, Palette};
pub use pixel::{Channel, ChannelMask, OPAQUE_OPACITY, Pixel};
pub use quantum::{
    MAX_MAP, Quantum, QuantumDepth, is_at_depth, minimal_depth_from, quantum_range, requantize,
    scale_any_to_quantum, scale_quantum_to_any,
};
pub use session::{ResourceLimits, Session, THREAD_LIMIT_ENV};
