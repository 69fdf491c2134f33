//! Image - the raster container analyzed by this library
//!
//! An [`Image`] owns its pixels through a [`PixelStore`] and carries the
//! attributes the analysis and enforcement code read and update: storage
//! class, colorspace, matte flag, quantum depth, recorded depth, cached
//! semantic type, palette, and artifacts.
//!
//! # Ownership model
//!
//! Read-only operations take `&Image` and read through a [`CacheView`].
//! Mutating operations take `&mut Image`, which guarantees a single
//! writer; pixel writes go through an [`AuthenticView`] row by row.

mod crop;

use crate::artifact::{self, Artifacts};
use crate::cache::{AuthenticView, CacheView, MemoryStore, PixelStore, VirtualPixelPolicy};
use crate::colorspace::Colorspace;
use crate::compare::{Comparator, Tolerance};
use crate::error::{Error, Result};
use crate::geometry::Gravity;
use crate::palette::Palette;
use crate::pixel::Pixel;
use crate::quantum::{Quantum, QuantumDepth};
use crate::session::Session;
use rayon::prelude::*;

/// How pixel colors are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageClass {
    /// Each pixel carries full channel values.
    #[default]
    Direct,
    /// Each pixel references a palette entry through its index sample.
    Indexed,
}

/// Semantic color classification of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageType {
    #[default]
    Undefined,
    Bilevel,
    Grayscale,
    GrayscaleMatte,
    Palette,
    PaletteMatte,
    PaletteBilevelMatte,
    TrueColor,
    TrueColorMatte,
    ColorSeparation,
    ColorSeparationMatte,
    Optimize,
}

impl ImageType {
    /// Whether the type carries an alpha channel.
    pub fn is_matte(self) -> bool {
        matches!(
            self,
            ImageType::GrayscaleMatte
                | ImageType::PaletteMatte
                | ImageType::PaletteBilevelMatte
                | ImageType::TrueColorMatte
                | ImageType::ColorSeparationMatte
        )
    }

    /// The matte variant of a base type when `matte` is set.
    ///
    /// Types without a matte variant are returned unchanged.
    pub fn with_matte(self, matte: bool) -> Self {
        if !matte {
            return self;
        }
        match self {
            ImageType::Grayscale => ImageType::GrayscaleMatte,
            ImageType::Palette => ImageType::PaletteMatte,
            ImageType::TrueColor => ImageType::TrueColorMatte,
            ImageType::ColorSeparation => ImageType::ColorSeparationMatte,
            other => other,
        }
    }
}

/// Raster image with analysis attributes.
///
/// # Examples
///
/// ```
/// use pixattr_core::{Image, Pixel, QuantumDepth, StorageClass};
///
/// let image = Image::from_fn(4, 3, QuantumDepth::Q8, |x, _| Pixel::gray(u64::from(x) * 85))
///     .unwrap();
/// assert_eq!(image.columns(), 4);
/// assert_eq!(image.storage_class(), StorageClass::Direct);
/// assert_eq!(image.get_pixel(3, 0).unwrap(), Pixel::gray(255));
/// ```
#[derive(Debug)]
pub struct Image {
    columns: u32,
    rows: u32,
    storage_class: StorageClass,
    colorspace: Colorspace,
    matte: bool,
    quantum_depth: QuantumDepth,
    /// Recorded bits per channel, `1..=64`
    depth: u32,
    image_type: ImageType,
    palette: Option<Palette>,
    artifacts: Artifacts,
    virtual_pixel: VirtualPixelPolicy,
    background_color: Pixel,
    gravity: Gravity,
    fuzz: f64,
    dither: bool,
    filename: String,
    store: Box<dyn PixelStore>,
}

impl Image {
    /// Create an opaque black image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if either dimension is zero.
    pub fn new(columns: u32, rows: u32, quantum_depth: QuantumDepth) -> Result<Self> {
        let store = MemoryStore::new(columns, rows, Pixel::default())?;
        Ok(Self::with_store(Box::new(store), quantum_depth))
    }

    /// Wrap an existing pixel store.
    pub fn with_store(store: Box<dyn PixelStore>, quantum_depth: QuantumDepth) -> Self {
        let qr = quantum_depth.range();
        Self {
            columns: store.columns(),
            rows: store.rows(),
            storage_class: StorageClass::Direct,
            colorspace: Colorspace::Srgb,
            matte: false,
            quantum_depth,
            depth: quantum_depth.bits(),
            image_type: ImageType::Undefined,
            palette: None,
            artifacts: Artifacts::new(),
            virtual_pixel: VirtualPixelPolicy::default(),
            background_color: Pixel::gray(qr),
            gravity: Gravity::default(),
            fuzz: 0.0,
            dither: true,
            filename: String::new(),
            store,
        }
    }

    /// Create a direct-class image from a per-pixel function.
    pub fn from_fn(
        columns: u32,
        rows: u32,
        quantum_depth: QuantumDepth,
        mut f: impl FnMut(u32, u32) -> Pixel,
    ) -> Result<Self> {
        let mut pixels = Vec::with_capacity(columns as usize * rows as usize);
        for y in 0..rows {
            for x in 0..columns {
                pixels.push(f(x, y));
            }
        }
        let store = MemoryStore::from_pixels(columns, rows, pixels)?;
        Ok(Self::with_store(Box::new(store), quantum_depth))
    }

    /// Create an indexed image from a palette and a per-pixel index function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if an index is not in the palette.
    pub fn from_indexes(
        columns: u32,
        rows: u32,
        quantum_depth: QuantumDepth,
        palette: Palette,
        mut f: impl FnMut(u32, u32) -> usize,
    ) -> Result<Self> {
        let mut pixels = Vec::with_capacity(columns as usize * rows as usize);
        for y in 0..rows {
            for x in 0..columns {
                let index = f(x, y) as u64;
                pixels.push(*palette.resolve(index)?);
            }
        }
        let store = MemoryStore::from_pixels(columns, rows, pixels)?;
        let mut image = Self::with_store(Box::new(store), quantum_depth);
        image.storage_class = StorageClass::Indexed;
        image.palette = Some(palette);
        Ok(image)
    }

    // -- attributes --

    #[inline]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn storage_class(&self) -> StorageClass {
        self.storage_class
    }

    #[inline]
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Whether an alpha channel is present.
    #[inline]
    pub fn matte(&self) -> bool {
        self.matte
    }

    #[inline]
    pub fn quantum_depth(&self) -> QuantumDepth {
        self.quantum_depth
    }

    /// Maximum sample value, `2^quantum_depth - 1`.
    #[inline]
    pub fn quantum_range(&self) -> Quantum {
        self.quantum_depth.range()
    }

    /// Recorded bits per channel.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Cached semantic type.
    #[inline]
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    #[inline]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    #[inline]
    pub fn palette_mut(&mut self) -> Option<&mut Palette> {
        self.palette.as_mut()
    }

    #[inline]
    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    #[inline]
    pub fn artifacts_mut(&mut self) -> &mut Artifacts {
        &mut self.artifacts
    }

    /// Shorthand for an artifact lookup.
    #[inline]
    pub fn artifact(&self, key: &str) -> Option<&str> {
        self.artifacts.get(key)
    }

    #[inline]
    pub fn virtual_pixel(&self) -> VirtualPixelPolicy {
        self.virtual_pixel
    }

    #[inline]
    pub fn background_color(&self) -> Pixel {
        self.background_color
    }

    #[inline]
    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    #[inline]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Effective fuzz distance: the `fuzz` artifact when present, else the
    /// image's own setting.
    pub fn fuzz(&self) -> f64 {
        match self.artifact(artifact::FUZZ) {
            Some(value) => artifact::parse_fuzz(value, self.quantum_range()),
            None => self.fuzz,
        }
    }

    /// Effective dither setting: the `dither` artifact when recognized,
    /// else the image's own flag.
    pub fn dither(&self) -> bool {
        match self
            .artifact(artifact::DITHER)
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("none" | "false" | "0") => false,
            Some("floydsteinberg" | "true" | "1") => true,
            _ => self.dither,
        }
    }

    /// Fuzzy comparator configured from this image.
    pub fn comparator(&self) -> Comparator {
        Comparator::new(
            Tolerance::Fuzzy(self.fuzz()),
            self.matte,
            self.colorspace,
            self.quantum_range(),
        )
    }

    pub fn set_storage_class(&mut self, storage_class: StorageClass) {
        self.storage_class = storage_class;
    }

    pub fn set_colorspace(&mut self, colorspace: Colorspace) {
        self.colorspace = colorspace;
    }

    pub fn set_matte(&mut self, matte: bool) {
        self.matte = matte;
    }

    /// Record the per-channel depth, clamped to `1..=64`.
    ///
    /// The recorded depth may exceed the quantum depth; pixel samples are
    /// unaffected either way.
    pub fn set_depth(&mut self, depth: u32) {
        self.depth = depth.clamp(1, 64);
    }

    pub fn set_image_type(&mut self, image_type: ImageType) {
        self.image_type = image_type;
    }

    /// Replace the palette; `None` removes it.
    pub fn set_palette(&mut self, palette: Option<Palette>) {
        self.palette = palette;
    }

    pub fn set_virtual_pixel(&mut self, policy: VirtualPixelPolicy) {
        self.virtual_pixel = policy;
    }

    pub fn set_background_color(&mut self, color: Pixel) {
        self.background_color = color;
    }

    pub fn set_gravity(&mut self, gravity: Gravity) {
        self.gravity = gravity;
    }

    pub fn set_fuzz(&mut self, fuzz: f64) {
        self.fuzz = fuzz.max(0.0);
    }

    pub fn set_dither(&mut self, dither: bool) {
        self.dither = dither;
    }

    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    // -- pixel access --

    /// Read-only view honoring the virtual-pixel policy.
    pub fn read_view(&self) -> CacheView<'_> {
        CacheView::new(
            self.store.as_ref(),
            self.virtual_pixel,
            self.background_color,
            self.quantum_range(),
        )
    }

    /// Exclusive read/write view.
    pub fn write_view(&mut self) -> AuthenticView<'_> {
        AuthenticView::new(self.store.as_ref())
    }

    /// Read one in-canvas pixel.
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Pixel> {
        if x >= self.columns || y >= self.rows {
            return Err(Error::GeometryOutsideCanvas {
                x: i64::from(x),
                y: i64::from(y),
                width: 1,
                height: 1,
                columns: self.columns,
                rows: self.rows,
            });
        }
        self.read_view().pixel(i64::from(x), i64::from(y))
    }

    /// Overwrite one pixel.
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        self.store.write(x, y, &[pixel])
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> Result<Vec<Pixel>> {
        let mut out = Vec::with_capacity(self.columns as usize * self.rows as usize);
        self.store.read(0, 0, self.columns, self.rows, &mut out)?;
        Ok(out)
    }

    /// Refresh every pixel's color from the palette entry its index sample
    /// names, one row per task on the session's worker pool.
    ///
    /// The first failing row stops the remaining rows from being started;
    /// rows already synced keep their refreshed colors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PaletteRequired`] when there is no palette,
    /// [`Error::IndexOutOfBounds`] when a pixel names a missing entry, or a
    /// cache error when a row cannot be fetched or synced.
    pub fn sync_from_palette(&mut self, session: &Session) -> Result<()> {
        let palette = self.palette.as_ref().ok_or(Error::PaletteRequired)?;
        let view = AuthenticView::new(self.store.as_ref());
        let rows = self.rows;
        let pool = session.worker_pool(rows as usize)?;
        pool.install(|| {
            (0..rows).into_par_iter().try_for_each(|y| {
                let mut row = view.fetch_row(y)?;
                for pixel in row.pixels_mut() {
                    let entry = palette.resolve(pixel.index)?;
                    pixel.set_color(entry);
                }
                view.sync(&row)
            })
        })
    }

    /// Independent copy backed by a new in-memory store.
    pub fn try_clone(&self) -> Result<Self> {
        let store = MemoryStore::from_pixels(self.columns, self.rows, self.pixels()?)?;
        Ok(self.with_same_attributes(Box::new(store)))
    }

    /// A new image over `store` carrying this image's attributes.
    fn with_same_attributes(&self, store: Box<dyn PixelStore>) -> Self {
        Self {
            columns: store.columns(),
            rows: store.rows(),
            storage_class: self.storage_class,
            colorspace: self.colorspace,
            matte: self.matte,
            quantum_depth: self.quantum_depth,
            depth: self.depth,
            image_type: self.image_type,
            palette: self.palette.clone(),
            artifacts: self.artifacts.clone(),
            virtual_pixel: self.virtual_pixel,
            background_color: self.background_color,
            gravity: self.gravity,
            fuzz: self.fuzz,
            dither: self.dither,
            filename: self.filename.clone(),
            store,
        }
    }
}
