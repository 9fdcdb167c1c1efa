//! Raster canvas backed by a Cairo image surface.
//!
//! The canvas is addressed in logical (device-independent) coordinates. Its
//! backing store is `logical size × pixel density` pixels, and every drawing
//! context handed out by [`Canvas::draw`] is pre-scaled so strokes keep their
//! visual size on HiDPI displays.

use cairo::{Context, Format, ImageSurface, Operator};
use std::fmt;
use std::io::Write;
use thiserror::Error;

/// Errors raised by canvas operations.
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("canvas pixels are still borrowed: {0}")]
    Borrow(#[from] cairo::BorrowError),

    #[error("PNG export failed: {0}")]
    Png(#[from] cairo::IoError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid canvas size {width}x{height} at scale {scale}")]
    InvalidSize { width: u32, height: u32, scale: f64 },
}

/// Immutable full-resolution capture of a canvas' backing pixels.
///
/// Pixels are Cairo ARGB32 (premultiplied, native endian). Dimensions are in
/// backing pixels, not logical units.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: i32,
    height: i32,
    stride: i32,
    data: Box<[u8]>,
}

impl Snapshot {
    /// Backing width in pixels.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Backing height in pixels.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Returns true when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|byte| *byte == 0)
    }

    /// Reads one ARGB32 pixel in backing coordinates.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y * self.stride + x * 4) as usize;
        let bytes: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(u32::from_ne_bytes(bytes))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Drawing surface pixels plus the logical geometry they represent.
pub struct Canvas {
    surface: ImageSurface,
    width: u32,
    height: u32,
    scale: f64,
}

impl Canvas {
    /// Creates a transparent canvas of `width × height` logical pixels.
    pub fn new(width: u32, height: u32, scale: f64) -> Result<Self, CanvasError> {
        let surface = Self::create_backing(width, height, scale)?;
        Ok(Self {
            surface,
            width,
            height,
            scale,
        })
    }

    fn create_backing(width: u32, height: u32, scale: f64) -> Result<ImageSurface, CanvasError> {
        let (backing_width, backing_height) = backing_dimensions(width, height, scale)
            .ok_or(CanvasError::InvalidSize {
                width,
                height,
                scale,
            })?;
        Ok(ImageSurface::create(
            Format::ARgb32,
            backing_width,
            backing_height,
        )?)
    }

    /// Logical size in device-independent pixels.
    pub fn logical_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Backing store size in physical pixels.
    pub fn backing_size(&self) -> (i32, i32) {
        (self.surface.width(), self.surface.height())
    }

    /// Pixel density (device pixel ratio).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Runs `paint` against a context scaled to logical coordinates.
    ///
    /// The context is dropped before returning so the pixels can be captured
    /// or overwritten afterwards.
    pub fn draw<F>(&mut self, paint: F) -> Result<(), CanvasError>
    where
        F: FnOnce(&Context) -> Result<(), cairo::Error>,
    {
        let ctx = Context::new(&self.surface)?;
        ctx.scale(self.scale, self.scale);
        paint(&ctx)?;
        drop(ctx);
        self.surface.flush();
        Ok(())
    }

    /// Captures the current backing pixels.
    pub fn snapshot(&mut self) -> Result<Snapshot, CanvasError> {
        self.surface.flush();
        let width = self.surface.width();
        let height = self.surface.height();
        let stride = self.surface.stride();
        let data = self.surface.data()?;
        Ok(Snapshot {
            width,
            height,
            stride,
            data: data.to_vec().into_boxed_slice(),
        })
    }

    /// Overwrites the canvas with `snapshot`.
    ///
    /// Snapshots captured at a different backing resolution (before a resize
    /// or density change) are stretched to cover the whole canvas.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), CanvasError> {
        let same_layout = snapshot.width == self.surface.width()
            && snapshot.height == self.surface.height()
            && snapshot.stride == self.surface.stride();

        if same_layout {
            self.surface.flush();
            let mut data = self.surface.data()?;
            data.copy_from_slice(&snapshot.data);
            return Ok(());
        }

        let source = ImageSurface::create_for_data(
            snapshot.data.to_vec(),
            Format::ARgb32,
            snapshot.width,
            snapshot.height,
            snapshot.stride,
        )?;
        let ctx = Context::new(&self.surface)?;
        ctx.scale(
            self.surface.width() as f64 / snapshot.width as f64,
            self.surface.height() as f64 / snapshot.height as f64,
        );
        ctx.set_operator(Operator::Source);
        ctx.set_source_surface(&source, 0.0, 0.0)?;
        ctx.paint()?;
        drop(ctx);
        self.surface.flush();
        Ok(())
    }

    /// Erases every pixel to full transparency.
    pub fn clear(&mut self) -> Result<(), CanvasError> {
        self.draw(|ctx| {
            ctx.set_operator(Operator::Clear);
            ctx.paint()
        })
    }

    /// Resizes the backing store while keeping the rendered content.
    ///
    /// The pre-resize pixels are stretched to the new logical size. History
    /// is not touched; that is the caller's concern.
    pub fn resize(&mut self, width: u32, height: u32, scale: f64) -> Result<(), CanvasError> {
        if (width, height) == (self.width, self.height) && scale == self.scale {
            return Ok(());
        }
        let preserved = self.snapshot()?;
        self.surface = Self::create_backing(width, height, scale)?;
        self.width = width;
        self.height = height;
        self.scale = scale;
        self.restore(&preserved)
    }

    /// Reads one ARGB32 pixel in backing coordinates.
    pub fn pixel(&mut self, x: i32, y: i32) -> Result<Option<u32>, CanvasError> {
        Ok(self.snapshot()?.pixel(x, y))
    }

    /// Encodes the current pixels as PNG.
    pub fn write_png<W: Write>(&self, writer: &mut W) -> Result<(), CanvasError> {
        self.surface.write_to_png(writer)?;
        Ok(())
    }
}

fn backing_dimensions(width: u32, height: u32, scale: f64) -> Option<(i32, i32)> {
    if width == 0 || height == 0 || !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let backing_width = (width as f64 * scale).ceil();
    let backing_height = (height as f64 * scale).ceil();
    if backing_width > i32::MAX as f64 || backing_height > i32::MAX as f64 {
        return None;
    }
    Some((backing_width as i32, backing_height as i32))
}
