//! The rasterization capability behind the derivative generator.
//!
//! A [`Rasterizer`] hands out short-lived [`RasterSession`]s: one is opened per raster
//! operation, used to render and encode, then closed. Dropping a session without closing it
//! (for example on an error path) releases it as well.

use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{Dims, PNG_MIME};
use crate::foundation::error::{SvgPngError, SvgPngResult};

/// Largest raster edge a session will allocate.
pub const MAX_DIM: u32 = 16_384;

/// A rendered raster.
#[derive(Clone, Debug)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8, row-major, tightly packed.
    pub rgba8_premul: Vec<u8>,
}

impl Raster {
    pub fn dims(&self) -> Dims {
        Dims::new(self.width, self.height)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RasterFormat {
    #[default]
    Png,
}

impl RasterFormat {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => PNG_MIME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum RasterInput<'a> {
    /// Raw SVG markup.
    Markup(&'a str),
    /// An SVG file on disk.
    Path(&'a Path),
}

/// One render job.
#[derive(Clone, Copy, Debug)]
pub struct RasterRequest<'a> {
    pub input: RasterInput<'a>,
    /// Directory relative `href`s resolve against. Defaults to the parent of a path input.
    pub resources_dir: Option<&'a Path>,
    /// Render to exactly this box, scaling to cover it and cropping the centered excess.
    pub crop_to: Option<Dims>,
}

impl<'a> RasterRequest<'a> {
    pub fn markup(markup: &'a str) -> Self {
        Self {
            input: RasterInput::Markup(markup),
            resources_dir: None,
            crop_to: None,
        }
    }

    pub fn path(path: &'a Path) -> Self {
        Self {
            input: RasterInput::Path(path),
            resources_dir: path.parent(),
            crop_to: None,
        }
    }

    pub fn with_resources_dir(mut self, dir: Option<&'a Path>) -> Self {
        if dir.is_some() {
            self.resources_dir = dir;
        }
        self
    }

    pub fn cropped_to(mut self, dims: Option<Dims>) -> Self {
        self.crop_to = dims;
        self
    }
}

/// Settings shared by every session a rasterizer opens.
#[derive(Clone, Debug, Default)]
pub struct RasterSettings {
    /// If set, sessions clear the raster to this straight-alpha RGBA8 color before drawing.
    pub clear_rgba: Option<[u8; 4]>,
    /// Load the system font database so `<text>` renders with installed fonts.
    pub system_fonts: bool,
}

/// An open handle on the rasterization capability.
pub trait RasterSession {
    /// Render a vector document to pixels.
    fn render(&mut self, request: RasterRequest<'_>) -> SvgPngResult<Raster>;

    /// Encode a raster into a file format.
    fn encode(&mut self, raster: &Raster, format: RasterFormat) -> SvgPngResult<Vec<u8>> {
        match format {
            RasterFormat::Png => encode_png(raster),
        }
    }

    /// Pixel geometry of a raster.
    fn geometry(&self, raster: &Raster) -> Dims {
        raster.dims()
    }

    /// Release the session.
    fn close(self: Box<Self>) -> SvgPngResult<()> {
        Ok(())
    }
}

/// Source of [`RasterSession`]s.
pub trait Rasterizer {
    /// Check the capability can be obtained at all, before any work is done.
    fn probe(&self) -> SvgPngResult<()> {
        Ok(())
    }

    /// Acquire a session. Fails with [`SvgPngError::RasterizerUnavailable`] when the
    /// capability cannot be obtained.
    fn open(&self) -> SvgPngResult<Box<dyn RasterSession>>;
}

/// Available rasterizer backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RasterizerKind {
    /// `usvg` + `resvg` CPU rasterizer (feature `resvg`, on by default).
    #[default]
    Resvg,
}

/// Create a rasterizer. Backends not compiled into this build report
/// [`SvgPngError::RasterizerUnavailable`].
pub fn create_rasterizer(
    kind: RasterizerKind,
    _settings: &RasterSettings,
) -> SvgPngResult<Box<dyn Rasterizer>> {
    match kind {
        #[cfg(feature = "resvg")]
        RasterizerKind::Resvg => Ok(Box::new(ResvgRasterizer::new(_settings.clone()))),
        #[allow(unreachable_patterns)]
        _ => Err(SvgPngError::rasterizer_unavailable(format!(
            "{kind:?} backend is not compiled into this build"
        ))),
    }
}

/// Encode a raster as 8-bit RGBA PNG.
pub fn encode_png(raster: &Raster) -> SvgPngResult<Vec<u8>> {
    let mut rgba = raster.rgba8_premul.clone();
    unpremultiply_rgba8_in_place(&mut rgba);

    let img = image::RgbaImage::from_raw(raster.width, raster.height, rgba).ok_or_else(|| {
        SvgPngError::raster(format!(
            "raster buffer does not match {}x{}",
            raster.width, raster.height
        ))
    })?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}

/// Convert premultiplied RGBA8 (what resvg renders) to straight alpha, rounding to nearest.
fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

/// Pixel size for a document of `(w, h)` user units: rounded, at least 1px, at most
/// [`MAX_DIM`].
pub fn raster_size(w: f32, h: f32) -> SvgPngResult<Dims> {
    fn to_px(v: f32) -> SvgPngResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(SvgPngError::raster("svg has invalid width/height"));
        }
        Ok((v.round() as u32).max(1))
    }

    let dims = Dims::new(to_px(w)?, to_px(h)?);
    check_max_dim(dims)?;
    Ok(dims)
}

fn check_max_dim(dims: Dims) -> SvgPngResult<()> {
    // Avoid pathological allocations from absurd declared sizes.
    if dims.width > MAX_DIM || dims.height > MAX_DIM {
        return Err(SvgPngError::raster(format!(
            "svg raster size too large: {}x{} (max {MAX_DIM}x{MAX_DIM})",
            dims.width, dims.height
        )));
    }
    Ok(())
}

#[cfg(feature = "resvg")]
pub use self::resvg_backend::{ResvgRasterizer, ResvgSession};

#[cfg(feature = "resvg")]
mod resvg_backend {
    use std::sync::Arc;

    use anyhow::Context;

    use super::{
        Raster, RasterInput, RasterRequest, RasterSession, RasterSettings, Rasterizer,
        check_max_dim, raster_size,
    };
    use crate::foundation::error::{SvgPngError, SvgPngResult};

    /// CPU rasterizer backed by `usvg` + `resvg`.
    pub struct ResvgRasterizer {
        settings: RasterSettings,
        fontdb: Arc<usvg::fontdb::Database>,
    }

    impl ResvgRasterizer {
        pub fn new(settings: RasterSettings) -> Self {
            let mut fontdb = usvg::fontdb::Database::new();
            if settings.system_fonts {
                fontdb.load_system_fonts();
            }
            Self {
                settings,
                fontdb: Arc::new(fontdb),
            }
        }
    }

    impl Rasterizer for ResvgRasterizer {
        fn open(&self) -> SvgPngResult<Box<dyn RasterSession>> {
            Ok(Box::new(ResvgSession {
                clear_rgba: self.settings.clear_rgba,
                fontdb: Arc::clone(&self.fontdb),
            }))
        }
    }

    pub struct ResvgSession {
        clear_rgba: Option<[u8; 4]>,
        fontdb: Arc<usvg::fontdb::Database>,
    }

    impl ResvgSession {
        fn parse(&self, request: &RasterRequest<'_>) -> SvgPngResult<usvg::Tree> {
            let opts = usvg::Options {
                resources_dir: request.resources_dir.map(|p| p.to_path_buf()),
                fontdb: Arc::clone(&self.fontdb),
                ..usvg::Options::default()
            };

            let tree = match request.input {
                RasterInput::Markup(markup) => usvg::Tree::from_str(markup, &opts)
                    .map_err(|e| SvgPngError::raster(format!("parse svg markup: {e}")))?,
                RasterInput::Path(path) => {
                    let bytes = std::fs::read(path)
                        .with_context(|| format!("read svg '{}'", path.display()))?;
                    usvg::Tree::from_data(&bytes, &opts).map_err(|e| {
                        SvgPngError::raster(format!("parse svg '{}': {e}", path.display()))
                    })?
                }
            };
            Ok(tree)
        }
    }

    impl RasterSession for ResvgSession {
        fn render(&mut self, request: RasterRequest<'_>) -> SvgPngResult<Raster> {
            let tree = self.parse(&request)?;
            let size = tree.size();
            let (tw, th) = (size.width(), size.height());

            let (dims, transform) = match request.crop_to {
                None => {
                    let dims = raster_size(tw, th)?;
                    let sx = dims.width as f32 / tw;
                    let sy = dims.height as f32 / th;
                    (dims, resvg::tiny_skia::Transform::from_scale(sx, sy))
                }
                Some(target) => {
                    if target.is_empty() {
                        return Err(SvgPngError::raster(format!(
                            "crop box must be non-empty, got {}x{}",
                            target.width, target.height
                        )));
                    }
                    check_max_dim(target)?;
                    // Validates the document size even though the box is fixed.
                    raster_size(tw, th)?;
                    let s = f32::max(target.width as f32 / tw, target.height as f32 / th);
                    let dx = (target.width as f32 - tw * s) / 2.0;
                    let dy = (target.height as f32 - th * s) / 2.0;
                    (
                        target,
                        resvg::tiny_skia::Transform::from_row(s, 0.0, 0.0, s, dx, dy),
                    )
                }
            };

            let mut pixmap = resvg::tiny_skia::Pixmap::new(dims.width, dims.height)
                .ok_or_else(|| SvgPngError::raster("failed to allocate svg pixmap"))?;
            if let Some([r, g, b, a]) = self.clear_rgba {
                pixmap.fill(resvg::tiny_skia::Color::from_rgba8(r, g, b, a));
            }

            resvg::render(&tree, transform, &mut pixmap.as_mut());

            Ok(Raster {
                width: dims.width,
                height: dims.height,
                rgba8_premul: pixmap.take(),
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/svg/raster.rs"]
mod tests;
