//! svgpng turns one SVG into PNG derivatives at a set of named target sizes.
//!
//! A vector source has no native pixel resolution, so sizing works from ratios:
//!
//! 1. **Fullsize**: rasterize the source at its declared size. This is the reference raster.
//! 2. **Resolve**: for each [`SizeSpec`], compute the scale ratio against the fullsize raster
//!    and the final box ([`resolve`]), the same aspect-fit-then-constrain rule a raster resizer
//!    applies.
//! 3. **Rescale**: rewrite the root `<svg>` width/height by that ratio ([`VectorDocument::scaled`]).
//! 4. **Rasterize**: render the rescaled markup through a [`Rasterizer`] session and persist it
//!    in an [`ArtifactStore`].
//!
//! [`DerivativeGenerator::generate`] runs the whole pipeline for one source and reports a
//! [`GenerationResult`].
#![forbid(unsafe_code)]

mod foundation;
mod generate;
mod output;
mod sizes;
mod svg;

pub use foundation::core::{
    Dims, FULLSIZE, FullsizeDims, NamedMap, PNG_MIME, SVG_MIME, is_svg_mime,
};
pub use foundation::error::{SvgPngError, SvgPngResult};
pub use generate::generator::{DerivativeGenerator, DerivativeRecord, GenerationResult};
pub use generate::metadata::{AttachmentMetadata, SizeMetadata};
pub use output::store::{
    ArtifactId, ArtifactStore, FsArtifactStore, InMemoryArtifactStore, derivative_filename,
};
pub use sizes::catalog::{SizeCatalog, SizeSpec, validate_size_name};
pub use sizes::resolve::{ResolvedBox, constrain_dimensions, fill_dimensions, resolve};
pub use svg::document::{IntrinsicSize, VectorDocument};
#[cfg(feature = "resvg")]
pub use svg::raster::{ResvgRasterizer, ResvgSession};
pub use svg::raster::{
    MAX_DIM, Raster, RasterFormat, RasterInput, RasterRequest, RasterSession, RasterSettings,
    Rasterizer, RasterizerKind, create_rasterizer, encode_png, raster_size,
};
