pub type SvgPngResult<T> = Result<T, SvgPngError>;

#[derive(thiserror::Error, Debug)]
pub enum SvgPngError {
    #[error("rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),

    #[error("no image sizes configured")]
    NoSizesConfigured,

    #[error("invalid fullsize dimensions: {width}x{height}")]
    InvalidFullsizeDimensions { width: u32, height: u32 },

    #[error("unparseable intrinsic geometry: {0}")]
    UnparseableIntrinsicGeometry(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("raster error: {0}")]
    Raster(String),

    #[error("store error: {0}")]
    Store(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SvgPngError {
    pub fn rasterizer_unavailable(msg: impl Into<String>) -> Self {
        Self::RasterizerUnavailable(msg.into())
    }

    pub fn unparseable_geometry(msg: impl Into<String>) -> Self {
        Self::UnparseableIntrinsicGeometry(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Errors that abort the whole request before any artifact is produced.
    pub fn is_fatal_precondition(&self) -> bool {
        matches!(
            self,
            Self::RasterizerUnavailable(_)
                | Self::NoSizesConfigured
                | Self::InvalidFullsizeDimensions { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
