use crate::foundation::core::{Dims, FULLSIZE, NamedMap};
use crate::foundation::error::{SvgPngError, SvgPngResult};
use crate::output::store::{ArtifactId, ArtifactStore, derivative_filename};
use crate::sizes::catalog::SizeCatalog;
use crate::sizes::resolve::resolve;
use crate::svg::document::VectorDocument;
use crate::svg::raster::{
    RasterFormat, RasterRequest, RasterSession, RasterSettings, Rasterizer, RasterizerKind,
    create_rasterizer,
};

/// One generated raster.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DerivativeRecord {
    /// Store identity of the artifact.
    pub path: String,
    /// Bare file name.
    pub file: String,
    pub width: u32,
    pub height: u32,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
}

impl DerivativeRecord {
    pub fn dims(&self) -> Dims {
        Dims::new(self.width, self.height)
    }
}

/// Everything one [`DerivativeGenerator::generate`] call produced.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GenerationResult {
    /// Every generated raster, `"fullsize"` first, then sizes in catalog order.
    pub sizes: NamedMap<DerivativeRecord>,
    /// Resolved box per size, for sizes whose geometry was actually scaled.
    pub dims: NamedMap<Dims>,
    /// Sizes rasterized unscaled because the source declares no usable width/height.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unscaled: Vec<String>,
}

impl GenerationResult {
    pub fn fullsize(&self) -> Option<&DerivativeRecord> {
        self.sizes.get(FULLSIZE)
    }

    pub fn get(&self, name: &str) -> Option<&DerivativeRecord> {
        self.sizes.get(name)
    }
}

/// Turns one vector source into a raster per configured size.
///
/// Holds no per-request state; a single generator can serve any number of sources.
pub struct DerivativeGenerator {
    rasterizer: Box<dyn Rasterizer>,
    format: RasterFormat,
}

impl DerivativeGenerator {
    pub fn new(rasterizer: Box<dyn Rasterizer>) -> Self {
        Self {
            rasterizer,
            format: RasterFormat::Png,
        }
    }

    pub fn with_kind(kind: RasterizerKind, settings: &RasterSettings) -> SvgPngResult<Self> {
        Ok(Self::new(create_rasterizer(kind, settings)?))
    }

    pub fn format(&self) -> RasterFormat {
        self.format
    }

    /// Rasterize `source` at fullsize and at every size in `sizes`, persisting each raster in
    /// `store`.
    ///
    /// The batch is all-or-nothing: if any size fails, artifacts persisted by this call are
    /// discarded, restoring any files they replaced, before the error is returned.
    #[tracing::instrument(skip_all, fields(source = source.base(), sizes = sizes.len()))]
    pub fn generate(
        &self,
        source: &VectorDocument,
        sizes: &SizeCatalog,
        store: &mut dyn ArtifactStore,
    ) -> SvgPngResult<GenerationResult> {
        self.rasterizer.probe()?;
        if sizes.is_empty() {
            return Err(SvgPngError::NoSizesConfigured);
        }

        let mut persisted = Vec::new();
        match self.generate_all(source, sizes, store, &mut persisted) {
            Ok(result) => {
                for id in &persisted {
                    if let Err(commit_err) = store.commit(id) {
                        tracing::warn!(artifact = id.as_str(), error = %commit_err, "failed to commit artifact");
                    }
                }
                tracing::info!(
                    derivatives = result.sizes.len(),
                    unscaled = result.unscaled.len(),
                    "generated derivatives"
                );
                Ok(result)
            }
            Err(err) => {
                for id in persisted.iter().rev() {
                    if let Err(discard_err) = store.discard(id) {
                        tracing::warn!(artifact = id.as_str(), error = %discard_err, "failed to discard artifact");
                    }
                }
                Err(err)
            }
        }
    }

    fn generate_all(
        &self,
        source: &VectorDocument,
        sizes: &SizeCatalog,
        store: &mut dyn ArtifactStore,
        persisted: &mut Vec<ArtifactId>,
    ) -> SvgPngResult<GenerationResult> {
        let mut out = GenerationResult::default();

        let fullsize = self.rasterize(
            unscaled_request(source),
            &derivative_filename(source.base(), None, self.format.extension()),
            store,
            persisted,
        )?;
        let fullsize_dims = fullsize.dims();
        out.sizes.insert(FULLSIZE, fullsize);

        for (name, spec) in sizes.iter() {
            let resolved = resolve(spec, fullsize_dims)?;
            let crop_to = spec.crop.then(|| resolved.new_dims());
            let filename = derivative_filename(source.base(), Some(name), self.format.extension());

            let record = match source.scaled(resolved.ratio) {
                Ok(markup) => {
                    let request = RasterRequest::markup(&markup)
                        .with_resources_dir(source.resources_dir())
                        .cropped_to(crop_to);
                    let record = self.rasterize(request, &filename, store, persisted)?;
                    out.dims.insert(name, resolved.new_dims());
                    record
                }
                Err(SvgPngError::UnparseableIntrinsicGeometry(reason)) => {
                    tracing::warn!(size = name, %reason, "cannot scale source geometry, rasterizing unscaled");
                    let request = unscaled_request(source).cropped_to(crop_to);
                    out.unscaled.push(name.to_string());
                    self.rasterize(request, &filename, store, persisted)?
                }
                Err(err) => return Err(err),
            };

            tracing::debug!(
                size = name,
                ratio = resolved.ratio,
                width = record.width,
                height = record.height,
                "derivative"
            );
            out.sizes.insert(name, record);
        }

        Ok(out)
    }

    /// Open a session, render, encode, persist, close.
    fn rasterize(
        &self,
        request: RasterRequest<'_>,
        filename: &str,
        store: &mut dyn ArtifactStore,
        persisted: &mut Vec<ArtifactId>,
    ) -> SvgPngResult<DerivativeRecord> {
        let mut session = self.rasterizer.open()?;
        let result = self.render_and_persist(session.as_mut(), request, filename, store, persisted);
        let closed = session.close();
        let record = result?;
        closed?;
        Ok(record)
    }

    fn render_and_persist(
        &self,
        session: &mut dyn RasterSession,
        request: RasterRequest<'_>,
        filename: &str,
        store: &mut dyn ArtifactStore,
        persisted: &mut Vec<ArtifactId>,
    ) -> SvgPngResult<DerivativeRecord> {
        let raster = session.render(request)?;
        let bytes = session.encode(&raster, self.format)?;
        let geo = session.geometry(&raster);

        let id = store.persist(filename, &bytes)?;
        persisted.push(id.clone());

        Ok(DerivativeRecord {
            path: id.0,
            file: filename.to_string(),
            width: geo.width,
            height: geo.height,
            mime_type: self.format.mime().to_string(),
        })
    }
}

fn unscaled_request(source: &VectorDocument) -> RasterRequest<'_> {
    match source.path() {
        Some(path) => RasterRequest::path(path),
        None => RasterRequest::markup(source.markup()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/generator.rs"]
mod tests;
