use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{SvgPngError, SvgPngResult};

/// Identity of a persisted artifact, usable by downstream consumers (a path for
/// [`FsArtifactStore`], the file name for [`InMemoryArtifactStore`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where generated rasters go.
pub trait ArtifactStore {
    /// Persist `bytes` under `filename` and return its identity.
    fn persist(&mut self, filename: &str, bytes: &[u8]) -> SvgPngResult<ArtifactId>;

    /// Undo a persist: remove the artifact and put back whatever it replaced. Discarding
    /// something already gone is not an error.
    fn discard(&mut self, id: &ArtifactId) -> SvgPngResult<()>;

    /// Make a persist final, dropping anything kept to undo it.
    fn commit(&mut self, _id: &ArtifactId) -> SvgPngResult<()> {
        Ok(())
    }
}

/// `{base}.{ext}` for the fullsize raster, `{base}-{size}.{ext}` for a named size.
pub fn derivative_filename(base: &str, size: Option<&str>, extension: &str) -> String {
    match size {
        None => format!("{base}.{extension}"),
        Some(size) => format!("{base}-{size}.{extension}"),
    }
}

/// Writes artifacts into one directory.
///
/// A file replaced by [`ArtifactStore::persist`] is moved aside until the artifact is
/// committed, so [`ArtifactStore::discard`] can restore it.
#[derive(Clone, Debug)]
pub struct FsArtifactStore {
    dir: PathBuf,
    overwrite: bool,
    replaced: HashMap<PathBuf, PathBuf>,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: true,
            replaced: HashMap::new(),
        }
    }

    /// Store next to `source`, the way derivatives of an uploaded file usually live.
    pub fn beside(source: &Path) -> Self {
        let dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(dir)
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactStore for FsArtifactStore {
    fn persist(&mut self, filename: &str, bytes: &[u8]) -> SvgPngResult<ArtifactId> {
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(SvgPngError::store(format!(
                "artifact name '{filename}' must be a bare file name"
            )));
        }

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;

        let path = self.dir.join(filename);
        if path.exists() {
            if !self.overwrite {
                return Err(SvgPngError::store(format!(
                    "'{}' already exists",
                    path.display()
                )));
            }
            // A second persist of the same name keeps the first backup.
            if !self.replaced.contains_key(&path) {
                let backup = self.dir.join(format!(".{filename}.svgpng-prev"));
                remove_if_present(&backup)?;
                std::fs::rename(&path, &backup).with_context(|| {
                    format!("move aside '{}'", path.display())
                })?;
                self.replaced.insert(path.clone(), backup);
            }
        }

        std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "persisted artifact");
        Ok(ArtifactId(path.to_string_lossy().into_owned()))
    }

    fn discard(&mut self, id: &ArtifactId) -> SvgPngResult<()> {
        let path = PathBuf::from(id.as_str());
        remove_if_present(&path)?;
        if let Some(backup) = self.replaced.remove(&path) {
            std::fs::rename(&backup, &path)
                .with_context(|| format!("restore '{}'", path.display()))?;
            tracing::debug!(path = %path.display(), "restored replaced artifact");
        }
        Ok(())
    }

    fn commit(&mut self, id: &ArtifactId) -> SvgPngResult<()> {
        match self.replaced.remove(Path::new(id.as_str())) {
            Some(backup) => remove_if_present(&backup),
            None => Ok(()),
        }
    }
}

fn remove_if_present(path: &Path) -> SvgPngResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("remove '{}'", path.display()))
            .into()),
    }
}

/// Keeps artifacts in memory, in persist order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryArtifactStore {
    files: Vec<(String, Vec<u8>)>,
    replaced: HashMap<String, Vec<u8>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find_map(|(name, bytes)| (name == filename).then_some(bytes.as_slice()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn persist(&mut self, filename: &str, bytes: &[u8]) -> SvgPngResult<ArtifactId> {
        if let Some(i) = self.files.iter().position(|(name, _)| name == filename) {
            let (_, prev) = self.files.remove(i);
            self.replaced.entry(filename.to_string()).or_insert(prev);
        }
        self.files.push((filename.to_string(), bytes.to_vec()));
        Ok(ArtifactId(filename.to_string()))
    }

    fn discard(&mut self, id: &ArtifactId) -> SvgPngResult<()> {
        self.files.retain(|(name, _)| name != id.as_str());
        if let Some(prev) = self.replaced.remove(id.as_str()) {
            self.files.push((id.0.clone(), prev));
        }
        Ok(())
    }

    fn commit(&mut self, id: &ArtifactId) -> SvgPngResult<()> {
        self.replaced.remove(id.as_str());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/store.rs"]
mod tests;
