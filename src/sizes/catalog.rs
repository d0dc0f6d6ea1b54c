use std::path::Path;

use anyhow::Context;

use crate::foundation::core::{FULLSIZE, NamedMap};
use crate::foundation::error::{SvgPngError, SvgPngResult};

/// A named target box. `0` on an axis leaves that axis unconstrained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SizeSpec {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Fill the box and let the excess be cropped, instead of fitting inside it.
    #[serde(default, deserialize_with = "crop_flag")]
    pub crop: bool,
}

impl SizeSpec {
    pub fn new(width: u32, height: u32, crop: bool) -> Self {
        Self {
            width,
            height,
            crop,
        }
    }

    pub fn fit(width: u32, height: u32) -> Self {
        Self::new(width, height, false)
    }

    pub fn cropped(width: u32, height: u32) -> Self {
        Self::new(width, height, true)
    }
}

// Size configs written by hand frequently carry `"crop": 1`.
fn crop_flag<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match <Flag as serde::Deserialize>::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// Ordered `name -> SizeSpec` collection, iterated in the order it was written.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct SizeCatalog {
    sizes: NamedMap<SizeSpec>,
}

impl SizeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock catalog most hosts ship with.
    pub fn defaults() -> Self {
        let mut out = Self::new();
        for (name, spec) in [
            ("thumbnail", SizeSpec::cropped(150, 150)),
            ("medium", SizeSpec::fit(300, 300)),
            ("medium_large", SizeSpec::fit(768, 0)),
            ("large", SizeSpec::fit(1024, 1024)),
        ] {
            out.sizes.insert(name, spec);
        }
        out
    }

    pub fn from_json_str(json: &str) -> SvgPngResult<Self> {
        let sizes: NamedMap<SizeSpec> =
            serde_json::from_str(json).context("parse size catalog JSON")?;
        for name in sizes.names() {
            validate_size_name(name)?;
        }
        Ok(Self { sizes })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> SvgPngResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read size catalog '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    pub fn insert(&mut self, name: impl Into<String>, spec: SizeSpec) -> SvgPngResult<()> {
        let name = name.into();
        validate_size_name(&name)?;
        self.sizes.insert(name, spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SizeSpec> {
        self.sizes.get(name)
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SizeSpec)> {
        self.sizes.iter()
    }
}

impl<'de> serde::Deserialize<'de> for SizeCatalog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let sizes = <NamedMap<SizeSpec> as serde::Deserialize>::deserialize(deserializer)?;
        for name in sizes.names() {
            validate_size_name(name).map_err(serde::de::Error::custom)?;
        }
        Ok(Self { sizes })
    }
}

/// Size names end up in file names (`{base}-{name}.png`), so they must be a single path
/// component, and must not shadow the reserved fullsize entry.
pub fn validate_size_name(name: &str) -> SvgPngResult<()> {
    if name.trim().is_empty() {
        return Err(SvgPngError::validation("size name must be non-empty"));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(SvgPngError::validation(format!(
            "size name '{name}' must not contain path separators"
        )));
    }
    if name == FULLSIZE {
        return Err(SvgPngError::validation(format!(
            "size name '{FULLSIZE}' is reserved"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/sizes/catalog.rs"]
mod tests;
