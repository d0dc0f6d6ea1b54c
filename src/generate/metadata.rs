use crate::foundation::core::{NamedMap, SVG_MIME};
use crate::foundation::error::{SvgPngError, SvgPngResult};
use crate::generate::generator::GenerationResult;

/// Per-size entry of [`AttachmentMetadata`]. Points back at the vector source, which every
/// vector-capable consumer keeps receiving; only the box dimensions differ per size.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SizeMetadata {
    pub width: u32,
    pub height: u32,
    pub file: String,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
}

/// Host-facing metadata for an uploaded vector attachment.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttachmentMetadata {
    pub width: u32,
    pub height: u32,
    /// Path of the source, relative to the host's upload root.
    pub file: String,
    pub sizes: NamedMap<SizeMetadata>,
}

impl AttachmentMetadata {
    /// Build the metadata from a generation result. Only sizes that were actually scaled get an
    /// entry.
    pub fn from_generation(result: &GenerationResult, relative_file: &str) -> SvgPngResult<Self> {
        let fullsize = result
            .fullsize()
            .ok_or_else(|| SvgPngError::validation("generation result has no fullsize entry"))?;

        let file_name = relative_file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(relative_file)
            .to_string();

        let sizes = result
            .sizes
            .names()
            .filter_map(|name| result.dims.get(name).map(|d| (name, d)))
            .map(|(name, d)| {
                (
                    name,
                    SizeMetadata {
                        width: d.width,
                        height: d.height,
                        file: file_name.clone(),
                        mime_type: SVG_MIME.to_string(),
                    },
                )
            })
            .collect();

        Ok(Self {
            width: fullsize.width,
            height: fullsize.height,
            file: relative_file.to_string(),
            sizes,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/metadata.rs"]
mod tests;
