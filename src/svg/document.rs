use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{SvgPngError, SvgPngResult};

/// Declared width/height of a document's root `<svg>` element, in the document's own units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntrinsicSize {
    pub width: f64,
    pub height: f64,
}

/// A vector source: its markup plus the base name derivatives are named after.
#[derive(Clone, Debug)]
pub struct VectorDocument {
    base: String,
    path: Option<PathBuf>,
    markup: String,
}

impl VectorDocument {
    /// Read a document from disk. The base name is the file name, extension included.
    pub fn from_path(path: impl AsRef<Path>) -> SvgPngResult<Self> {
        let path = path.as_ref();
        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                SvgPngError::validation(format!("'{}' has no usable file name", path.display()))
            })?
            .to_string();
        let markup = std::fs::read_to_string(path)
            .with_context(|| format!("read svg '{}'", path.display()))?;
        Ok(Self {
            base,
            path: Some(path.to_path_buf()),
            markup,
        })
    }

    /// Wrap in-memory markup. `base` must be a bare file name such as `logo.svg`.
    pub fn from_markup(base: impl Into<String>, markup: impl Into<String>) -> SvgPngResult<Self> {
        let base = base.into();
        if base.trim().is_empty() || base.contains(['/', '\\']) || base == "." || base == ".." {
            return Err(SvgPngError::validation(format!(
                "document base name '{base}' must be a bare file name"
            )));
        }
        Ok(Self {
            base,
            path: None,
            markup: markup.into(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Directory relative `href`s resolve against, when the document came from disk.
    pub fn resources_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    pub fn intrinsic_size(&self) -> SvgPngResult<IntrinsicSize> {
        let geo = root_geometry(&self.markup)?;
        Ok(IntrinsicSize {
            width: geo.width.value,
            height: geo.height.value,
        })
    }

    /// A copy of the markup with the root element's width and height multiplied by `ratio`.
    ///
    /// Only the numeric part of the two attribute values changes; units and every other byte
    /// of the document are kept as-is. A value written with entity references is replaced
    /// whole by its decoded, rescaled form.
    ///
    /// Fails with [`SvgPngError::Validation`] when a rescaled length rounds to zero.
    pub fn scaled(&self, ratio: f64) -> SvgPngResult<String> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(SvgPngError::validation(format!(
                "scale ratio must be finite and > 0, got {ratio}"
            )));
        }

        let geo = root_geometry(&self.markup)?;
        let mut edits = [
            (geo.width.range.clone(), geo.width.rescaled("width", ratio)?),
            (geo.height.range.clone(), geo.height.rescaled("height", ratio)?),
        ];
        edits.sort_by_key(|(range, _)| std::cmp::Reverse(range.start));

        let mut out = self.markup.clone();
        for (range, text) in edits {
            out.replace_range(range, &text);
        }
        Ok(out)
    }
}

#[derive(Debug)]
struct LengthAttr {
    value: f64,
    /// Byte range within the markup that a rescaled number replaces.
    range: Range<usize>,
    /// Text written after the new number: empty when `range` covers only the number, the
    /// decoded unit when it covers the whole attribute value.
    tail: String,
}

impl LengthAttr {
    fn rescaled(&self, name: &str, ratio: f64) -> SvgPngResult<String> {
        let v = round3(self.value * ratio);
        if v <= 0.0 {
            return Err(SvgPngError::validation(format!(
                "{name} {} scaled by {ratio} rounds to zero",
                self.value
            )));
        }
        Ok(format!("{}{}", format_length(v), self.tail))
    }
}

#[derive(Debug)]
struct RootGeometry {
    width: LengthAttr,
    height: LengthAttr,
}

fn root_geometry(markup: &str) -> SvgPngResult<RootGeometry> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(markup, opts)
        .map_err(|e| SvgPngError::unparseable_geometry(format!("parse svg markup: {e}")))?;

    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(SvgPngError::unparseable_geometry(format!(
            "root element is <{}>, not <svg>",
            root.tag_name().name()
        )));
    }

    let length = |name: &str| -> SvgPngResult<LengthAttr> {
        let attr = root
            .attributes()
            .find(|a| a.name() == name && a.namespace().is_none())
            .ok_or_else(|| {
                SvgPngError::unparseable_geometry(format!("root <svg> has no {name} attribute"))
            })?;
        let invalid = || {
            SvgPngError::unparseable_geometry(format!(
                "root <svg> {name}=\"{}\" is not an absolute positive length",
                attr.value()
            ))
        };
        let (value, number) = parse_length(attr.value()).ok_or_else(invalid)?;

        let value_range = attr.range_value();
        let raw = &markup[value_range.clone()];
        // Entity references mean decoded offsets do not map onto the markup; rewrite the whole
        // value in its decoded form instead.
        let (range, tail) = if raw == attr.value() {
            let start = value_range.start + number.start;
            (start..value_range.start + number.end, String::new())
        } else {
            (value_range, escape_attr(attr.value()[number.end..].trim()))
        };
        Ok(LengthAttr { value, range, tail })
    };

    Ok(RootGeometry {
        width: length("width")?,
        height: length("height")?,
    })
}

/// Parse the leading number of a length such as `400`, ` 12.5px`, `1e2` or `30mm`, returning
/// its value and byte range within `text`.
///
/// Percentages are relative to a viewport the document does not have, so they are rejected
/// along with zero and anything without a leading number.
fn parse_length(text: &str) -> Option<(f64, Range<usize>)> {
    let start = text.len() - text.trim_start().len();
    let end = start + number_len(&text[start..]);
    if end == start || text[end..].trim() == "%" {
        return None;
    }

    let value: f64 = text[start..end].parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some((value, start..end))
}

/// Length of the `[+-]? (digits [. digits?] | . digits) ([eE] [+-]? digits)?` prefix of `s`.
///
/// An `e` not followed by digits is left alone so units like `em` and `ex` survive.
fn number_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits_from = |i: usize| i + b[i..].iter().take_while(|c| c.is_ascii_digit()).count();

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_end = digits_from(i);
    let mut end = int_end;
    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if frac_end > end + 1 || int_end > i {
            end = frac_end;
        }
    }
    if end == i {
        return 0;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut j = end + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }
    end
}

fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

// `{:?}` keeps a trailing `.0` on whole numbers and prints the shortest exact digits otherwise.
fn format_length(v: f64) -> String {
    format!("{v:?}")
}

#[cfg(test)]
#[path = "../../tests/unit/svg/document.rs"]
mod tests;
