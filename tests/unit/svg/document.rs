use super::*;

const SVG_400X200: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="400" height="200" viewBox="0 0 400 200">
  <rect x="10" y="10" width="380" height="180" fill="#336699"/>
</svg>
"##;

fn doc(markup: &str) -> VectorDocument {
    VectorDocument::from_markup("test.svg", markup).unwrap()
}

#[test]
fn intrinsic_size_reads_root_attributes() {
    let size = doc(SVG_400X200).intrinsic_size().unwrap();
    assert_eq!(size, IntrinsicSize {
        width: 400.0,
        height: 200.0
    });
}

#[test]
fn scaled_rewrites_only_root_width_and_height() {
    let out = doc(SVG_400X200).scaled(0.5).unwrap();
    let expected = SVG_400X200.replacen(
        r#"width="400" height="200""#,
        r#"width="200.0" height="100.0""#,
        1,
    );
    assert_eq!(out, expected);
    // Child geometry and the viewBox are untouched.
    assert!(out.contains(r#"<rect x="10" y="10" width="380" height="180""#));
    assert!(out.contains(r#"viewBox="0 0 400 200""#));
}

#[test]
fn scaled_rounds_to_three_decimals() {
    let out = doc(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="30"/>"#)
        .scaled(1.0 / 3.0)
        .unwrap();
    assert_eq!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="33.333" height="10.0"/>"#
    );
}

#[test]
fn scaled_keeps_units_and_attribute_order() {
    let src = r#"<svg height='50px' xmlns="http://www.w3.org/2000/svg" width='20mm'><g/></svg>"#;
    let out = doc(src).scaled(2.0).unwrap();
    assert_eq!(
        out,
        r#"<svg height='100.0px' xmlns="http://www.w3.org/2000/svg" width='40.0mm'><g/></svg>"#
    );
}

#[test]
fn scaled_tolerates_doctype_and_comments() {
    let src = concat!(
        r#"<?xml version="1.0"?>"#,
        "\n",
        r#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">"#,
        "\n<!-- width=\"999\" -->\n",
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"/>"#,
    );
    let out = doc(src).scaled(3.0).unwrap();
    assert!(out.contains("<!-- width=\"999\" -->"));
    assert!(out.ends_with(r#"width="30.0" height="30.0"/>"#));
}

#[test]
fn missing_or_unusable_geometry_is_unparseable() {
    let cases = [
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"/>"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="10"/>"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="10"/>"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="100%"/>"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="auto" height="10"/>"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="-5" height="10"/>"#,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="." height="10"/>"#,
        r#"<html width="10" height="10"/>"#,
        r#"<svg width="10""#,
    ];
    for src in cases {
        let d = doc(src);
        assert!(
            matches!(
                d.intrinsic_size(),
                Err(SvgPngError::UnparseableIntrinsicGeometry(_))
            ),
            "{src}"
        );
        assert!(
            matches!(d.scaled(0.5), Err(SvgPngError::UnparseableIntrinsicGeometry(_))),
            "{src}"
        );
    }
}

#[test]
fn entity_encoded_lengths_use_the_decoded_value() {
    let src = r#"<svg xmlns="http://www.w3.org/2000/svg" width="4&#48;0" height="2&#x30;0px"/>"#;
    let d = doc(src);
    assert_eq!(d.intrinsic_size().unwrap(), IntrinsicSize {
        width: 400.0,
        height: 200.0
    });
    assert_eq!(
        d.scaled(0.5).unwrap(),
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="200.0" height="100.0px"/>"#
    );
}

#[test]
fn exponent_and_fraction_forms_parse_fully() {
    let src = r#"<svg xmlns="http://www.w3.org/2000/svg" width="1e2" height=".5E1em"/>"#;
    let d = doc(src);
    assert_eq!(d.intrinsic_size().unwrap(), IntrinsicSize {
        width: 100.0,
        height: 5.0
    });
    assert_eq!(
        d.scaled(2.0).unwrap(),
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="200.0" height="10.0em"/>"#
    );

    let em = doc(r#"<svg xmlns="http://www.w3.org/2000/svg" width="3em" height="+2ex"/>"#);
    assert_eq!(em.intrinsic_size().unwrap(), IntrinsicSize {
        width: 3.0,
        height: 2.0
    });
}

#[test]
fn scale_rounding_to_zero_is_rejected() {
    let d = doc(r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="0.001"/>"#);
    assert!(matches!(d.scaled(0.1), Err(SvgPngError::Validation(_))));
    assert!(d.scaled(1.0).is_ok());
}

#[test]
fn namespaced_width_is_not_the_root_width() {
    let src = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="urn:x" x:width="5" width="8" height="4"/>"#;
    let out = doc(src).scaled(0.5).unwrap();
    assert_eq!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:x="urn:x" x:width="5" width="4.0" height="2.0"/>"#
    );
}

#[test]
fn invalid_ratio_is_rejected() {
    let d = doc(SVG_400X200);
    assert!(d.scaled(0.0).is_err());
    assert!(d.scaled(f64::NAN).is_err());
    assert!(d.scaled(f64::INFINITY).is_err());
}

#[test]
fn base_name_must_be_bare() {
    assert!(VectorDocument::from_markup("a/b.svg", "").is_err());
    assert!(VectorDocument::from_markup("", "").is_err());
    let d = VectorDocument::from_markup("logo.svg", SVG_400X200).unwrap();
    assert_eq!(d.base(), "logo.svg");
    assert!(d.path().is_none());
    assert!(d.resources_dir().is_none());
}

#[test]
fn from_path_uses_file_name_as_base() {
    let dir = std::env::temp_dir().join(format!("svgpng_document_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("badge.svg");
    std::fs::write(&path, SVG_400X200).unwrap();

    let d = VectorDocument::from_path(&path).unwrap();
    assert_eq!(d.base(), "badge.svg");
    assert_eq!(d.path(), Some(path.as_path()));
    assert_eq!(d.resources_dir(), Some(dir.as_path()));
    assert_eq!(d.markup(), SVG_400X200);

    assert!(VectorDocument::from_path(dir.join("missing.svg")).is_err());
    std::fs::remove_dir_all(&dir).ok();
}
