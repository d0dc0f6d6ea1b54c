use super::*;

#[test]
fn raster_size_rounds_and_validates() {
    assert_eq!(raster_size(56.25, 10.6).unwrap(), Dims::new(56, 11));
    assert_eq!(raster_size(0.2, 0.4).unwrap(), Dims::new(1, 1));
    assert!(raster_size(0.0, 10.0).is_err());
    assert!(raster_size(f32::NAN, 10.0).is_err());
    assert!(raster_size(20_000.0, 10.0).is_err());
}

#[test]
fn encode_png_unpremultiplies() {
    let raster = Raster {
        width: 2,
        height: 1,
        rgba8_premul: vec![64, 0, 0, 128, 10, 20, 30, 255],
    };
    let bytes = encode_png(&raster).unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (2, 1));
    assert_eq!(decoded.as_raw().as_slice(), &[128, 0, 0, 128, 10, 20, 30, 255]);
}

#[test]
fn encode_png_rejects_mismatched_buffer() {
    let raster = Raster {
        width: 3,
        height: 3,
        rgba8_premul: vec![0; 4],
    };
    assert!(matches!(encode_png(&raster), Err(SvgPngError::Raster(_))));
}

#[test]
fn path_request_defaults_resources_dir() {
    let p = Path::new("assets/logo.svg");
    let req = RasterRequest::path(p);
    assert_eq!(req.resources_dir, Some(Path::new("assets")));
    assert!(req.crop_to.is_none());

    let req = RasterRequest::markup("<svg/>")
        .with_resources_dir(Some(Path::new("x")))
        .cropped_to(Some(Dims::new(3, 4)));
    assert_eq!(req.resources_dir, Some(Path::new("x")));
    assert_eq!(req.crop_to, Some(Dims::new(3, 4)));
}

#[test]
fn png_format_metadata() {
    assert_eq!(RasterFormat::Png.mime(), "image/png");
    assert_eq!(RasterFormat::Png.extension(), "png");
}

#[cfg(feature = "resvg")]
mod resvg_session {
    use super::*;

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
  <rect x="0" y="0" width="40" height="20" fill="#ff00ff"/>
</svg>"##;

    fn session() -> Box<dyn RasterSession> {
        create_rasterizer(RasterizerKind::Resvg, &RasterSettings::default())
            .unwrap()
            .open()
            .unwrap()
    }

    #[test]
    fn renders_at_declared_size() {
        let mut s = session();
        let raster = s.render(RasterRequest::markup(SVG)).unwrap();
        assert_eq!(s.geometry(&raster), Dims::new(40, 20));
        assert_eq!(raster.rgba8_premul.len(), 40 * 20 * 4);
        assert!(raster.rgba8_premul.chunks_exact(4).all(|px| px[3] == 255));
        let center = ((10 * 40 + 20) * 4) as usize;
        assert_eq!(&raster.rgba8_premul[center..center + 4], &[255, 0, 255, 255]);
        s.close().unwrap();
    }

    #[test]
    fn crop_box_is_filled_exactly() {
        let mut s = session();
        let raster = s
            .render(RasterRequest::markup(SVG).cropped_to(Some(Dims::new(15, 15))))
            .unwrap();
        assert_eq!(raster.dims(), Dims::new(15, 15));
        // Covered: no transparent pixels left in the box.
        assert!(raster.rgba8_premul.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn clear_color_fills_background() {
        let settings = RasterSettings {
            clear_rgba: Some([0, 0, 0, 255]),
            ..RasterSettings::default()
        };
        let mut s = create_rasterizer(RasterizerKind::Resvg, &settings)
            .unwrap()
            .open()
            .unwrap();
        let raster = s
            .render(RasterRequest::markup(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#,
            ))
            .unwrap();
        assert!(raster.rgba8_premul.chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn renders_from_path() {
        let dir = std::env::temp_dir().join(format!("svgpng_raster_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("r.svg");
        std::fs::write(&path, SVG).unwrap();

        let mut s = session();
        let raster = s.render(RasterRequest::path(&path)).unwrap();
        assert_eq!(raster.dims(), Dims::new(40, 20));

        assert!(s.render(RasterRequest::path(&dir.join("missing.svg"))).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn bad_markup_is_a_raster_error() {
        let mut s = session();
        let err = s.render(RasterRequest::markup("<svg")).unwrap_err();
        assert!(matches!(err, SvgPngError::Raster(_)), "{err}");
    }

    #[test]
    fn oversized_documents_are_refused() {
        let mut s = session();
        let err = s
            .render(RasterRequest::markup(
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="20000" height="10"/>"#,
            ))
            .unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}
