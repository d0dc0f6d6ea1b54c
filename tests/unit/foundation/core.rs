use super::*;

#[test]
fn svg_mime_detection() {
    assert!(is_svg_mime(SVG_MIME));
    assert!(is_svg_mime("image/svg"));
    assert!(!is_svg_mime(PNG_MIME));
    assert!(!is_svg_mime(""));
}

#[test]
fn dims_empty_on_either_axis() {
    assert!(Dims::new(0, 5).is_empty());
    assert!(Dims::new(5, 0).is_empty());
    assert!(!Dims::new(1, 1).is_empty());
}

#[test]
fn named_map_keeps_insertion_order_and_replaces_in_place() {
    let mut m = NamedMap::new();
    m.insert("zeta", 1);
    m.insert("alpha", 2);
    m.insert("mid", 3);
    assert_eq!(m.insert("alpha", 20), Some(2));

    let names: Vec<&str> = m.names().collect();
    assert_eq!(names, ["zeta", "alpha", "mid"]);
    assert_eq!(m.get("alpha"), Some(&20));
    assert_eq!(m.len(), 3);
    assert!(m.get("missing").is_none());
}

#[test]
fn named_map_json_preserves_document_order() {
    let m: NamedMap<u32> = serde_json::from_str(r#"{"b": 1, "a": 2, "c": 3}"#).unwrap();
    let names: Vec<&str> = m.names().collect();
    assert_eq!(names, ["b", "a", "c"]);
    assert_eq!(serde_json::to_string(&m).unwrap(), r#"{"b":1,"a":2,"c":3}"#);
}

#[test]
fn named_map_rejects_duplicate_names() {
    let err = serde_json::from_str::<NamedMap<u32>>(r#"{"a": 1, "a": 2}"#).unwrap_err();
    assert!(err.to_string().contains("duplicate name 'a'"));
}

#[test]
fn named_map_is_eq_when_values_are() {
    fn eq_bound<T: Eq>(_: &T) {}

    let a: NamedMap<Dims> = [("x".to_string(), Dims::new(1, 2))].into_iter().collect();
    eq_bound(&a);
    assert_eq!(a, a.clone());
}
