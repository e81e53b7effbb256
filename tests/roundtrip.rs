use tracery::document::{Document, Element, ElementKind, MemoryDocument};
use tracery::model::Vec2;
use tracery::PathModel;

fn export_into(model: &mut PathModel) -> MemoryDocument {
    let mut out = MemoryDocument::new();
    model.export(&mut out).expect("export");
    out
}

fn kinds(doc: &MemoryDocument) -> Vec<ElementKind> {
    doc.children().into_iter().map(|(_, el)| el.kind).collect()
}

#[test]
fn line_survives_roundtrip_as_line() {
    let doc = MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        Element::line(100.0, 0.0),
    ]);
    let mut model = PathModel::import(&doc);
    let out = export_into(&mut model);

    assert_eq!(kinds(&out), vec![ElementKind::Path, ElementKind::Line]);
    let (_, line) = out.children().pop().unwrap();
    assert_eq!(line.get("x"), Some(100.0));
    assert_eq!(line.get("y"), Some(0.0));
}

#[test]
fn quad_survives_roundtrip_with_recovered_control() {
    let doc = MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        Element::quad(50.0, 100.0, 100.0, 0.0),
    ]);
    let mut model = PathModel::import(&doc);
    let out = export_into(&mut model);

    assert_eq!(kinds(&out), vec![ElementKind::Path, ElementKind::Quad]);
    let (_, quad) = out.children().pop().unwrap();
    assert!((quad.get("controlX").unwrap() - 50.0).abs() < 1e-2);
    assert!((quad.get("controlY").unwrap() - 100.0).abs() < 1e-2);
    assert_eq!(quad.get("x"), Some(100.0));
}

#[test]
fn genuine_cubic_stays_cubic() {
    let doc = MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        Element::cubic(0.0, 100.0, 100.0, 100.0, 100.0, 0.0),
    ]);
    let mut model = PathModel::import(&doc);
    let out = export_into(&mut model);
    assert_eq!(kinds(&out), vec![ElementKind::Path, ElementKind::Cubic]);
}

#[test]
fn attrs_and_percent_precede_their_segment() {
    let doc = MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        Element::attribute("width", 2.0),
        Element::percent(0.5),
        Element::line(50.0, 50.0),
        Element::attribute("cap", 1.0), // trailing, no segment follows
    ]);
    let mut model = PathModel::import(&doc);
    assert_eq!(model.segments()[0].attrs.get("width"), Some(&2.0));
    assert_eq!(model.segments()[0].percent, Some(0.5));

    let out = export_into(&mut model);
    assert_eq!(
        kinds(&out),
        vec![
            ElementKind::Path,
            ElementKind::Attribute,
            ElementKind::Percent,
            ElementKind::Line,
            ElementKind::Attribute,
        ]
    );
    let children = out.children();
    assert_eq!(children[1].1.name.as_deref(), Some("width"));
    assert_eq!(children[4].1.name.as_deref(), Some("cap"));
}

#[test]
fn malformed_primitive_is_skipped_not_fatal() {
    let mut broken = Element::quad(10.0, 10.0, 20.0, 20.0);
    broken.props.swap_remove("controlY");
    let doc = MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        broken,
        Element::line(100.0, 0.0),
    ]);
    let model = PathModel::import(&doc);
    assert_eq!(model.segment_count(), 1);
    let bez = model.segment_bezier(0).unwrap();
    assert!(bez.p3.approx_eq(Vec2::new(100.0, 0.0), 1e-4));
}

#[test]
fn roundtrip_is_idempotent() {
    let doc = MemoryDocument::from_elements(vec![
        Element::path(10.0, 10.0),
        Element::attribute("width", 3.0),
        Element::line(110.0, 10.0),
        Element::quad(160.0, 60.0, 110.0, 110.0),
        Element::cubic(90.0, 140.0, 40.0, 140.0, 10.0, 110.0),
    ]);
    let mut model = PathModel::import(&doc);
    let first = export_into(&mut model);

    let mut model2 = PathModel::import(&first);
    let second = export_into(&mut model2);

    // No spurious promotion on the second pass: the line stays a line, the
    // quad a quad.
    assert_eq!(kinds(&first), kinds(&second));

    // And the geometry is unchanged at the sample grid.
    let model3 = PathModel::import(&second);
    assert_eq!(model2.segment_count(), model3.segment_count());
    for idx in 0..model2.segment_count() {
        let a = model2.segment_bezier(idx).unwrap();
        let b = model3.segment_bezier(idx).unwrap();
        for step in 0..=4u32 {
            let t = step as f32 / 4.0;
            assert!(
                a.eval(t).approx_eq(b.eval(t), 1e-3),
                "segment {} diverges at t={}",
                idx,
                t
            );
        }
    }
}

#[test]
fn canonical_export_forces_cubics() {
    let doc = MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        Element::line(100.0, 0.0),
        Element::quad(150.0, 50.0, 100.0, 100.0),
    ]);
    let mut model = PathModel::import(&doc);
    let mut out = MemoryDocument::new();
    model.export_canonical(&mut out).expect("export");
    assert_eq!(
        kinds(&out),
        vec![ElementKind::Path, ElementKind::Cubic, ElementKind::Cubic]
    );
}

#[test]
fn coincident_endpoints_import_as_closed() {
    let doc = MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        Element::line(100.0, 0.0),
        Element::line(50.0, 80.0),
        Element::line(0.0, 0.0),
    ]);
    let model = PathModel::import(&doc);
    assert!(model.is_closed());
    // The merged join is one identity, not two coincident points.
    assert_eq!(model.segments()[0].p0(), model.segments()[2].p3());
}
