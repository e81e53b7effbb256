use proptest::prelude::*;
use std::collections::HashSet;
use tracery::document::{Element, MemoryDocument};
use tracery::model::{PointId, PointRole, Vec2};
use tracery::PathModel;

#[derive(Clone, Debug)]
enum Op {
    MovePoint { idx: u16, dx: i8, dy: i8 },
    Split { idx: u16, t_num: u8 },
    Straighten { idx: u16 },
    ToggleClosed { want: bool },
    RemoveEditPoint { idx: u16 },
    Roundtrip,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<u16>(), any::<i8>(), any::<i8>()).prop_map(|(idx, dx, dy)| Op::MovePoint {
            idx,
            dx,
            dy,
        }),
        (any::<u16>(), any::<u8>()).prop_map(|(idx, t_num)| Op::Split { idx, t_num }),
        any::<u16>().prop_map(|idx| Op::Straighten { idx }),
        any::<bool>().prop_map(|want| Op::ToggleClosed { want }),
        any::<u16>().prop_map(|idx| Op::RemoveEditPoint { idx }),
        Just(Op::Roundtrip),
    ]
}

fn seed_model() -> PathModel {
    PathModel::import(&MemoryDocument::from_elements(vec![
        Element::path(0.0, 0.0),
        Element::attribute("width", 2.0),
        Element::line(100.0, 0.0),
        Element::quad(150.0, 50.0, 100.0, 100.0),
        Element::percent(0.25),
        Element::cubic(60.0, 140.0, 20.0, 120.0, 0.0, 100.0),
    ]))
}

fn live_ids(model: &PathModel) -> Vec<PointId> {
    model.live_points().map(|(id, _)| id).collect()
}

fn edit_point_ids(model: &PathModel) -> Vec<PointId> {
    model
        .live_points()
        .filter(|(_, p)| p.role.is_edit_point())
        .map(|(id, _)| id)
        .collect()
}

fn apply_op(model: &mut PathModel, op: Op) {
    match op {
        Op::MovePoint { idx, dx, dy } => {
            let ids = live_ids(model);
            if ids.is_empty() {
                return;
            }
            let id = ids[(idx as usize) % ids.len()];
            let pos = model.point_pos(id).unwrap();
            let moved = pos + Vec2::new(dx as f32 * 0.5, dy as f32 * 0.5);
            let _ = model.set_point_pos(id, moved);
        }
        Op::Split { idx, t_num } => {
            if model.segment_count() == 0 {
                return;
            }
            let seg = (idx as usize) % model.segment_count();
            let t = (t_num as f32 / 255.0).clamp(0.05, 0.95);
            let _ = model.split_segment(seg, t);
        }
        Op::Straighten { idx } => {
            if model.segment_count() == 0 {
                return;
            }
            let seg = (idx as usize) % model.segment_count();
            let _ = model.straighten_segment(seg);
        }
        Op::ToggleClosed { want } => {
            let _ = model.toggle_closed(want);
        }
        Op::RemoveEditPoint { idx } => {
            let ids = edit_point_ids(model);
            if ids.is_empty() {
                return;
            }
            let _ = model.remove_edit_point(ids[(idx as usize) % ids.len()]);
        }
        Op::Roundtrip => {
            let mut doc = MemoryDocument::new();
            if model.export(&mut doc).is_ok() {
                *model = PathModel::import(&doc);
            }
        }
    }
}

fn assert_invariants(model: &PathModel) {
    let segs = model.segments();

    // Consecutive segments share one endpoint identity.
    for (i, w) in segs.windows(2).enumerate() {
        assert_eq!(
            w[0].p3(),
            w[1].p0(),
            "segments {} and {} are not chained",
            i,
            i + 1
        );
    }

    // Every referenced point is live, carries the right role, and no live
    // point is orphaned outside the segment chain.
    let mut referenced: HashSet<PointId> = HashSet::new();
    for (i, seg) in segs.iter().enumerate() {
        for id in seg.points {
            assert!(
                model.point(id).is_some(),
                "segment {} references freed point {}",
                i,
                id
            );
            referenced.insert(id);
        }
        assert_eq!(
            model.point(seg.p1()).unwrap().role,
            PointRole::FirstControl
        );
        assert_eq!(
            model.point(seg.p2()).unwrap().role,
            PointRole::SecondControl
        );
    }
    assert_eq!(model.point_count(), referenced.len(), "orphaned points");

    if let (Some(first), Some(last)) = (segs.first(), segs.last()) {
        if model.is_closed() {
            assert_eq!(
                model.point(first.p0()).unwrap().role,
                PointRole::StartAndEnd,
                "closed join must carry the merged role"
            );
        } else {
            assert_eq!(model.point(first.p0()).unwrap().role, PointRole::Start);
            assert_eq!(model.point(last.p3()).unwrap().role, PointRole::End);
        }
    }
}

fn sequence_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 5..30)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 10_000, .. ProptestConfig::default() })]
    #[test]
    fn path_edit_invariants(seq in sequence_strategy()) {
        let mut model = seed_model();
        for op in seq {
            apply_op(&mut model, op);
            assert_invariants(&model);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 500, .. ProptestConfig::default() })]
    #[test]
    fn canonical_export_preserves_geometry(seq in sequence_strategy()) {
        let mut model = seed_model();
        for op in seq {
            apply_op(&mut model, op);
        }

        let mut doc = MemoryDocument::new();
        prop_assert!(model.export_canonical(&mut doc).is_ok());
        let reimported = PathModel::import(&doc);

        prop_assert_eq!(model.segment_count(), reimported.segment_count());
        for idx in 0..model.segment_count() {
            let a = model.segment_bezier(idx).unwrap();
            let b = reimported.segment_bezier(idx).unwrap();
            for step in 0..=4u32 {
                let t = step as f32 / 4.0;
                prop_assert!(
                    a.eval(t).approx_eq(b.eval(t), 1e-2),
                    "segment {} diverges at t={}", idx, t
                );
            }
        }
    }
}
