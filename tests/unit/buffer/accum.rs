use super::*;
use crate::buffer::passes::COMBINED_PASS_NAME;

fn combined_and_depth() -> Vec<RenderPassDescriptor> {
    vec![
        RenderPassDescriptor::combined(),
        RenderPassDescriptor::new(PassKind::Depth, "Depth"),
    ]
}

#[test]
fn depth_pass_follows_combined_and_defaults_fill() {
    let buf = AccumulationBuffer::new(Point2D::new(4, 4), &combined_and_depth()).unwrap();

    assert_eq!(buf.pass_offset(COMBINED_PASS_NAME), 0);
    assert_eq!(buf.pass_offset("Depth"), 4 * 4 * 4);
    assert_eq!(buf.as_slice().len(), 4 * 4 * 4 + 4 * 4);

    let depth = buf.pass("Depth");
    assert_eq!(depth.channels(), 1);
    assert!(depth.as_slice().iter().all(|&v| v == 0.0));

    let combined = buf.combined();
    for (i, &v) in combined.as_slice().iter().enumerate() {
        let expected = if i % 4 == 3 { 1.0 } else { 0.0 };
        assert_eq!(v, expected, "element {i}");
    }
}

#[test]
fn combined_is_moved_first_and_forced_to_four_channels() {
    let mut passes = vec![
        RenderPassDescriptor::new(PassKind::Normal, "Normal"),
        RenderPassDescriptor::combined(),
    ];
    passes[1].channels = 1;
    let buf = AccumulationBuffer::new(Point2D::new(2, 2), &passes).unwrap();
    let names: Vec<_> = buf.passes().map(|p| p.name.clone()).collect();
    assert_eq!(names, vec!["Combined".to_string(), "Normal".to_string()]);
    assert_eq!(buf.combined().channels(), 4);
    assert_eq!(buf.pass_offset("Normal"), 2 * 2 * 4);
}

#[test]
fn missing_combined_is_inserted() {
    let passes = vec![RenderPassDescriptor::new(PassKind::Depth, "Z")];
    let buf = AccumulationBuffer::new(Point2D::new(3, 1), &passes).unwrap();
    assert_eq!(buf.pass_count(), 2);
    assert!(buf.pass_at(0).descriptor().is_combined());
}

#[test]
fn unknown_pass_name_falls_back_to_combined() {
    let buf = AccumulationBuffer::new(Point2D::new(4, 4), &combined_and_depth()).unwrap();
    assert_eq!(buf.find_pass("Glossy"), None);
    assert_eq!(buf.resolve_pass("Glossy"), 0);
    assert_eq!(buf.pass_offset("Glossy"), 0);
    assert!(buf.pass("Glossy").descriptor().is_combined());
}

#[test]
fn invalid_channel_counts_and_duplicates_are_rejected() {
    let mut bad = RenderPassDescriptor::new(PassKind::Custom, "UV");
    bad.channels = 2;
    assert!(matches!(
        AccumulationBuffer::new(Point2D::new(1, 1), &[bad]),
        Err(BridgeError::Validation(_))
    ));

    let dup = vec![
        RenderPassDescriptor::new(PassKind::Depth, "Z"),
        RenderPassDescriptor::new(PassKind::Shadow, "Z"),
    ];
    assert!(AccumulationBuffer::new(Point2D::new(1, 1), &dup).is_err());
}

#[test]
fn accessors_reject_out_of_bounds_spans() {
    let mut buf = AccumulationBuffer::new(Point2D::new(4, 2), &combined_and_depth()).unwrap();
    let combined = buf.combined();
    assert!(combined.span(0, 0, 4).is_some());
    assert!(combined.span(0, 1, 4).is_none());
    assert!(combined.row(2).is_none());
    assert_eq!(combined.rgba(3, 1), Some(Rgba::BLACK));

    let mut depth = buf.pass_mut("Depth");
    depth.pixel_mut(3, 1).unwrap()[0] = 7.5;
    assert!(depth.pixel_mut(4, 1).is_none());
    assert_eq!(buf.pass("Depth").pixel(3, 1), Some(&[7.5][..]));
    assert_eq!(buf.pass("Depth").rgba(3, 1), Some(Rgba::new(7.5, 7.5, 7.5, 1.0)));
}

#[test]
fn zero_sized_buffer_is_valid() {
    let buf = AccumulationBuffer::new(Point2D::new(0, 0), &combined_and_depth()).unwrap();
    assert!(buf.as_slice().is_empty());
    assert!(buf.combined().row(0).is_none());
}
