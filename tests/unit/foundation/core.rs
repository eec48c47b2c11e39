use super::*;

#[test]
fn rect_contains_is_half_open() {
    let r = Rect2D::new(Point2D::new(2, 3), Point2D::new(5, 6));
    assert!(r.contains(Point2D::new(2, 3)));
    assert!(r.contains(Point2D::new(4, 5)));
    assert!(!r.contains(Point2D::new(5, 5)));
    assert!(!r.contains(Point2D::new(4, 6)));
    assert!(!r.contains(Point2D::new(1, 3)));
}

#[test]
fn rect_translate_keeps_size() {
    let r = Rect2D::from_size(Point2D::new(10, 4)).translate(Point2D::new(7, -2));
    assert_eq!(r.begin, Point2D::new(7, -2));
    assert_eq!(r.end, Point2D::new(17, 2));
    assert_eq!(r.size(), Point2D::new(10, 4));
}

#[test]
fn rect_intersect_of_disjoint_is_empty() {
    let a = Rect2D::from_size(Point2D::new(4, 4));
    let b = a.translate(Point2D::new(10, 0));
    assert!(a.intersect(&b).is_empty());

    let c = a.translate(Point2D::new(2, 2));
    let i = a.intersect(&c);
    assert_eq!(i, Rect2D::new(Point2D::new(2, 2), Point2D::new(4, 4)));
    assert!(a.contains_rect(&i));
}

#[test]
fn rgba_from_short_slice_defaults_alpha() {
    let px = Rgba::from_slice(&[0.25]);
    assert_eq!(px, Rgba::new(0.25, 0.0, 0.0, 1.0));
}

#[test]
fn rgba8_quantization_clamps() {
    assert_eq!(Rgba::new(2.0, -1.0, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    assert_eq!(Rgba::from_rgba8([255, 0, 0, 255]), Rgba::ERROR_RED);
}
