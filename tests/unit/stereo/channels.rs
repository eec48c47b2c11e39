use super::*;

#[test]
fn non_anaglyph_layouts_copy_everything() {
    for layout in [
        StereoLayout::None,
        StereoLayout::LeftEye,
        StereoLayout::RightEye,
        StereoLayout::SideBySide,
        StereoLayout::TopBottom,
    ] {
        for eye in 0..2 {
            assert!(channels_for(layout, eye).is_full(), "{layout} eye {eye}");
        }
    }
}

#[test]
fn red_cyan_splits_red_from_green_blue() {
    let layout = StereoLayout::Anaglyph(AnaglyphMode::RedCyan);
    let left = channels_for(layout, 0);
    let right = channels_for(layout, 1);
    assert_eq!(left, ChannelMask::new(true, false, false, false));
    assert_eq!(right, ChannelMask::new(false, true, true, false));
    assert!(!left.overlaps(right));
}

#[test]
fn anaglyph_table_is_exact() {
    let gm = StereoLayout::Anaglyph(AnaglyphMode::GreenMagenta);
    assert_eq!(channels_for(gm, 0), ChannelMask::new(false, true, false, false));
    assert_eq!(channels_for(gm, 1), ChannelMask::new(true, false, true, false));

    let yb = StereoLayout::Anaglyph(AnaglyphMode::YellowBlue);
    assert_eq!(channels_for(yb, 0), ChannelMask::new(true, true, false, false));
    assert_eq!(channels_for(yb, 1), ChannelMask::new(false, false, true, false));
}

#[test]
fn anaglyph_eyes_never_overlap_and_skip_alpha() {
    for mode in [
        AnaglyphMode::RedCyan,
        AnaglyphMode::GreenMagenta,
        AnaglyphMode::YellowBlue,
    ] {
        let layout = StereoLayout::Anaglyph(mode);
        let a = channels_for(layout, 0);
        let b = channels_for(layout, 1);
        assert!(!a.overlaps(b), "{mode:?}");
        assert!(!a.a && !b.a, "{mode:?}");
        // Parity decides, not the raw index.
        assert_eq!(channels_for(layout, 2), a);
        assert_eq!(channels_for(layout, 3), b);
    }
}
