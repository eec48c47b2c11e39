use super::*;
use crate::buffer::accum::AccumulationBuffer;
use crate::buffer::passes::RenderPassDescriptor;
use crate::framebuffer::sink::InMemoryFrameBuffer;
use crate::framebuffer::tonemap::{ToneMapConfig, ToneMapOperator};

fn accum(w: i32, h: i32) -> AccumulationBuffer {
    AccumulationBuffer::new(Point2D::new(w, h), &[RenderPassDescriptor::combined()]).unwrap()
}

fn set(buf: &mut AccumulationBuffer, x: usize, y: usize, px: Rgba) {
    let mut pass = buf.pass_mut("Combined");
    pass.pixel_mut(x, y).unwrap().copy_from_slice(&px.to_array());
}

fn exposure(stops: f32, process_background: bool) -> ToneMapConfig {
    ToneMapConfig {
        operator: ToneMapOperator::Exposure { stops },
        process_background,
    }
}

#[test]
fn constant_reader_fills_the_host() {
    let reader = ConstantColorReader::new(Point2D::new(6, 4), Rgba::ERROR_RED);
    let mut host = InMemoryFrameBuffer::new(6, 4);
    assert_eq!(stream_to_host(&reader, &mut host).unwrap(), 24);
    assert!(host.pixels().iter().all(|p| *p == Rgba::ERROR_RED));
    assert_eq!(host.refreshes(), 1);
}

#[test]
fn rows_are_read_top_down_without_a_second_flip() {
    let mut buf = accum(2, 2);
    set(&mut buf, 1, 0, Rgba::new(0.5, 0.0, 0.0, 1.0));
    let tone = ToneMapConfig::default();
    let reader = AccumBufferReader::new(buf.combined(), Rect2D::from_size(Point2D::new(2, 2)), &tone);
    assert_eq!(reader.row(0, 0, 2)[1], Rgba::new(0.5, 0.0, 0.0, 1.0));
    assert_eq!(reader.row(1, 0, 2)[1], Rgba::BLACK);
}

#[test]
fn tone_map_without_backplate_keeps_alpha() {
    let mut buf = accum(1, 1);
    set(&mut buf, 0, 0, Rgba::new(0.25, 0.5, 0.125, 0.5));
    let tone = exposure(1.0, false);
    let reader = AccumBufferReader::new(buf.combined(), Rect2D::from_size(Point2D::new(1, 1)), &tone);
    assert_eq!(reader.row(0, 0, 1)[0], Rgba::new(0.5, 1.0, 0.25, 0.5));
}

#[test]
fn backplate_fills_behind_transparent_pixels() {
    let mut buf = accum(1, 1);
    set(&mut buf, 0, 0, Rgba::new(0.25, 0.0, 0.0, 0.5));
    let bp = Backplate::solid(1, 1, Rgba::new(0.0, 1.0, 0.0, 1.0)).unwrap();
    let region = Rect2D::from_size(Point2D::new(1, 1));

    let tone = exposure(1.0, false);
    let reader = AccumBufferReader::new(buf.combined(), region, &tone).with_backplate(Some(&bp));
    // Tone map the render, then add the untouched background.
    assert_eq!(reader.row(0, 0, 1)[0], Rgba::new(0.5, 0.5, 0.0, 1.0));

    let tone = exposure(1.0, true);
    let reader = AccumBufferReader::new(buf.combined(), region, &tone).with_backplate(Some(&bp));
    assert_eq!(reader.row(0, 0, 1)[0], Rgba::new(0.5, 1.0, 0.0, 1.0));
}

#[test]
fn small_backplate_tiles_across_frame() {
    let mut buf = accum(4, 1);
    for x in 0..4 {
        set(&mut buf, x, 0, Rgba::TRANSPARENT);
    }
    let bp = Backplate::from_pixels(
        2,
        1,
        vec![Rgba::new(1.0, 0.0, 0.0, 1.0), Rgba::new(0.0, 0.0, 1.0, 1.0)],
    )
    .unwrap();
    let tone = ToneMapConfig::default();
    let reader = AccumBufferReader::new(buf.combined(), Rect2D::from_size(Point2D::new(4, 1)), &tone)
        .with_backplate(Some(&bp));
    let row = reader.row(0, 0, 4);
    assert_eq!(row[0], row[2]);
    assert_eq!(row[1], row[3]);
    assert_ne!(row[0], row[1]);
}

#[test]
fn outside_pixels_read_transparent() {
    let buf = accum(2, 2);
    let tone = ToneMapConfig::default();
    let reader = AccumBufferReader::new(buf.combined(), Rect2D::from_size(Point2D::new(2, 2)), &tone);
    let row = reader.row(0, -1, 4);
    assert_eq!(row[0], Rgba::TRANSPARENT);
    assert_eq!(row[1], Rgba::BLACK);
    assert_eq!(row[3], Rgba::TRANSPARENT);
    assert_eq!(reader.row(5, 0, 1)[0], Rgba::TRANSPARENT);
}

#[test]
fn streaming_respects_region() {
    let buf = accum(8, 8);
    let tone = ToneMapConfig::default();
    let region = Rect2D::new(Point2D::new(2, 2), Point2D::new(5, 4));
    let reader = AccumBufferReader::new(buf.combined(), region, &tone);
    let mut host = InMemoryFrameBuffer::new(8, 8);
    assert_eq!(stream_to_host(&reader, &mut host).unwrap(), 6);
    assert_eq!(host.pixel(2, 2), Some(Rgba::BLACK));
    assert_eq!(host.pixel(1, 2), Some(Rgba::TRANSPARENT));
}
