//! Benchmarks for painting and flushing a terminal frame.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::io::sink;
use vitalis_core::{Engine, EngineConfig, LoopbackDialer};
use vitalis_terminal::{App, CellBuffer, ColorMode, DemoFeed, DiffRenderer};

fn warm_app(width: u16, height: u16) -> App<LoopbackDialer> {
    let (dialer, handle) = LoopbackDialer::new();
    let engine = Engine::new(EngineConfig::default(), dialer);
    let mut app = App::new(engine, width, height, Some(1)).with_demo_feed(DemoFeed::new(handle));
    app.start(0);
    for frame in 1..=60 {
        app.tick(frame * 16);
    }
    app
}

fn bench_paint(c: &mut Criterion) {
    let app = warm_app(120, 40);
    let mut buffer = CellBuffer::new(120, 40);

    c.bench_function("paint_120x40", |b| {
        b.iter(|| app.render(black_box(&mut buffer), 960));
    });
}

fn bench_tick_paint_flush(c: &mut Criterion) {
    let mut app = warm_app(120, 40);
    let mut buffer = CellBuffer::new(120, 40);
    let mut renderer = DiffRenderer::new(ColorMode::TrueColor);
    let mut out = sink();
    let mut now = 960;

    c.bench_function("frame_120x40", |b| {
        b.iter(|| {
            now += 16;
            app.tick(now);
            app.render(&mut buffer, now);
            renderer
                .flush(black_box(&mut buffer), &mut out)
                .expect("sink write");
        });
    });
}

fn bench_full_repaint(c: &mut Criterion) {
    let app = warm_app(200, 60);
    let mut buffer = CellBuffer::new(200, 60);
    let mut renderer = DiffRenderer::new(ColorMode::Color256);
    app.render(&mut buffer, 960);

    c.bench_function("render_full_200x60", |b| {
        b.iter(|| {
            renderer
                .render_full(black_box(&mut buffer), &mut sink())
                .expect("sink write");
        });
    });
}

criterion_group!(benches, bench_paint, bench_tick_paint_flush, bench_full_repaint);
criterion_main!(benches);
