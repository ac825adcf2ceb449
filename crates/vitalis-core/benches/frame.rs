//! Benchmarks for the per-frame work.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vitalis_core::{
    BiometricUpdate, CognitiveState, Particle, ParticleField, Rect, StateModel, WaveformSynth,
};

fn bench_waveform_tick(c: &mut Criterion) {
    let mut synth = WaveformSynth::new(800);
    synth.set_target_bpm(96.0);

    c.bench_function("waveform_tick_800", |b| {
        b.iter(|| synth.tick(black_box(16.0)))
    });
}

fn bench_waveform_resize(c: &mut Criterion) {
    let mut synth = WaveformSynth::new(1200);
    for _ in 0..1200 {
        synth.tick(16.0);
    }

    c.bench_function("waveform_resize", |b| {
        let mut wide = false;
        b.iter(|| {
            wide = !wide;
            synth.resize(black_box(if wide { 1600 } else { 900 }));
        })
    });
}

fn bench_particle_step(c: &mut Criterion) {
    let bounds = Rect::new(0.0, 0.0, 1280.0, 720.0);
    let profile = CognitiveState::Wired.profile();
    let mut rng = StdRng::seed_from_u64(7);
    let mut field = ParticleField::new(64).with_bounds(bounds);
    for _ in 0..profile.particle_count {
        field.spawn(Particle::ambient(&mut rng, bounds, &profile, true));
    }

    c.bench_function("particle_field_step_wired", |b| {
        b.iter(|| {
            field.regulate(profile.particle_count, &mut rng, |r| {
                Particle::ambient(r, bounds, &profile, false)
            });
            field.step(black_box(1.0), &mut rng);
        })
    });
}

fn bench_state_model(c: &mut Criterion) {
    let mut model = StateModel::new();
    let update = BiometricUpdate {
        heart_rate: Some(88.0),
        hrv: Some(45.0),
        recovery: Some(62.0),
        estimated_stress: Some(1.2),
        ..BiometricUpdate::default()
    };

    c.bench_function("state_model_apply_and_advance", |b| {
        b.iter(|| {
            model.apply_biometric(black_box(&update));
            model.advance(1.0);
        })
    });
}

criterion_group!(
    benches,
    bench_waveform_tick,
    bench_waveform_resize,
    bench_particle_step,
    bench_state_model,
);
criterion_main!(benches);
